use statement_vtab_core::write_identifier;

/// Renders the DDL that manages statement tables.
#[derive(Default, Debug, Clone, Copy)]
pub struct SqliteSqlWriter {}

impl SqliteSqlWriter {
    /// `CREATE VIRTUAL TABLE "table" USING "module"((query))`
    pub fn write_create_statement_table(
        &self,
        out: &mut String,
        module: &str,
        table: &str,
        query: &str,
        if_not_exists: bool,
    ) {
        out.push_str("CREATE VIRTUAL TABLE ");
        if if_not_exists {
            out.push_str("IF NOT EXISTS ");
        }
        write_identifier(out, table);
        out.push_str(" USING ");
        write_identifier(out, module);
        out.push_str("((");
        out.push_str(query.trim().trim_end_matches(';').trim_end());
        out.push_str("))");
    }

    pub fn write_drop_table(&self, out: &mut String, table: &str, if_exists: bool) {
        out.push_str("DROP TABLE ");
        if if_exists {
            out.push_str("IF EXISTS ");
        }
        write_identifier(out, table);
    }
}
