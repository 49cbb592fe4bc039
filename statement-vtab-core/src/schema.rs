use crate::{PreparedStatement, Result, StatementError, separated_by, write_identifier};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    /// Result column of the statement.
    Output,
    /// Statement parameter, filterable but excluded from `SELECT *`.
    HiddenInput,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    pub name: String,
    pub declared_type: Option<String>,
    pub role: ColumnRole,
}

/// Columns of a statement relation: outputs in statement order, then one
/// hidden input per parameter in parameter order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationSchema {
    pub columns: Vec<ColumnSchema>,
}

impl RelationSchema {
    pub fn num_outputs(&self) -> usize {
        self.outputs().count()
    }

    pub fn num_inputs(&self) -> usize {
        self.inputs().count()
    }

    pub fn outputs(&self) -> impl Iterator<Item = &ColumnSchema> {
        self.columns
            .iter()
            .filter(|c| c.role == ColumnRole::Output)
    }

    pub fn inputs(&self) -> impl Iterator<Item = &ColumnSchema> {
        self.columns
            .iter()
            .filter(|c| c.role == ColumnRole::HiddenInput)
    }

    pub fn column(&self, index: usize) -> Option<&ColumnSchema> {
        self.columns.get(index)
    }

    /// Index of the first column called `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Renders the declaration handed to the host, for example
    /// `CREATE TABLE x("v" TEXT, "k" HIDDEN)`.
    pub fn write_create_table(&self, out: &mut String) -> Result<()> {
        let estimate = 20 + self
            .columns
            .iter()
            .map(|c| c.name.len() + c.declared_type.as_ref().map_or(0, String::len) + 12)
            .sum::<usize>();
        out.try_reserve(estimate)
            .map_err(|_| StatementError::OutOfMemory)?;
        out.push_str("CREATE TABLE x(");
        separated_by(
            out,
            &self.columns,
            |out, column| {
                write_identifier(out, &column.name);
                match column.role {
                    ColumnRole::Output => {
                        if let Some(declared_type) = &column.declared_type {
                            out.push(' ');
                            out.push_str(declared_type);
                        }
                    }
                    ColumnRole::HiddenInput => out.push_str(" HIDDEN"),
                }
            },
            ", ",
        );
        out.push(')');
        Ok(())
    }

    pub fn to_create_table(&self) -> Result<String> {
        let mut out = String::new();
        self.write_create_table(&mut out)?;
        Ok(out)
    }
}

/// Name of the hidden column standing for the parameter at `position`.
///
/// The leading marker character is dropped (`:id` becomes `id`, `?3` becomes
/// `3`), anonymous parameters are named after their position.
pub fn parameter_column_name(name: Option<&str>, position: usize) -> String {
    match name {
        Some(name) => {
            let mut chars = name.chars();
            chars.next();
            chars.as_str().to_string()
        }
        None => position.to_string(),
    }
}

/// Derives the relation schema from the metadata of a prepared statement.
pub fn derive_schema<P: PreparedStatement>(statement: &P) -> Result<RelationSchema> {
    let num_outputs = statement.column_count();
    let num_inputs = statement.parameter_count();
    let mut columns = Vec::new();
    columns
        .try_reserve_exact(num_outputs + num_inputs)
        .map_err(|_| StatementError::OutOfMemory)?;
    for index in 0..num_outputs {
        let Some(name) = statement.column_name(index) else {
            let error = StatementError::SchemaDerivation { column: index };
            log::error!("{}", error);
            return Err(error.into());
        };
        columns.push(ColumnSchema {
            name,
            declared_type: statement.column_declared_type(index),
            role: ColumnRole::Output,
        });
    }
    for position in 1..=num_inputs {
        columns.push(ColumnSchema {
            name: parameter_column_name(statement.parameter_name(position).as_deref(), position),
            declared_type: None,
            role: ColumnRole::HiddenInput,
        });
    }
    Ok(RelationSchema { columns })
}
