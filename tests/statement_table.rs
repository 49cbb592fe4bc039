#[cfg(test)]
mod tests {
    use indoc::indoc;
    use statement_vtab::{
        ModuleConfig, PreparedStatement, SqliteConnection, StatementModule, Value,
    };
    use statement_vtab_tests::{error_message, fetch_error, fetch_values, init_logs};

    async fn setup() -> (SqliteConnection, StatementModule) {
        init_logs();
        let mut connection = SqliteConnection::connect("sqlite://:memory:")
            .await
            .expect("Could not open the database");
        let module = connection
            .register_statement_module(ModuleConfig::default())
            .expect("Could not register the module");
        connection
            .execute(indoc! {"
                CREATE TABLE t (k INTEGER, v TEXT);
                INSERT INTO t VALUES (1, 'a'), (3, 'c'), (3, 'cc'), (3, 'ccc');
            "})
            .await
            .expect("Could not create t");
        connection
            .execute(module.create_table_sql("by_key", "SELECT v FROM t WHERE k = :k", false))
            .await
            .expect("Could not create by_key");
        (connection, module)
    }

    #[tokio::test]
    async fn columns_match_statement() {
        let (mut connection, module) = setup().await;
        for query in [
            "SELECT 1",
            "SELECT k, v, k * 2 AS twice FROM t WHERE k > :min AND v <> :skip",
            "SELECT ?5",
            "SELECT count(*) AS n FROM t",
        ] {
            let prepared = connection
                .prepare(query.into())
                .await
                .expect("Could not prepare");
            connection
                .execute(format!(
                    "DROP TABLE IF EXISTS probe; {}",
                    module.create_table_sql("probe", query, false)
                ))
                .await
                .unwrap_or_else(|e| panic!("Could not declare {query}: {e:#}"));
            let counts = fetch_values(
                &mut connection,
                "SELECT sum(hidden = 0), sum(hidden = 1) FROM pragma_table_xinfo('probe')",
            )
            .await;
            assert_eq!(
                counts,
                [[
                    Value::from(prepared.column_count() as i64),
                    Value::from(prepared.parameter_count() as i64),
                ]],
                "{query}"
            );
        }
    }

    #[tokio::test]
    async fn rejected_declarations() {
        let (mut connection, _module) = setup().await;
        for (sql, expected) in [
            (
                "CREATE VIRTUAL TABLE x USING statement(not-parenthesized)",
                "statement must be parenthesized",
            ),
            (
                "CREATE VIRTUAL TABLE x USING statement(())",
                "no statement provided",
            ),
            (
                "CREATE VIRTUAL TABLE x USING statement((UPDATE t SET v = :v))",
                "Statement must be read only.",
            ),
        ] {
            let error = fetch_error(&mut connection, sql).await;
            assert_eq!(error_message(&error), expected, "{sql}");
        }
    }

    #[tokio::test]
    async fn scan_binds_hidden_column() {
        let (mut connection, _module) = setup().await;
        let rows = fetch_values(&mut connection, "SELECT v, k FROM by_key WHERE k = 1").await;
        assert_eq!(rows, [[Value::from("a"), Value::from(1)]]);
        let rows = fetch_values(&mut connection, "SELECT v, k FROM by_key WHERE k = 2").await;
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn row_ids_follow_scan_order() {
        let (mut connection, _module) = setup().await;
        let rows = fetch_values(&mut connection, "SELECT rowid, v FROM by_key(3)").await;
        assert_eq!(
            rows,
            [
                [Value::from(1), Value::from("c")],
                [Value::from(2), Value::from("cc")],
                [Value::from(3), Value::from("ccc")],
            ]
        );
        // Every scan starts over
        let rows = fetch_values(&mut connection, "SELECT max(rowid) FROM by_key(3)").await;
        assert_eq!(rows, [[Value::from(3)]]);
    }

    #[tokio::test]
    async fn independent_cursors() {
        let (mut connection, _module) = setup().await;
        let rows = fetch_values(
            &mut connection,
            indoc! {"
                SELECT a.rowid, a.v, a.k, b.rowid, b.v, b.k
                FROM by_key(1) a, by_key(3) b
                ORDER BY b.rowid
            "},
        )
        .await;
        assert_eq!(
            rows,
            (1..=3)
                .zip(["c", "cc", "ccc"])
                .map(|(i, v)| vec![
                    Value::from(1),
                    Value::from("a"),
                    Value::from(1),
                    Value::from(i),
                    Value::from(v),
                    Value::from(3),
                ])
                .collect::<Vec<_>>()
        );
    }
}
