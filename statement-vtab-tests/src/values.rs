use crate::fetch_values;
use statement_vtab_core::Value;
use statement_vtab_sqlite::{SqliteConnection, StatementModule};

/// Bound values travel to the statement and back untouched.
pub async fn values(connection: &mut SqliteConnection, module: &StatementModule) {
    connection
        .execute("DROP TABLE IF EXISTS echo")
        .await
        .expect("Could not drop echo");
    let sql = module.create_table_sql(
        "echo",
        "SELECT :value AS echoed, typeof(:value) AS kind",
        false,
    );
    connection.execute(sql).await.expect("Could not create echo");

    for (argument, expected, kind) in [
        ("42", Value::from(42), "integer"),
        ("-9223372036854775807 - 1", Value::from(i64::MIN), "integer"),
        ("0.125", Value::from(0.125), "real"),
        ("'caffè ☕'", Value::from("caffè ☕"), "text"),
        ("''", Value::from(""), "text"),
        ("x'00ff10'", Value::Blob(Some([0u8, 255, 16].into())), "blob"),
    ] {
        let rows = fetch_values(
            connection,
            &format!("SELECT echoed, kind, value FROM echo({argument})"),
        )
        .await;
        assert_eq!(
            rows,
            [[expected.clone(), Value::from(kind), expected]],
            "echo({argument})"
        );
    }

    // Without a constraint the parameter stays NULL
    let rows = fetch_values(connection, "SELECT echoed, kind, value FROM echo").await;
    assert_eq!(rows, [[Value::Null, Value::from("null"), Value::Null]]);

    let rows = fetch_values(
        connection,
        "SELECT e.echoed FROM (SELECT 'a' AS v UNION ALL SELECT 'b') t, echo(t.v || '!') e ORDER BY 1",
    )
    .await;
    assert_eq!(rows, [[Value::from("a!")], [Value::from("b!")]]);
}
