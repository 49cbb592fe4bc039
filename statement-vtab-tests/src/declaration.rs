use crate::{error_message, fetch_error};
use statement_vtab_sqlite::SqliteConnection;

/// Malformed declarations leave nothing behind.
pub async fn declaration(connection: &mut SqliteConnection) {
    for (argument, expected) in [
        ("", "no statement provided"),
        ("(())", "no statement provided"),
        ("(SELECT 1)", "statement must be parenthesized"),
        ("(label)", "statement must be parenthesized"),
        (
            "((DELETE FROM inventory WHERE sku = :sku))",
            "Statement must be read only.",
        ),
        (
            "((INSERT INTO inventory (label) VALUES ('x')))",
            "Statement must be read only.",
        ),
        ("((SELECT * FROM nowhere))", "no such table: nowhere"),
        ("((SELEC 1))", "syntax error"),
    ] {
        let sql = format!("CREATE VIRTUAL TABLE broken USING statement{argument}");
        let error = fetch_error(connection, &sql).await;
        assert!(
            error_message(&error).contains(expected),
            "{sql}\nExpected: {expected}\nFound: {error:#}"
        );
        let error = fetch_error(connection, "SELECT * FROM broken").await;
        assert!(
            error_message(&error).contains("no such table: broken"),
            "{error:#}"
        );
    }
}
