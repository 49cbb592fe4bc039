use crate::{error_message, fetch_error, fetch_values};
use indoc::indoc;
use statement_vtab_core::Value;
use statement_vtab_sqlite::{SqliteConnection, StatementModule};

/// Errors raised while scanning abort the scan, the table stays usable.
pub async fn failures(connection: &mut SqliteConnection, module: &StatementModule) {
    connection
        .execute("DROP TABLE IF EXISTS magnitude; DROP TABLE IF EXISTS magnitudes;")
        .await
        .expect("Could not drop the tables");
    let sql = module.create_table_sql("magnitude", "SELECT abs(:n) AS size", false);
    connection
        .execute(sql)
        .await
        .expect("Could not create magnitude");
    let sql = module.create_table_sql(
        "magnitudes",
        indoc! {"
            SELECT abs(value) AS size
            FROM (SELECT 1 AS value UNION ALL SELECT 2 UNION ALL SELECT :n)
        "},
        false,
    );
    connection
        .execute(sql)
        .await
        .expect("Could not create magnitudes");

    let error = fetch_error(
        connection,
        "SELECT size FROM magnitude(-9223372036854775807 - 1)",
    )
    .await;
    assert!(
        error_message(&error).contains("integer overflow"),
        "{error:#}"
    );
    let rows = fetch_values(connection, "SELECT size FROM magnitude(-3)").await;
    assert_eq!(rows, [[Value::from(3)]]);

    // Failing after some rows were produced
    let error = fetch_error(
        connection,
        "SELECT size FROM magnitudes(-9223372036854775807 - 1)",
    )
    .await;
    assert!(
        error_message(&error).contains("integer overflow"),
        "{error:#}"
    );
    let rows = fetch_values(connection, "SELECT size FROM magnitudes(-7)").await;
    assert_eq!(rows, [[Value::from(1)], [Value::from(2)], [Value::from(7)]]);

    // Dropped tables are gone for good
    connection
        .execute(module.drop_table_sql("magnitudes", false))
        .await
        .expect("Could not drop magnitudes");
    let error = fetch_error(connection, "SELECT * FROM magnitudes(1)").await;
    assert!(
        error_message(&error).contains("no such table"),
        "{error:#}"
    );
}
