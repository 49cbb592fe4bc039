use crate::{error_message, fetch_error, fetch_values};
use indoc::indoc;
use statement_vtab_core::Value;
use statement_vtab_sqlite::{SqliteConnection, StatementModule};

pub async fn planning(connection: &mut SqliteConnection, module: &StatementModule) {
    connection
        .execute("DROP TABLE IF EXISTS stock_of")
        .await
        .expect("Could not drop stock_of");
    let sql = module.create_table_sql(
        "stock_of",
        "SELECT sku AS item, stock FROM inventory WHERE label = :label",
        false,
    );
    connection
        .execute(sql)
        .await
        .expect("Could not create stock_of");

    // Only equality can reach a parameter
    for sql in [
        "SELECT * FROM stock_of WHERE label > 'a'",
        "SELECT * FROM stock_of WHERE label LIKE 'p%'",
        "SELECT * FROM stock_of WHERE label IS NOT NULL",
        "SELECT * FROM stock_of WHERE label != 'pen'",
    ] {
        let error = fetch_error(connection, sql).await;
        assert!(
            error_message(&error).contains("no query solution"),
            "{sql}: {error:#}"
        );
    }

    // The first equality binds, the others are checked by SQLite
    let rows = fetch_values(
        connection,
        "SELECT item FROM stock_of WHERE label = 'pen' AND label = 'ink'",
    )
    .await;
    assert!(rows.is_empty());
    let rows = fetch_values(
        connection,
        "SELECT item FROM stock_of WHERE label = 'pen' AND label = 'pen'",
    )
    .await;
    assert_eq!(rows, [[Value::from(1)]]);

    // Constraints on outputs stay with SQLite
    let rows = fetch_values(
        connection,
        "SELECT item, stock FROM stock_of WHERE label = 'paper' AND stock > 100",
    )
    .await;
    assert_eq!(rows, [[Value::from(3), Value::from(500)]]);
    let rows = fetch_values(
        connection,
        "SELECT item FROM stock_of WHERE label = 'paper' AND stock < 100",
    )
    .await;
    assert!(rows.is_empty());

    // IN is scanned once per value
    let rows = fetch_values(
        connection,
        "SELECT item, label FROM stock_of WHERE label IN ('ink', 'paper', 'none') ORDER BY item",
    )
    .await;
    assert_eq!(
        rows,
        [
            [Value::from(2), Value::from("ink")],
            [Value::from(3), Value::from("paper")],
        ]
    );

    // A plan where the parameter is not yet available gets rejected, the join
    // order providing it wins
    let rows = fetch_values(
        connection,
        indoc! {"
            SELECT i.sku, s.stock
            FROM stock_of s, inventory i
            WHERE s.label = i.label
            ORDER BY i.sku
        "},
    )
    .await;
    assert_eq!(
        rows.into_iter().map(|mut row| row.remove(0)).collect::<Vec<_>>(),
        [Value::from(1), Value::from(2), Value::from(3)]
    );
}
