use crate::fetch_values;
use indoc::indoc;
use statement_vtab_core::Value;
use statement_vtab_sqlite::{SqliteConnection, StatementModule};

pub async fn lookup(connection: &mut SqliteConnection, module: &StatementModule) {
    connection
        .execute(indoc! {"
            DROP TABLE IF EXISTS inventory_by_sku;
            DROP TABLE IF EXISTS inventory;
            DROP TABLE IF EXISTS orders;
            CREATE TABLE inventory (sku INTEGER PRIMARY KEY, label TEXT, stock INTEGER);
            INSERT INTO inventory VALUES (1, 'pen', 40), (2, 'ink', 12), (3, 'paper', 500);
            CREATE TABLE orders (id INTEGER PRIMARY KEY, sku INTEGER);
            INSERT INTO orders VALUES (10, 3), (11, 1), (12, 9), (13, 3);
        "})
        .await
        .expect("Could not create the inventory");
    let sql = module.create_table_sql(
        "inventory_by_sku",
        "SELECT label, stock FROM inventory WHERE sku = :sku",
        false,
    );
    connection
        .execute(sql)
        .await
        .expect("Could not create the statement table");

    // Table valued function
    let rows = fetch_values(connection, "SELECT label, stock FROM inventory_by_sku(2)").await;
    assert_eq!(rows, [[Value::from("ink"), Value::from(12)]]);

    // Equality on the hidden column, which reads back the bound value
    let rows = fetch_values(
        connection,
        "SELECT label, sku FROM inventory_by_sku WHERE sku = 3",
    )
    .await;
    assert_eq!(rows, [[Value::from("paper"), Value::from(3)]]);

    let rows = fetch_values(connection, "SELECT * FROM inventory_by_sku(7)").await;
    assert!(rows.is_empty());

    // Unconstrained parameters are NULL
    let rows = fetch_values(connection, "SELECT count(*) FROM inventory_by_sku").await;
    assert_eq!(rows, [[Value::from(0)]]);

    let rows = fetch_values(connection, "SELECT rowid, label FROM inventory_by_sku(1)").await;
    assert_eq!(rows, [[Value::from(1), Value::from("pen")]]);

    // Rebinding the same scan once per outer row
    let rows = fetch_values(
        connection,
        indoc! {"
            SELECT o.id, i.label, i.sku
            FROM orders o JOIN inventory_by_sku i ON i.sku = o.sku
            ORDER BY o.id
        "},
    )
    .await;
    assert_eq!(
        rows,
        [
            [Value::from(10), Value::from("paper"), Value::from(3)],
            [Value::from(11), Value::from("pen"), Value::from(1)],
            [Value::from(13), Value::from("paper"), Value::from(3)],
        ]
    );
    let rows = fetch_values(
        connection,
        indoc! {"
            SELECT o.id, (SELECT stock FROM inventory_by_sku(o.sku)) AS stock
            FROM orders o
            ORDER BY o.id
        "},
    )
    .await;
    assert_eq!(
        rows,
        [
            [Value::from(10), Value::from(500)],
            [Value::from(11), Value::from(40)],
            [Value::from(12), Value::Null],
            [Value::from(13), Value::from(500)],
        ]
    );

    // The underlying data is read at scan time
    connection
        .execute("UPDATE inventory SET stock = stock - 1 WHERE sku = 2")
        .await
        .expect("Could not update the inventory");
    let rows = fetch_values(connection, "SELECT stock FROM inventory_by_sku(2)").await;
    assert_eq!(rows, [[Value::from(11)]]);
}
