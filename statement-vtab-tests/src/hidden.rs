use crate::fetch_values;
use statement_vtab_core::Value;
use statement_vtab_sqlite::{SqliteConnection, StatementModule};

/// Name, declared type and hidden flag of each column of `table`.
async fn columns(connection: &mut SqliteConnection, table: &str) -> Vec<(Value, Value, Value)> {
    fetch_values(
        connection,
        &format!("SELECT name, type, hidden FROM pragma_table_xinfo('{table}') ORDER BY cid"),
    )
    .await
    .into_iter()
    .map(|mut row| {
        let hidden = row.pop().unwrap_or(Value::Null);
        let declared = row.pop().unwrap_or(Value::Null);
        let name = row.pop().unwrap_or(Value::Null);
        (name, declared, hidden)
    })
    .collect()
}

pub async fn hidden(connection: &mut SqliteConnection, module: &StatementModule) {
    connection
        .execute(
            "DROP TABLE IF EXISTS adder; DROP TABLE IF EXISTS named_params; DROP TABLE IF EXISTS quoted;",
        )
        .await
        .expect("Could not drop the tables");
    for (table, query) in [
        ("adder", "SELECT ? + ? AS total"),
        (
            "named_params",
            "SELECT label, stock * 2 FROM inventory WHERE sku = $sku OR label = @name OR stock = ?7",
        ),
        ("quoted", r#"SELECT 1 AS "odd ""name""", :x AS plain"#),
    ] {
        let sql = module.create_table_sql(table, query, false);
        connection
            .execute(sql)
            .await
            .unwrap_or_else(|e| panic!("Could not create {table}: {e:#}"));
    }

    // Anonymous parameters are named after their position
    assert_eq!(
        columns(connection, "adder").await,
        [
            (Value::from("total"), Value::from(""), Value::from(0)),
            (Value::from("1"), Value::from(""), Value::from(1)),
            (Value::from("2"), Value::from(""), Value::from(1)),
        ]
    );
    let rows = fetch_values(connection, "SELECT * FROM adder(2, 3)").await;
    assert_eq!(rows, [[Value::from(5)]]);
    let rows = fetch_values(connection, r#"SELECT total, "1", "2" FROM adder(40, 2)"#).await;
    assert_eq!(rows, [[Value::from(42), Value::from(40), Value::from(2)]]);

    // Markers are dropped. Positions skipped by ?7 still get a column.
    let named = columns(connection, "named_params").await;
    let names = named.iter().map(|v| v.0.clone()).collect::<Vec<_>>();
    assert_eq!(
        names,
        ["label", "stock * 2", "sku", "name", "3", "4", "5", "6", "7"].map(Value::from)
    );
    assert_eq!(named[0].1, Value::from("TEXT"));
    assert!(named[..2].iter().all(|v| v.2 == Value::from(0)));
    assert!(named[2..].iter().all(|v| v.2 == Value::from(1)));
    let rows = fetch_values(
        connection,
        "SELECT label FROM named_params WHERE sku = 1 ORDER BY label",
    )
    .await;
    assert_eq!(rows, [[Value::from("pen")]]);

    let rows = fetch_values(
        connection,
        r#"SELECT "odd ""name""", plain, x FROM quoted WHERE x = 'y'"#,
    )
    .await;
    assert_eq!(rows, [[Value::from(1), Value::from("y"), Value::from("y")]]);
}
