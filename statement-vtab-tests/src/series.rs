use crate::fetch_values;
use indoc::indoc;
use statement_vtab_core::Value;
use statement_vtab_sqlite::{SqliteConnection, StatementModule};

pub async fn series(connection: &mut SqliteConnection, module: &StatementModule) {
    connection
        .execute("DROP TABLE IF EXISTS series")
        .await
        .expect("Could not drop series");
    let sql = module.create_table_sql(
        "series",
        indoc! {"
            WITH RECURSIVE s(value) AS (
                SELECT :start
                UNION ALL
                SELECT value + 1 FROM s WHERE value < :stop
            )
            SELECT value FROM s
        "},
        false,
    );
    connection
        .execute(sql)
        .await
        .expect("Could not create series");

    // Row ids count the rows of the current scan from 1
    let rows = fetch_values(connection, "SELECT rowid, value FROM series(1, 5)").await;
    assert_eq!(
        rows,
        (1..=5)
            .map(|i| vec![Value::from(i), Value::from(i)])
            .collect::<Vec<_>>()
    );
    let rows = fetch_values(connection, "SELECT rowid, value FROM series(10, 11)").await;
    assert_eq!(
        rows,
        [
            [Value::from(1), Value::from(10)],
            [Value::from(2), Value::from(11)]
        ]
    );

    let rows = fetch_values(connection, "SELECT sum(value), count(*) FROM series(1, 100)").await;
    assert_eq!(rows, [[Value::from(5050), Value::from(100)]]);

    // Independent cursors over the same table
    let rows = fetch_values(
        connection,
        "SELECT a.value, b.value FROM series(1, 3) a, series(1, 2) b ORDER BY 1, 2",
    )
    .await;
    assert_eq!(
        rows,
        [
            [Value::from(1), Value::from(1)],
            [Value::from(1), Value::from(2)],
            [Value::from(2), Value::from(1)],
            [Value::from(2), Value::from(2)],
            [Value::from(3), Value::from(1)],
            [Value::from(3), Value::from(2)],
        ]
    );

    // Inner cursor rebound for every outer row
    let rows = fetch_values(
        connection,
        indoc! {"
            SELECT a.value, count(*)
            FROM series(1, 4) a, series(a.value, 4) b
            GROUP BY a.value
            ORDER BY a.value
        "},
    )
    .await;
    assert_eq!(
        rows,
        [
            [Value::from(1), Value::from(4)],
            [Value::from(2), Value::from(3)],
            [Value::from(3), Value::from(2)],
            [Value::from(4), Value::from(1)],
        ]
    );

    let rows = fetch_values(
        connection,
        "SELECT value FROM series(1, 1000) WHERE value % 250 = 0",
    )
    .await;
    assert_eq!(
        rows,
        [
            [Value::from(250)],
            [Value::from(500)],
            [Value::from(750)],
            [Value::from(1000)]
        ]
    );
}
