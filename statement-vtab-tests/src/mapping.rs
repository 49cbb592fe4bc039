use crate::fetch_values;
use indoc::indoc;
use statement_vtab_core::Value;
use statement_vtab_sqlite::{SqliteConnection, StatementModule};

/// Constraints on a subset of the parameters that does not start at the first one.
pub async fn mapping(connection: &mut SqliteConnection, module: &StatementModule) {
    connection
        .execute("DROP TABLE IF EXISTS window_args")
        .await
        .expect("Could not drop window_args");
    let sql = module.create_table_sql(
        "window_args",
        "SELECT :low AS low_seen, :high AS high_seen, :step AS step_seen",
        true,
    );
    connection
        .execute(sql)
        .await
        .expect("Could not create window_args");

    let rows = fetch_values(
        connection,
        "SELECT low_seen, high_seen, step_seen, low, high, step FROM window_args WHERE step = 5 AND low = 1",
    )
    .await;
    assert_eq!(
        rows,
        [[
            Value::from(1),
            Value::Null,
            Value::from(5),
            Value::from(1),
            Value::Null,
            Value::from(5),
        ]]
    );

    let rows = fetch_values(
        connection,
        "SELECT low_seen, high_seen, step_seen, high FROM window_args WHERE high = 'top'",
    )
    .await;
    assert_eq!(
        rows,
        [[Value::Null, Value::from("top"), Value::Null, Value::from("top")]]
    );

    let rows = fetch_values(
        connection,
        "SELECT low_seen, high_seen, step_seen FROM window_args(1, 2)",
    )
    .await;
    assert_eq!(rows, [[Value::from(1), Value::from(2), Value::Null]]);

    let rows = fetch_values(
        connection,
        indoc! {"
            SELECT step_seen, low_seen
            FROM window_args
            WHERE step = 2.5 AND high = 9 AND low = 'a'
        "},
    )
    .await;
    assert_eq!(rows, [[Value::from(2.5), Value::from("a")]]);

    // Creating it again is a no op
    let sql = module.create_table_sql("window_args", "SELECT 1", true);
    connection
        .execute(sql)
        .await
        .expect("IF NOT EXISTS must not fail");
    let rows = fetch_values(connection, "SELECT high_seen FROM window_args(0, 3)").await;
    assert_eq!(rows, [[Value::from(3)]]);
}
