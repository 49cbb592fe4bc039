use crate::fetch_values;
use statement_vtab_core::{PlanEstimates, StatementError, Value};
use statement_vtab_sqlite::{ModuleConfig, SqliteConnection};

pub async fn module_config(connection: &mut SqliteConnection) {
    let module = connection
        .register_statement_module(ModuleConfig::new("parameterized").with_estimates(PlanEstimates {
            cost: 25.0,
            rows: 10,
        }))
        .expect("Could not register the module as parameterized");
    assert_eq!(module.name(), "parameterized");
    assert_eq!(module.config().estimates.rows, 10);
    assert_eq!(
        module.create_table_sql("labels", "SELECT label FROM inventory WHERE sku < :below;", true),
        r#"CREATE VIRTUAL TABLE IF NOT EXISTS "labels" USING "parameterized"((SELECT label FROM inventory WHERE sku < :below))"#
    );

    connection
        .execute(
            "DROP TABLE IF EXISTS labels; CREATE VIRTUAL TABLE labels USING parameterized((SELECT label FROM inventory WHERE sku < :below ORDER BY sku));",
        )
        .await
        .expect("Could not create labels");
    let rows = fetch_values(connection, "SELECT label, below FROM labels(3)").await;
    assert_eq!(
        rows,
        [
            [Value::from("pen"), Value::from(3)],
            [Value::from("ink"), Value::from(3)],
        ]
    );

    // The default module keeps working next to it
    let rows = fetch_values(connection, "SELECT label FROM inventory_by_sku(1)").await;
    assert_eq!(rows, [[Value::from("pen")]]);

    let error = connection
        .register_statement_module(ModuleConfig::new("bad\0name"))
        .expect_err("NUL is not allowed in a module name");
    assert!(matches!(
        StatementError::of(&error),
        Some(StatementError::Argument(..))
    ));
}
