mod declaration;
mod failures;
mod hidden;
mod lookup;
mod mapping;
mod module_config;
mod planning;
mod series;
mod values;

use crate::{
    declaration::declaration, failures::failures, hidden::hidden, lookup::lookup,
    mapping::mapping, module_config::module_config, planning::planning, series::series,
    values::values,
};
use futures::TryStreamExt;
use log::LevelFilter;
use statement_vtab_core::{Error, StatementError, Value};
use statement_vtab_sqlite::{ModuleConfig, SqliteConnection};
use std::env;

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

pub async fn execute_tests(mut connection: SqliteConnection) {
    let module = connection
        .register_statement_module(ModuleConfig::default())
        .expect("Could not register the statement module");
    lookup(&mut connection, &module).await;
    mapping(&mut connection, &module).await;
    series(&mut connection, &module).await;
    hidden(&mut connection, &module).await;
    planning(&mut connection, &module).await;
    values(&mut connection, &module).await;
    failures(&mut connection, &module).await;
    declaration(&mut connection).await;
    module_config(&mut connection).await;
}

/// Values of every row returned by `sql`.
pub async fn fetch_values(connection: &mut SqliteConnection, sql: &str) -> Vec<Vec<Value>> {
    connection
        .fetch(sql)
        .map_ok(|row| row.values.into_vec())
        .try_collect()
        .await
        .unwrap_or_else(|e| panic!("Query failed: {e:#}\n{sql}"))
}

/// Error produced by `sql`, with logging silenced.
pub async fn fetch_error(connection: &mut SqliteConnection, sql: &str) -> Error {
    let level = log::max_level();
    log::set_max_level(LevelFilter::Off);
    let result = connection.execute(sql).await;
    log::set_max_level(level);
    result.expect_err(&format!("Query should fail:\n{sql}"))
}

/// Message SQLite reported for a failed statement.
pub fn error_message(error: &Error) -> String {
    match StatementError::of(error) {
        Some(StatementError::Execution { message, .. }) => message.clone(),
        _ => format!("{error:#}"),
    }
}

#[macro_export]
macro_rules! silent_logs {
    ($($code:tt)+) => {{
        let level = log::max_level();
        log::set_max_level(log::LevelFilter::Off);
        $($code)+
        log::set_max_level(level);
    }};
}
