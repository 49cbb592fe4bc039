use crate::{
    CBox, ModuleConfig, SqlitePrepared, SqliteService, StatementModule, error_message,
    extract::{extract_name, extract_value},
    register_statement_module,
};
use async_stream::try_stream;
use futures::{Stream, StreamExt, TryStreamExt};
use libsqlite3_sys::{
    SQLITE_DONE, SQLITE_OK, SQLITE_OPEN_CREATE, SQLITE_OPEN_READWRITE, SQLITE_OPEN_URI,
    SQLITE_ROW, sqlite3, sqlite3_close, sqlite3_column_count, sqlite3_finalize,
    sqlite3_open_v2, sqlite3_prepare_v2, sqlite3_step, sqlite3_total_changes64,
};
use statement_vtab_core::{
    Context, Error, QueryResult, Result, RowLabeled, RowNames, RowsAffected, StatementError,
    StatementService, truncate_long,
};
use std::{
    ffi::{CString, c_char},
    pin::pin,
    ptr,
    sync::atomic::{AtomicPtr, Ordering},
};
use tokio::task::spawn_blocking;

/// Connection to a SQLite database.
///
/// Opened from a `sqlite://` URL, the remainder is handed to SQLite as a URI
/// filename: `sqlite://:memory:`, `sqlite://data.sqlite?mode=rwc`.
pub struct SqliteConnection {
    pub(crate) connection: CBox<*mut sqlite3>,
}

impl SqliteConnection {
    pub const PREFIX: &'static str = "sqlite://";

    pub async fn connect(url: &str) -> Result<SqliteConnection> {
        let Some(location) = url.strip_prefix(Self::PREFIX) else {
            let error = Error::msg(format!(
                "Expected sqlite connection url to start with `{}`",
                Self::PREFIX
            ));
            log::error!("{:#}", error);
            return Err(error);
        };
        let context = || format!("Error while decoding connection URL: `{}`", url);
        let filename = CString::new(format!("file:{}", location)).with_context(context)?;
        let mut connection = CBox::new(ptr::null_mut(), |p| unsafe {
            sqlite3_close(p);
        });
        let rc = unsafe {
            sqlite3_open_v2(
                filename.as_ptr(),
                &mut *connection,
                SQLITE_OPEN_READWRITE | SQLITE_OPEN_CREATE | SQLITE_OPEN_URI,
                ptr::null(),
            )
        };
        if rc != SQLITE_OK {
            let error = Error::msg(error_message(*connection))
                .context(format!("Could not open the database `{}`", url));
            log::error!("{:#}", error);
            return Err(error);
        }
        log::debug!("Connected to {}", url);
        Ok(Self { connection })
    }

    /// Installs the statement module on this connection.
    pub fn register_statement_module(&self, config: ModuleConfig) -> Result<StatementModule> {
        unsafe { register_statement_module(*self.connection, config) }
    }

    /// Prepares a single statement.
    pub async fn prepare(&mut self, query: String) -> Result<SqlitePrepared> {
        let connection = AtomicPtr::new(*self.connection);
        let prepared = spawn_blocking(move || {
            let service = unsafe { SqliteService::new(connection.load(Ordering::Relaxed)) };
            service
                .prepare(&query)
                .with_context(|| format!("While preparing the query:\n{}", truncate_long!(query)))
        })
        .await?;
        prepared
    }

    /// Runs every statement in `sql`, yielding rows and the rows affected by
    /// statements that return no columns.
    pub fn run(&mut self, sql: impl Into<String>) -> impl Stream<Item = Result<QueryResult>> {
        let sql = sql.into();
        let connection = *self.connection;
        try_stream! {
            let sql = CString::new(sql).context("Could not create a CString from the query String")?;
            let mut remaining: *const c_char = sql.as_ptr();
            while unsafe { *remaining } != 0 {
                let Some(statement) = unsafe { prepare_next(connection, &mut remaining) }? else {
                    continue;
                };
                let mut results = pin!(run_prepared(connection, statement));
                while let Some(result) = results.next().await {
                    yield result?;
                }
            }
        }
    }

    /// Runs an already prepared (and bound) statement.
    pub fn run_prepared(
        &mut self,
        statement: SqlitePrepared,
    ) -> impl Stream<Item = Result<QueryResult>> {
        run_prepared(*self.connection, statement)
    }

    /// Execute the query and returns the rows.
    pub fn fetch(&mut self, sql: impl Into<String>) -> impl Stream<Item = Result<RowLabeled>> {
        self.run(sql).try_filter_map(|v| async move {
            Ok(match v {
                QueryResult::Row(v) => Some(v),
                QueryResult::Affected(..) => None,
            })
        })
    }

    /// Execute the query and return the total number of rows affected.
    pub async fn execute(&mut self, sql: impl Into<String>) -> Result<RowsAffected> {
        self.run(sql)
            .try_filter_map(|v| async move {
                Ok(match v {
                    QueryResult::Affected(v) => Some(v),
                    QueryResult::Row(..) => None,
                })
            })
            .try_collect()
            .await
    }
}

/// Prepares the next statement of `remaining` and moves it past the consumed text.
unsafe fn prepare_next(
    connection: *mut sqlite3,
    remaining: &mut *const c_char,
) -> Result<Option<SqlitePrepared>> {
    let mut statement = CBox::new(ptr::null_mut(), |p| unsafe {
        sqlite3_finalize(p);
    });
    let mut tail = ptr::null();
    let rc = unsafe { sqlite3_prepare_v2(connection, *remaining, -1, &mut *statement, &mut tail) };
    if rc != SQLITE_OK {
        let error = StatementError::execution(rc, error_message(connection));
        log::error!("{:#}", error);
        return Err(error);
    }
    *remaining = tail;
    if statement.is_null() {
        return Ok(None);
    }
    Ok(Some(SqlitePrepared::new(statement)))
}

fn run_prepared(
    connection: *mut sqlite3,
    prepared: SqlitePrepared,
) -> impl Stream<Item = Result<QueryResult>> {
    try_stream! {
        let statement = *prepared.statement;
        let count = unsafe { sqlite3_column_count(statement) };
        let labels = (0..count)
            .map(|i| extract_name(statement, i))
            .collect::<Result<RowNames>>()?;
        let changes = unsafe { sqlite3_total_changes64(connection) };
        loop {
            match unsafe { sqlite3_step(statement) } {
                SQLITE_ROW => {
                    yield QueryResult::Row(RowLabeled {
                        labels: labels.clone(),
                        values: (0..count)
                            .map(|i| extract_value(statement, i))
                            .collect::<Result<_>>()?,
                    });
                }
                SQLITE_DONE => break,
                rc => {
                    let error = StatementError::execution(rc, error_message(connection));
                    log::error!("{:#}\nQuery:\n{}", error, truncate_long!(prepared.sql()));
                    Err(error)?;
                }
            }
        }
        if count == 0 {
            let total = unsafe { sqlite3_total_changes64(connection) };
            yield QueryResult::Affected(RowsAffected {
                rows_affected: (total - changes).max(0) as u64,
            });
        }
    }
}
