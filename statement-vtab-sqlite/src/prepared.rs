use crate::{CBox, DbMutexGuard, error_message, extract::extract_value};
use libsqlite3_sys::*;
use statement_vtab_core::{
    AsValue, PreparedStatement, Result, Step, StatementError, StatementService, Value,
    truncate_long,
};
use std::{
    ffi::{CStr, c_int},
    os::raw::{c_char, c_void},
    ptr,
};

/// Value handle owned by SQLite.
///
/// Valid as long as SQLite keeps the underlying value alive: the current row
/// for column values, the whole scan for the arguments of a filter call.
#[derive(Debug, Clone, Copy)]
pub struct SqliteValue(pub(crate) *mut sqlite3_value);

/// Prepared statement service over a raw connection handle.
#[derive(Debug, Clone, Copy)]
pub struct SqliteService {
    pub(crate) connection: *mut sqlite3,
}

impl SqliteService {
    /// # Safety
    /// `connection` must be an open database handle outliving the service.
    pub unsafe fn new(connection: *mut sqlite3) -> Self {
        Self { connection }
    }
}

impl StatementService for SqliteService {
    type Statement = SqlitePrepared;

    fn prepare(&self, sql: &str) -> Result<SqlitePrepared> {
        let mut statement = CBox::new(ptr::null_mut(), |p| unsafe {
            sqlite3_finalize(p);
        });
        let mut tail = ptr::null();
        let _guard = DbMutexGuard::lock(self.connection);
        let rc = unsafe {
            sqlite3_prepare_v2(
                self.connection,
                sql.as_ptr() as *const c_char,
                sql.len() as c_int,
                &mut *statement,
                &mut tail,
            )
        };
        if rc != SQLITE_OK {
            let error = StatementError::execution(rc, error_message(self.connection));
            log::error!("{:#}\nWhile preparing the query:\n{}", error, truncate_long!(sql));
            return Err(error);
        }
        if statement.is_null() {
            return Err(StatementError::argument("no statement provided"));
        }
        let consumed = (tail as usize).saturating_sub(sql.as_ptr() as usize);
        if !sql.get(consumed..).unwrap_or_default().trim().is_empty() {
            let error = StatementError::argument("Cannot prepare more than one statement at a time");
            log::error!("{:#}\nQuery:\n{}", error, truncate_long!(sql));
            return Err(error);
        }
        Ok(SqlitePrepared::new(statement))
    }
}

#[derive(Debug)]
pub struct SqlitePrepared {
    pub(crate) statement: CBox<*mut sqlite3_stmt>,
}

impl SqlitePrepared {
    pub(crate) fn new(statement: CBox<*mut sqlite3_stmt>) -> Self {
        Self { statement }
    }

    pub fn sql(&self) -> String {
        unsafe {
            let sql = sqlite3_sql(*self.statement);
            if sql.is_null() {
                return String::new();
            }
            CStr::from_ptr(sql).to_string_lossy().into_owned()
        }
    }

    /// Decoded value of the column on the current row.
    pub fn value(&self, index: usize) -> Result<Value> {
        extract_value(*self.statement, index as c_int)
    }

    /// Binds a native value to the 1-based parameter `index`.
    pub fn bind_index<V: AsValue>(&mut self, v: V, index: u64) -> Result<&mut Self> {
        let index = index as c_int;
        let statement = *self.statement;
        let rc = unsafe {
            match v.as_value() {
                Value::Int64(Some(v)) => sqlite3_bind_int64(statement, index, v),
                Value::Float64(Some(v)) => sqlite3_bind_double(statement, index, v),
                Value::Varchar(Some(v)) => sqlite3_bind_text(
                    statement,
                    index,
                    v.as_ptr() as *const c_char,
                    v.len() as c_int,
                    SQLITE_TRANSIENT(),
                ),
                Value::Blob(Some(v)) => sqlite3_bind_blob(
                    statement,
                    index,
                    v.as_ptr() as *const c_void,
                    v.len() as c_int,
                    SQLITE_TRANSIENT(),
                ),
                _ => sqlite3_bind_null(statement, index),
            }
        };
        self.check_bind(rc, index)?;
        Ok(self)
    }

    fn check_bind(&self, rc: c_int, index: c_int) -> Result<()> {
        if rc == SQLITE_OK {
            return Ok(());
        }
        let db = unsafe { sqlite3_db_handle(*self.statement) };
        let error = StatementError::execution(rc, error_message(db));
        let sql = self.sql();
        log::error!(
            "{:#}\nCannot bind parameter {} to query:\n{}",
            error,
            index,
            truncate_long!(sql)
        );
        Err(error)
    }
}

impl PreparedStatement for SqlitePrepared {
    type Value = SqliteValue;

    fn column_count(&self) -> usize {
        unsafe { sqlite3_column_count(*self.statement) as usize }
    }

    fn column_name(&self, index: usize) -> Option<String> {
        unsafe { owned_text(sqlite3_column_name(*self.statement, index as c_int)) }
    }

    fn column_declared_type(&self, index: usize) -> Option<String> {
        unsafe { owned_text(sqlite3_column_decltype(*self.statement, index as c_int)) }
    }

    fn parameter_count(&self) -> usize {
        unsafe { sqlite3_bind_parameter_count(*self.statement) as usize }
    }

    fn parameter_name(&self, position: usize) -> Option<String> {
        unsafe {
            owned_text(sqlite3_bind_parameter_name(
                *self.statement,
                position as c_int,
            ))
        }
    }

    fn is_read_only(&self) -> bool {
        unsafe { sqlite3_stmt_readonly(*self.statement) != 0 }
    }

    fn bind(&mut self, position: usize, value: &SqliteValue) -> Result<()> {
        let rc = unsafe { sqlite3_bind_value(*self.statement, position as c_int, value.0) };
        self.check_bind(rc, position as c_int)
    }

    fn reset(&mut self) {
        unsafe {
            sqlite3_reset(*self.statement);
        }
    }

    fn clear_bindings(&mut self) {
        unsafe {
            sqlite3_clear_bindings(*self.statement);
        }
    }

    fn step(&mut self) -> Result<Step> {
        match unsafe { sqlite3_step(*self.statement) } {
            SQLITE_ROW => Ok(Step::Row),
            SQLITE_DONE => Ok(Step::Done),
            rc => {
                let db = unsafe { sqlite3_db_handle(*self.statement) };
                Err(StatementError::execution(rc, error_message(db)))
            }
        }
    }

    fn current_value(&self, index: usize) -> SqliteValue {
        SqliteValue(unsafe { sqlite3_column_value(*self.statement, index as c_int) })
    }

    fn is_positioned_on_row(&self) -> bool {
        unsafe { sqlite3_stmt_busy(*self.statement) != 0 }
    }
}

unsafe fn owned_text(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
}
