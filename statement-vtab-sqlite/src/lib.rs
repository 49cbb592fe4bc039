mod cbox;
mod connection;
mod extract;
mod module;
mod prepared;
mod sql_writer;

use libsqlite3_sys::{
    sqlite3, sqlite3_db_mutex, sqlite3_errmsg, sqlite3_mutex, sqlite3_mutex_enter,
    sqlite3_mutex_leave,
};
use std::ffi::CStr;

pub(crate) use cbox::*;
pub use connection::*;
pub use module::*;
pub use prepared::*;
pub use sql_writer::*;

/// Last error message of `connection`.
pub(crate) fn error_message(connection: *mut sqlite3) -> String {
    unsafe {
        let ptr = sqlite3_errmsg(connection);
        if !ptr.is_null() {
            CStr::from_ptr(ptr).to_string_lossy().into_owned()
        } else {
            "Unknown error (could not extract the error message)".into()
        }
    }
}

/// Holds the database mutex so the error message read after a call still
/// belongs to that call.
pub(crate) struct DbMutexGuard(*mut sqlite3_mutex);

impl DbMutexGuard {
    pub(crate) fn lock(connection: *mut sqlite3) -> Self {
        unsafe {
            let mutex = sqlite3_db_mutex(connection);
            sqlite3_mutex_enter(mutex);
            Self(mutex)
        }
    }
}

impl Drop for DbMutexGuard {
    fn drop(&mut self) {
        unsafe { sqlite3_mutex_leave(self.0) }
    }
}
