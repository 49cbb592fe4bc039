//! Expose a parameterized, read-only query as a SQLite virtual table.
//!
//! Result columns of the query become the columns of the table, its bind
//! parameters become hidden columns. Constraining a hidden column with `=`, or
//! calling the table like a function, binds the parameter.
//!
//! ```rust
//! use futures::TryStreamExt;
//! use statement_vtab::{ModuleConfig, SqliteConnection, Value};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let mut connection = SqliteConnection::connect("sqlite://:memory:").await?;
//! let module = connection.register_statement_module(ModuleConfig::default())?;
//! connection
//!     .execute("CREATE TABLE t (k INTEGER, v TEXT); INSERT INTO t VALUES (1, 'a');")
//!     .await?;
//! connection
//!     .execute(module.create_table_sql("by_key", "SELECT v FROM t WHERE k = :k", false))
//!     .await?;
//! let rows = connection
//!     .fetch("SELECT v, k FROM by_key(1)")
//!     .try_collect::<Vec<_>>()
//!     .await?;
//! assert_eq!(rows[0].values(), [Value::from("a"), Value::from(1)]);
//! # Ok::<(), statement_vtab::Error>(())
//! # }).unwrap();
//! ```

pub use statement_vtab_core::*;
pub use statement_vtab_sqlite::*;
