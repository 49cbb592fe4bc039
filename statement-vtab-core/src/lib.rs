mod as_value;
mod cursor;
mod error;
mod planner;
mod query;
mod relation;
mod schema;
mod statement;
mod util;
mod value;

pub use ::anyhow::Context;
pub use as_value::*;
pub use cursor::*;
pub use error::*;
pub use planner::*;
pub use query::*;
pub use relation::*;
pub use schema::*;
pub use statement::*;
pub use util::*;
pub use value::*;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
