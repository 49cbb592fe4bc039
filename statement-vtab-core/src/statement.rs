use crate::Result;

/// Outcome of a successful execution step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The statement is positioned on a new row.
    Row,
    /// The statement ran to completion.
    Done,
}

/// A compiled query owned by exactly one user, provided by the host engine.
///
/// Column indexes are 0-based, parameter positions are 1-based as in SQL.
/// Finalization is tied to `Drop`.
pub trait PreparedStatement {
    /// Value exchanged with the host when binding and reading columns.
    type Value: Clone;

    fn column_count(&self) -> usize;
    /// Name of the result column, `None` when the host cannot provide one.
    fn column_name(&self, index: usize) -> Option<String>;
    fn column_declared_type(&self, index: usize) -> Option<String>;
    fn parameter_count(&self) -> usize;
    /// Name of the parameter including its marker (`:name`, `?3`), `None` for a bare `?`.
    fn parameter_name(&self, position: usize) -> Option<String>;
    fn is_read_only(&self) -> bool;

    fn bind(&mut self, position: usize, value: &Self::Value) -> Result<()>;
    fn reset(&mut self);
    fn clear_bindings(&mut self);
    fn step(&mut self) -> Result<Step>;
    /// Value of the column on the current row.
    fn current_value(&self, index: usize) -> Self::Value;
    fn is_positioned_on_row(&self) -> bool;
}

/// Compiles query text into independent statement instances.
pub trait StatementService {
    type Statement: PreparedStatement;

    fn prepare(&self, sql: &str) -> Result<Self::Statement>;
}
