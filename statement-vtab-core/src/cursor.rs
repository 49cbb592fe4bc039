use crate::{ArgumentOrder, Error, PreparedStatement, Result, Step, StatementError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// Opened, no scan started yet.
    Created,
    /// Inputs bound, first step pending.
    Bound,
    /// Positioned on a row.
    Iterating,
    /// The scan produced all of its rows.
    Exhausted,
    /// The statement reported an error, the scan is abandoned.
    Failed,
    Closed,
}

/// One scan over a statement relation.
///
/// Owns its statement instance exclusively, cursors over the same relation
/// never share execution state.
pub struct StatementCursor<P: PreparedStatement> {
    statement: Option<P>,
    state: CursorState,
    row_id: i64,
    num_outputs: usize,
    /// Values bound for the current scan, one slot per parameter.
    bound_inputs: Vec<Option<P::Value>>,
}

impl<P: PreparedStatement> StatementCursor<P> {
    pub fn new(statement: P, num_outputs: usize, num_inputs: usize) -> Self {
        Self {
            statement: Some(statement),
            state: CursorState::Created,
            row_id: 0,
            num_outputs,
            bound_inputs: vec![None; num_inputs],
        }
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    /// Starts a scan: binds `arguments` as directed by `order` and moves to the
    /// first row.
    ///
    /// Any previous scan is discarded. The values stay readable through
    /// [`StatementCursor::column`] for the whole scan, callers handing in
    /// borrowed host values must keep them valid until the next `bind` or
    /// `close`.
    pub fn bind(&mut self, order: &ArgumentOrder, arguments: &[P::Value]) -> Result<()> {
        match self.state {
            CursorState::Failed => {
                return Err(Error::msg("Cannot bind a cursor whose scan failed"));
            }
            CursorState::Closed => return Err(Error::msg("Cannot bind a closed cursor")),
            _ => {}
        }
        let num_inputs = self.bound_inputs.len();
        if arguments.len() > num_inputs {
            let error = StatementError::invariant(format!(
                "{} arguments for a statement with {} parameters",
                arguments.len(),
                num_inputs
            ));
            log::error!("{:#}", error);
            return Err(error);
        }
        let Some(statement) = self.statement.as_mut() else {
            return Err(Error::msg("Cannot bind a closed cursor"));
        };
        statement.reset();
        statement.clear_bindings();
        self.bound_inputs.fill(None);
        self.row_id = 0;
        for (i, value) in arguments.iter().enumerate() {
            let position = order
                .parameter(i)
                .filter(|p| (1..=num_inputs).contains(p))
                .ok_or_else(|| {
                    StatementError::invariant(format!(
                        "Argument {} has no parameter in {:?}",
                        i, order
                    ))
                })?;
            if let Err(error) = statement.bind(position, value) {
                self.state = CursorState::Failed;
                log::error!("{:#}", error);
                return Err(error);
            }
            self.bound_inputs[position - 1] = Some(value.clone());
        }
        self.state = CursorState::Bound;
        self.step()
    }

    /// Moves to the next row. Does nothing once the scan is exhausted.
    pub fn advance(&mut self) -> Result<()> {
        match self.state {
            CursorState::Iterating => self.step(),
            CursorState::Exhausted => Ok(()),
            CursorState::Created | CursorState::Bound => Err(StatementError::invariant(
                "Cannot advance a cursor before binding it",
            )),
            CursorState::Failed => Err(Error::msg("Cannot advance a cursor whose scan failed")),
            CursorState::Closed => Err(Error::msg("Cannot advance a closed cursor")),
        }
    }

    fn step(&mut self) -> Result<()> {
        let Some(statement) = self.statement.as_mut() else {
            return Err(Error::msg("Cannot step a closed cursor"));
        };
        match statement.step() {
            Ok(Step::Row) => {
                self.row_id += 1;
                self.state = CursorState::Iterating;
                log::trace!("Row {}", self.row_id);
                Ok(())
            }
            Ok(Step::Done) => {
                self.state = CursorState::Exhausted;
                Ok(())
            }
            Err(error) => {
                self.state = CursorState::Failed;
                log::error!("{:#}", error);
                Err(error)
            }
        }
    }

    /// Value of the relation column `index` on the current row.
    ///
    /// Output columns come from the statement, hidden columns return the value
    /// bound to their parameter. `None` means NULL: an output read while not on a
    /// row, or a parameter no constraint provided.
    pub fn column(&self, index: usize) -> Option<P::Value> {
        if index < self.num_outputs {
            return self
                .statement
                .as_ref()
                .filter(|s| s.is_positioned_on_row())
                .map(|s| s.current_value(index));
        }
        self.bound_inputs
            .get(index - self.num_outputs)
            .cloned()
            .flatten()
    }

    pub fn row_id(&self) -> i64 {
        self.row_id
    }

    pub fn at_end(&self) -> bool {
        self.statement
            .as_ref()
            .is_none_or(|s| !s.is_positioned_on_row())
    }

    /// Releases the statement instance. Calling it again has no effect.
    pub fn close(&mut self) {
        if let Some(statement) = self.statement.take() {
            drop(statement);
            log::trace!("Statement cursor closed after {} rows", self.row_id);
        }
        self.bound_inputs.clear();
        self.state = CursorState::Closed;
    }
}
