use crate::{
    ArgumentOrder, BindingPlan, Constraint, ConstraintPlanner, PlanEstimates, PreparedStatement,
    RelationSchema, Result, StatementCursor, StatementError, StatementService, derive_schema,
    truncate_long,
};
use std::sync::Arc;

/// A table-like object the host engine can plan and scan.
pub trait VirtualRelation {
    type Cursor: VirtualCursor;

    /// Columns declared to the host, fixed for the relation's lifetime.
    fn schema(&self) -> &RelationSchema;
    /// Negotiates a scan with the host optimizer, fails when the constraints
    /// cannot be satisfied by this relation.
    fn plan(&self, constraints: &[Constraint]) -> Result<BindingPlan>;
    /// Opens an independent scan.
    fn open(&self) -> Result<Self::Cursor>;
}

/// Scan protocol driven by the host: `bind` once per scan, then `advance`
/// until `at_end`.
pub trait VirtualCursor {
    type Value;

    fn bind(&mut self, order: &ArgumentOrder, arguments: &[Self::Value]) -> Result<()>;
    fn advance(&mut self) -> Result<()>;
    fn column(&self, index: usize) -> Option<Self::Value>;
    fn row_id(&self) -> i64;
    fn at_end(&self) -> bool;
    fn close(&mut self);
}

/// Extracts the query body from the declaration argument `(SELECT ...)`.
pub fn parse_declaration(argument: Option<&str>) -> Result<&str> {
    let argument = match argument {
        Some(argument) if argument.len() >= 3 => argument,
        _ => return Err(StatementError::argument("no statement provided")),
    };
    argument
        .strip_prefix('(')
        .and_then(|v| v.strip_suffix(')'))
        .ok_or_else(|| StatementError::argument("statement must be parenthesized"))
}

/// Relation exposing a read-only parameterized query.
///
/// Result columns are outputs, parameters are hidden input columns. Each
/// cursor prepares its own instance of the query through `service`.
pub struct StatementRelation<S: StatementService> {
    service: S,
    query: Arc<str>,
    schema: RelationSchema,
    planner: ConstraintPlanner,
}

impl<S: StatementService> StatementRelation<S> {
    /// Declares a relation from the parenthesized query `argument`.
    pub fn declare(service: S, argument: Option<&str>, estimates: PlanEstimates) -> Result<Self> {
        let query = parse_declaration(argument).inspect_err(|e| log::error!("{:#}", e))?;
        let statement = service
            .prepare(query)
            .inspect_err(|e| log::error!("{:#}\nWhile declaring:\n{}", e, truncate_long!(query)))?;
        if !statement.is_read_only() {
            let error = StatementError::NotReadOnly;
            log::error!("{}\nQuery:\n{}", error, truncate_long!(query));
            return Err(error.into());
        }
        let schema = derive_schema(&statement)?;
        let planner =
            ConstraintPlanner::new(schema.num_outputs(), schema.num_inputs(), estimates);
        log::debug!(
            "Declared statement relation with {} outputs and {} inputs:\n{}",
            planner.num_outputs,
            planner.num_inputs,
            truncate_long!(query)
        );
        Ok(Self {
            service,
            query: query.into(),
            schema,
            planner,
        })
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn num_outputs(&self) -> usize {
        self.planner.num_outputs
    }

    pub fn num_inputs(&self) -> usize {
        self.planner.num_inputs
    }
}

impl<S: StatementService> VirtualRelation for StatementRelation<S> {
    type Cursor = StatementCursor<S::Statement>;

    fn schema(&self) -> &RelationSchema {
        &self.schema
    }

    fn plan(&self, constraints: &[Constraint]) -> Result<BindingPlan> {
        self.planner.plan(constraints)
    }

    fn open(&self) -> Result<Self::Cursor> {
        let statement = self
            .service
            .prepare(&self.query)
            .inspect_err(|e| log::error!("{:#}", e))?;
        Ok(StatementCursor::new(
            statement,
            self.num_outputs(),
            self.num_inputs(),
        ))
    }
}

impl<P: PreparedStatement> VirtualCursor for StatementCursor<P> {
    type Value = P::Value;

    fn bind(&mut self, order: &ArgumentOrder, arguments: &[P::Value]) -> Result<()> {
        StatementCursor::bind(self, order, arguments)
    }

    fn advance(&mut self) -> Result<()> {
        StatementCursor::advance(self)
    }

    fn column(&self, index: usize) -> Option<P::Value> {
        StatementCursor::column(self, index)
    }

    fn row_id(&self) -> i64 {
        StatementCursor::row_id(self)
    }

    fn at_end(&self) -> bool {
        StatementCursor::at_end(self)
    }

    fn close(&mut self) {
        StatementCursor::close(self)
    }
}
