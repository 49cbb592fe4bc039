use crate::{Result, StatementError};

/// Operator of a candidate constraint proposed by the host optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    Eq,
    Gt,
    Le,
    Lt,
    Ge,
    Match,
    Like,
    Glob,
    Regexp,
    Ne,
    IsNot,
    IsNotNull,
    IsNull,
    Is,
    Limit,
    Offset,
    /// Overloaded function operator, carries the host code.
    Function(u8),
}

/// Candidate predicate `column op value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Constraint {
    /// Relation column index, `None` for constraints on no column (rowid, LIMIT, OFFSET).
    pub column: Option<usize>,
    pub op: ConstraintOp,
    pub usable: bool,
}

impl Constraint {
    pub fn new(column: Option<usize>, op: ConstraintOp, usable: bool) -> Self {
        Self { column, op, usable }
    }

    /// Usable equality constraint on `column`.
    pub fn eq(column: usize) -> Self {
        Self::new(Some(column), ConstraintOp::Eq, true)
    }
}

/// What the host must do with a single constraint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConstraintUsage {
    /// 0-based position of the constraint value among the scan arguments.
    pub argument: Option<usize>,
    /// The constraint is fully handled, the host does not re-check it.
    pub omit: bool,
}

/// How scan arguments map onto statement parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgumentOrder {
    /// Argument `i` binds parameter `i + 1`.
    Identity,
    /// Argument `i` binds the 1-based parameter position `map[i]`.
    Mapped(Box<[usize]>),
}

impl ArgumentOrder {
    /// 1-based parameter position bound by the 0-based `argument`.
    pub fn parameter(&self, argument: usize) -> Option<usize> {
        match self {
            ArgumentOrder::Identity => Some(argument + 1),
            ArgumentOrder::Mapped(map) => map.get(argument).copied(),
        }
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, ArgumentOrder::Identity)
    }
}

/// Cost figures reported for every accepted plan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanEstimates {
    pub cost: f64,
    pub rows: i64,
}

impl Default for PlanEstimates {
    fn default() -> Self {
        Self { cost: 1.0, rows: 1 }
    }
}

/// Accepted plan for a scan.
#[derive(Debug, Clone, PartialEq)]
pub struct BindingPlan {
    /// One entry per candidate constraint, in the order they were proposed.
    pub usage: Box<[ConstraintUsage]>,
    pub order: ArgumentOrder,
    /// Number of arguments the host supplies when the scan starts.
    pub argc: usize,
    pub estimates: PlanEstimates,
    /// Always false, rows come in statement order.
    pub order_by_consumed: bool,
}

/// Decides which constraints a statement relation consumes.
///
/// Every hidden input column that carries a constraint must be bound, so any
/// constraint on it that is not a usable equality rejects the whole plan.
/// Constraints on output columns are left to the host.
#[derive(Debug, Clone, Copy)]
pub struct ConstraintPlanner {
    pub num_outputs: usize,
    pub num_inputs: usize,
    pub estimates: PlanEstimates,
}

/// Hidden columns past this index skip the contiguity fast path.
pub const TRACKED_COLUMNS: usize = u64::BITS as usize;

impl ConstraintPlanner {
    pub fn new(num_outputs: usize, num_inputs: usize, estimates: PlanEstimates) -> Self {
        Self {
            num_outputs,
            num_inputs,
            estimates,
        }
    }

    pub fn plan(&self, constraints: &[Constraint]) -> Result<BindingPlan> {
        let mut usage = vec![ConstraintUsage::default(); constraints.len()].into_boxed_slice();
        let mut claimed = vec![false; self.num_inputs];
        let mut used_columns = 0u64;
        let mut max_column = None::<usize>;
        let mut consumed = 0usize;
        for (i, constraint) in constraints.iter().enumerate() {
            let Some(column) = constraint
                .column
                .filter(|column| *column >= self.num_outputs)
            else {
                continue;
            };
            let input = column - self.num_outputs;
            if input >= self.num_inputs {
                let error = StatementError::invariant(format!(
                    "Constraint on column {} but the relation has only {} columns",
                    column,
                    self.num_outputs + self.num_inputs
                ));
                log::error!("{:#}", error);
                return Err(error);
            }
            if !constraint.usable {
                log::trace!("Input column {} has an unusable constraint", input);
                return Err(StatementError::PlanInfeasible {
                    column: input,
                    reason: "the constraint is not usable",
                }
                .into());
            }
            if constraint.op != ConstraintOp::Eq {
                log::trace!(
                    "Input column {} has a {:?} constraint",
                    input,
                    constraint.op
                );
                return Err(StatementError::PlanInfeasible {
                    column: input,
                    reason: "only equality constraints can be bound",
                }
                .into());
            }
            if claimed[input] {
                log::trace!(
                    "Input column {} is already bound, constraint {} is left to the host",
                    input,
                    i
                );
                continue;
            }
            claimed[input] = true;
            usage[i] = ConstraintUsage {
                argument: Some(input),
                omit: true,
            };
            max_column = max_column.max(Some(input));
            if input < TRACKED_COLUMNS {
                used_columns |= 1 << input;
            }
            consumed += 1;
        }

        let Some(max_column) = max_column else {
            return Ok(self.accept(usage, ArgumentOrder::Identity, 0));
        };
        if max_column < TRACKED_COLUMNS && used_columns == u64::MAX >> (63 - max_column) {
            log::debug!(
                "Binding {} input columns in column order",
                max_column + 1
            );
            return Ok(self.accept(usage, ArgumentOrder::Identity, max_column + 1));
        }

        let mut map = Vec::new();
        map.try_reserve_exact(consumed)
            .map_err(|_| StatementError::OutOfMemory)?;
        for entry in usage.iter_mut() {
            if let Some(input) = entry.argument {
                entry.argument = Some(map.len());
                map.push(input + 1);
            }
        }
        log::debug!("Binding input columns through parameter map {:?}", map);
        Ok(self.accept(usage, ArgumentOrder::Mapped(map.into_boxed_slice()), consumed))
    }

    fn accept(
        &self,
        usage: Box<[ConstraintUsage]>,
        order: ArgumentOrder,
        argc: usize,
    ) -> BindingPlan {
        BindingPlan {
            usage,
            order,
            argc,
            estimates: self.estimates,
            order_by_consumed: false,
        }
    }
}
