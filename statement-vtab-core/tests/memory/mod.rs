#![allow(dead_code)]

use statement_vtab_core::{
    Error, PreparedStatement, Result, Step, StatementError, StatementService, Value,
};
use std::{
    collections::{HashMap, VecDeque},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

pub type Rows = Vec<Vec<Value>>;
pub type Evaluate = Arc<dyn Fn(&[Value]) -> Result<Rows> + Send + Sync>;

/// Query known to the in-memory service, rows are computed from the bindings.
#[derive(Clone)]
pub struct MemoryQuery {
    pub columns: Vec<(Option<String>, Option<String>)>,
    pub parameters: Vec<Option<String>>,
    pub read_only: bool,
    pub evaluate: Evaluate,
}

impl MemoryQuery {
    pub fn new(
        columns: &[(&str, Option<&str>)],
        parameters: &[Option<&str>],
        evaluate: impl Fn(&[Value]) -> Result<Rows> + Send + Sync + 'static,
    ) -> Self {
        Self {
            columns: columns
                .iter()
                .map(|(name, ty)| (Some(name.to_string()), ty.map(str::to_string)))
                .collect(),
            parameters: parameters.iter().map(|p| p.map(str::to_string)).collect(),
            read_only: true,
            evaluate: Arc::new(evaluate),
        }
    }

    pub fn writing(mut self) -> Self {
        self.read_only = false;
        self
    }
}

/// Prepared statement service backed by closures, counts prepared and
/// finalized statements.
#[derive(Clone, Default)]
pub struct MemoryService {
    pub queries: HashMap<String, MemoryQuery>,
    pub prepared: Arc<AtomicUsize>,
    pub finalized: Arc<AtomicUsize>,
}

impl MemoryService {
    pub fn with(mut self, sql: &str, query: MemoryQuery) -> Self {
        self.queries.insert(sql.to_string(), query);
        self
    }

    pub fn prepared(&self) -> usize {
        self.prepared.load(Ordering::SeqCst)
    }

    pub fn finalized(&self) -> usize {
        self.finalized.load(Ordering::SeqCst)
    }
}

impl StatementService for MemoryService {
    type Statement = MemoryStatement;

    fn prepare(&self, sql: &str) -> Result<MemoryStatement> {
        let query = self
            .queries
            .get(sql)
            .cloned()
            .ok_or_else(|| StatementError::execution(1, format!("near \"{sql}\": syntax error")))?;
        self.prepared.fetch_add(1, Ordering::SeqCst);
        Ok(MemoryStatement {
            bindings: vec![Value::Null; query.parameters.len()],
            query,
            pending: None,
            current: None,
            finalized: self.finalized.clone(),
        })
    }
}

pub struct MemoryStatement {
    query: MemoryQuery,
    bindings: Vec<Value>,
    pending: Option<VecDeque<Vec<Value>>>,
    current: Option<Vec<Value>>,
    finalized: Arc<AtomicUsize>,
}

impl MemoryStatement {
    pub fn bindings(&self) -> &[Value] {
        &self.bindings
    }
}

impl PreparedStatement for MemoryStatement {
    type Value = Value;

    fn column_count(&self) -> usize {
        self.query.columns.len()
    }
    fn column_name(&self, index: usize) -> Option<String> {
        self.query.columns.get(index)?.0.clone()
    }
    fn column_declared_type(&self, index: usize) -> Option<String> {
        self.query.columns.get(index)?.1.clone()
    }
    fn parameter_count(&self) -> usize {
        self.query.parameters.len()
    }
    fn parameter_name(&self, position: usize) -> Option<String> {
        self.query.parameters.get(position.checked_sub(1)?)?.clone()
    }
    fn is_read_only(&self) -> bool {
        self.query.read_only
    }
    fn bind(&mut self, position: usize, value: &Value) -> Result<()> {
        if position == 0 || position > self.bindings.len() {
            return Err(StatementError::execution(25, "column index out of range"));
        }
        self.bindings[position - 1] = value.clone();
        Ok(())
    }
    fn reset(&mut self) {
        self.pending = None;
        self.current = None;
    }
    fn clear_bindings(&mut self) {
        self.bindings.fill(Value::Null);
    }
    fn step(&mut self) -> Result<Step> {
        if self.pending.is_none() {
            let rows = (self.query.evaluate)(&self.bindings)?;
            self.pending = Some(rows.into());
        }
        self.current = self.pending.as_mut().and_then(VecDeque::pop_front);
        Ok(match self.current {
            Some(..) => Step::Row,
            None => Step::Done,
        })
    }
    fn current_value(&self, index: usize) -> Value {
        self.current
            .as_ref()
            .and_then(|row| row.get(index).cloned())
            .unwrap_or_default()
    }
    fn is_positioned_on_row(&self) -> bool {
        self.current.is_some()
    }
}

impl Drop for MemoryStatement {
    fn drop(&mut self) {
        self.finalized.fetch_add(1, Ordering::SeqCst);
    }
}

/// Table `t(k, v)` filtered by `k = :k`.
pub fn lookup_service(table: &'static [(i64, &'static str)]) -> MemoryService {
    MemoryService::default().with(
        "SELECT v FROM t WHERE k = :k",
        MemoryQuery::new(&[("v", Some("TEXT"))], &[Some(":k")], move |bindings| {
            Ok(table
                .iter()
                .filter(|(k, _)| bindings[0] == Value::Int64(Some(*k)))
                .map(|(_, v)| vec![Value::from(*v)])
                .collect())
        }),
    )
}

pub fn failing(message: &str) -> Error {
    StatementError::execution(1, message.to_string())
}
