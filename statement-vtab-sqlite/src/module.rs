use crate::{
    DbMutexGuard, SqlitePrepared, SqliteService, SqliteSqlWriter, SqliteValue, error_message,
};
use libsqlite3_sys::*;
use statement_vtab_core::{
    ArgumentOrder, Constraint, ConstraintOp, Error, PlanEstimates, Result, StatementCursor,
    StatementError, StatementRelation, VirtualRelation,
};
use std::{
    borrow::Cow,
    ffi::{CStr, CString, c_char, c_int, c_void},
    mem, slice,
    sync::Arc,
};

/// Settings of a registered statement module.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleConfig {
    /// Name used in `CREATE VIRTUAL TABLE ... USING <name>(...)`.
    pub name: Cow<'static, str>,
    /// Cost figures reported for every accepted plan.
    pub estimates: PlanEstimates,
}

impl ModuleConfig {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            estimates: Default::default(),
        }
    }

    pub fn with_estimates(mut self, estimates: PlanEstimates) -> Self {
        self.estimates = estimates;
        self
    }
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self::new("statement")
    }
}

/// Handle to a module installed on a connection.
#[derive(Debug, Clone)]
pub struct StatementModule {
    config: Arc<ModuleConfig>,
}

impl StatementModule {
    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &ModuleConfig {
        &self.config
    }

    /// `CREATE VIRTUAL TABLE` statement exposing `query` as `table` through this module.
    pub fn create_table_sql(&self, table: &str, query: &str, if_not_exists: bool) -> String {
        let mut out = String::new();
        SqliteSqlWriter {}.write_create_statement_table(
            &mut out,
            self.name(),
            table,
            query,
            if_not_exists,
        );
        out
    }

    pub fn drop_table_sql(&self, table: &str, if_exists: bool) -> String {
        let mut out = String::new();
        SqliteSqlWriter {}.write_drop_table(&mut out, table, if_exists);
        out
    }
}

/// Installs the statement module on `connection`.
///
/// # Safety
/// `connection` must be an open database handle.
pub unsafe fn register_statement_module(
    connection: *mut sqlite3,
    config: ModuleConfig,
) -> Result<StatementModule> {
    let name = CString::new(config.name.as_bytes()).map_err(|_| {
        StatementError::argument(format!(
            "Module name `{}` contains a NUL character",
            config.name
        ))
    })?;
    let config = Arc::new(config);
    let aux = Arc::into_raw(config.clone()) as *mut c_void;
    let _guard = DbMutexGuard::lock(connection);
    // On failure SQLite releases `aux` through `destroy_config` itself.
    let rc = unsafe {
        sqlite3_create_module_v2(
            connection,
            name.as_ptr(),
            &STATEMENT_MODULE,
            aux,
            Some(destroy_config),
        )
    };
    if rc != SQLITE_OK {
        let error = StatementError::execution(rc, error_message(connection));
        log::error!("{:#}\nWhile registering the module `{}`", error, config.name);
        return Err(error);
    }
    log::debug!("Registered the statement module as `{}`", config.name);
    Ok(StatementModule { config })
}

unsafe extern "C" fn destroy_config(aux: *mut c_void) {
    drop(unsafe { Arc::from_raw(aux as *const ModuleConfig) });
}

static STATEMENT_MODULE: sqlite3_module = sqlite3_module {
    iVersion: 1,
    xCreate: Some(x_create),
    xConnect: Some(x_connect),
    xBestIndex: Some(x_best_index),
    xDisconnect: Some(x_disconnect),
    xDestroy: Some(x_destroy),
    xOpen: Some(x_open),
    xClose: Some(x_close),
    xFilter: Some(x_filter),
    xNext: Some(x_next),
    xEof: Some(x_eof),
    xColumn: Some(x_column),
    xRowid: Some(x_rowid),
    ..unsafe { mem::zeroed() }
};

#[repr(C)]
struct StatementVTab {
    base: sqlite3_vtab,
    relation: StatementRelation<SqliteService>,
}

#[repr(C)]
struct StatementVTabCursor {
    base: sqlite3_vtab_cursor,
    cursor: StatementCursor<SqlitePrepared>,
}

// Create and connect must stay distinct functions, the same pointer in both
// slots makes SQLite treat the module as eponymous.
unsafe extern "C" fn x_create(
    db: *mut sqlite3,
    aux: *mut c_void,
    argc: c_int,
    argv: *const *const c_char,
    pp_vtab: *mut *mut sqlite3_vtab,
    pz_err: *mut *mut c_char,
) -> c_int {
    log::trace!("Creating a statement table");
    unsafe { declare(db, aux, argc, argv, pp_vtab, pz_err) }
}

unsafe extern "C" fn x_connect(
    db: *mut sqlite3,
    aux: *mut c_void,
    argc: c_int,
    argv: *const *const c_char,
    pp_vtab: *mut *mut sqlite3_vtab,
    pz_err: *mut *mut c_char,
) -> c_int {
    log::trace!("Connecting to an existing statement table");
    unsafe { declare(db, aux, argc, argv, pp_vtab, pz_err) }
}

unsafe fn declare(
    db: *mut sqlite3,
    aux: *mut c_void,
    argc: c_int,
    argv: *const *const c_char,
    pp_vtab: *mut *mut sqlite3_vtab,
    pz_err: *mut *mut c_char,
) -> c_int {
    let config = unsafe { &*(aux as *const ModuleConfig) };
    let argument = if argc < 4 {
        None
    } else {
        match unsafe { CStr::from_ptr(*argv.add(3)) }.to_str() {
            Ok(v) => Some(v),
            Err(e) => {
                let error = StatementError::argument(format!("statement is not valid UTF-8: {e}"));
                return unsafe { report_error(pz_err, &error) };
            }
        }
    };
    let service = unsafe { SqliteService::new(db) };
    let result = StatementRelation::declare(service, argument, config.estimates).and_then(
        |relation| {
            let sql = CString::new(relation.schema().to_create_table()?)?;
            let _guard = DbMutexGuard::lock(db);
            let rc = unsafe { sqlite3_declare_vtab(db, sql.as_ptr()) };
            if rc != SQLITE_OK {
                let error = StatementError::execution(rc, error_message(db));
                log::error!("{:#}\nWhile declaring:\n{}", error, sql.to_string_lossy());
                return Err(error);
            }
            Ok(relation)
        },
    );
    match result {
        Ok(relation) => {
            let vtab = Box::new(StatementVTab {
                base: unsafe { mem::zeroed() },
                relation,
            });
            unsafe { *pp_vtab = Box::into_raw(vtab) as *mut sqlite3_vtab };
            SQLITE_OK
        }
        Err(error) => unsafe { report_error(pz_err, &error) },
    }
}

unsafe extern "C" fn x_best_index(vtab: *mut sqlite3_vtab, info: *mut sqlite3_index_info) -> c_int {
    let vtab = unsafe { &mut *(vtab as *mut StatementVTab) };
    let info = unsafe { &mut *info };
    let count = info.nConstraint.max(0) as usize;
    let (candidates, usage) = if count == 0 {
        (&[][..], &mut [][..])
    } else {
        unsafe {
            (
                slice::from_raw_parts(info.aConstraint, count),
                slice::from_raw_parts_mut(info.aConstraintUsage, count),
            )
        }
    };
    let constraints = candidates
        .iter()
        .map(|c| {
            Constraint::new(
                usize::try_from(c.iColumn).ok(),
                constraint_op(c.op),
                c.usable != 0,
            )
        })
        .collect::<Vec<_>>();
    let plan = match vtab.relation.plan(&constraints) {
        Ok(plan) => plan,
        Err(error) => {
            return match StatementError::of(&error) {
                Some(StatementError::PlanInfeasible { .. }) => SQLITE_CONSTRAINT,
                _ => unsafe { set_vtab_error(&mut vtab.base, &error) },
            };
        }
    };
    for (target, planned) in usage.iter_mut().zip(plan.usage.iter()) {
        target.argvIndex = planned.argument.map_or(0, |i| i as c_int + 1);
        target.omit = planned.omit as _;
    }
    if let ArgumentOrder::Mapped(map) = &plan.order {
        let size = (map.len() * mem::size_of::<c_int>()) as u64;
        let colmap = unsafe { sqlite3_malloc64(size) } as *mut c_int;
        if colmap.is_null() {
            return SQLITE_NOMEM;
        }
        for (i, parameter) in map.iter().enumerate() {
            unsafe { *colmap.add(i) = *parameter as c_int };
        }
        info.idxStr = colmap as *mut c_char;
        info.needToFreeIdxStr = 1;
    }
    info.idxNum = plan.argc as c_int;
    info.orderByConsumed = plan.order_by_consumed as c_int;
    info.estimatedCost = plan.estimates.cost;
    info.estimatedRows = plan.estimates.rows;
    SQLITE_OK
}

fn constraint_op(op: u8) -> ConstraintOp {
    match op as c_int {
        SQLITE_INDEX_CONSTRAINT_EQ => ConstraintOp::Eq,
        SQLITE_INDEX_CONSTRAINT_GT => ConstraintOp::Gt,
        SQLITE_INDEX_CONSTRAINT_LE => ConstraintOp::Le,
        SQLITE_INDEX_CONSTRAINT_LT => ConstraintOp::Lt,
        SQLITE_INDEX_CONSTRAINT_GE => ConstraintOp::Ge,
        SQLITE_INDEX_CONSTRAINT_MATCH => ConstraintOp::Match,
        SQLITE_INDEX_CONSTRAINT_LIKE => ConstraintOp::Like,
        SQLITE_INDEX_CONSTRAINT_GLOB => ConstraintOp::Glob,
        SQLITE_INDEX_CONSTRAINT_REGEXP => ConstraintOp::Regexp,
        SQLITE_INDEX_CONSTRAINT_NE => ConstraintOp::Ne,
        SQLITE_INDEX_CONSTRAINT_ISNOT => ConstraintOp::IsNot,
        SQLITE_INDEX_CONSTRAINT_ISNOTNULL => ConstraintOp::IsNotNull,
        SQLITE_INDEX_CONSTRAINT_ISNULL => ConstraintOp::IsNull,
        SQLITE_INDEX_CONSTRAINT_IS => ConstraintOp::Is,
        SQLITE_INDEX_CONSTRAINT_LIMIT => ConstraintOp::Limit,
        SQLITE_INDEX_CONSTRAINT_OFFSET => ConstraintOp::Offset,
        _ => ConstraintOp::Function(op),
    }
}

unsafe extern "C" fn x_open(
    vtab: *mut sqlite3_vtab,
    pp_cursor: *mut *mut sqlite3_vtab_cursor,
) -> c_int {
    let vtab = unsafe { &mut *(vtab as *mut StatementVTab) };
    match vtab.relation.open() {
        Ok(cursor) => {
            let cursor = Box::new(StatementVTabCursor {
                base: unsafe { mem::zeroed() },
                cursor,
            });
            unsafe { *pp_cursor = Box::into_raw(cursor) as *mut sqlite3_vtab_cursor };
            SQLITE_OK
        }
        Err(error) => unsafe { set_vtab_error(&mut vtab.base, &error) },
    }
}

unsafe extern "C" fn x_close(cursor: *mut sqlite3_vtab_cursor) -> c_int {
    let mut cursor = unsafe { Box::from_raw(cursor as *mut StatementVTabCursor) };
    cursor.cursor.close();
    SQLITE_OK
}

unsafe extern "C" fn x_filter(
    cursor: *mut sqlite3_vtab_cursor,
    idx_num: c_int,
    idx_str: *const c_char,
    argc: c_int,
    argv: *mut *mut sqlite3_value,
) -> c_int {
    let cursor = unsafe { &mut *(cursor as *mut StatementVTabCursor) };
    let argc = argc.max(0) as usize;
    let order = match unsafe { argument_order(idx_num, idx_str, argc) } {
        Ok(order) => order,
        Err(error) => return unsafe { set_vtab_error(cursor.base.pVtab, &error) },
    };
    let arguments = if argc == 0 {
        Vec::new()
    } else {
        unsafe { slice::from_raw_parts(argv, argc) }
            .iter()
            .map(|v| SqliteValue(*v))
            .collect()
    };
    match cursor.cursor.bind(&order, &arguments) {
        Ok(()) => SQLITE_OK,
        Err(error) => unsafe { set_vtab_error(cursor.base.pVtab, &error) },
    }
}

/// Decodes the argument order stored by the planner in `idx_str`.
///
/// # Safety
/// A non-null `idx_str` must point to `idx_num` ints.
pub(crate) unsafe fn argument_order(
    idx_num: c_int,
    idx_str: *const c_char,
    argc: usize,
) -> Result<ArgumentOrder> {
    if idx_str.is_null() {
        if argc != idx_num.max(0) as usize {
            log::warn!("Filter received {} arguments, the plan expected {}", argc, idx_num);
        }
        return Ok(ArgumentOrder::Identity);
    }
    if argc != idx_num.max(0) as usize {
        let error = StatementError::invariant(format!(
            "filter received {} arguments for a map of {} parameters",
            argc, idx_num
        ));
        log::error!("{:#}", error);
        return Err(error);
    }
    let map = unsafe { slice::from_raw_parts(idx_str as *const c_int, argc) };
    Ok(ArgumentOrder::Mapped(map.iter().map(|v| *v as usize).collect()))
}

unsafe extern "C" fn x_next(cursor: *mut sqlite3_vtab_cursor) -> c_int {
    let cursor = unsafe { &mut *(cursor as *mut StatementVTabCursor) };
    match cursor.cursor.advance() {
        Ok(()) => SQLITE_OK,
        Err(error) => unsafe { set_vtab_error(cursor.base.pVtab, &error) },
    }
}

unsafe extern "C" fn x_eof(cursor: *mut sqlite3_vtab_cursor) -> c_int {
    let cursor = unsafe { &*(cursor as *const StatementVTabCursor) };
    cursor.cursor.at_end() as c_int
}

unsafe extern "C" fn x_column(
    cursor: *mut sqlite3_vtab_cursor,
    context: *mut sqlite3_context,
    index: c_int,
) -> c_int {
    let cursor = unsafe { &*(cursor as *const StatementVTabCursor) };
    if let Some(value) = usize::try_from(index)
        .ok()
        .and_then(|i| cursor.cursor.column(i))
    {
        unsafe { sqlite3_result_value(context, value.0) };
    }
    SQLITE_OK
}

unsafe extern "C" fn x_rowid(cursor: *mut sqlite3_vtab_cursor, row_id: *mut sqlite3_int64) -> c_int {
    let cursor = unsafe { &*(cursor as *const StatementVTabCursor) };
    unsafe { *row_id = cursor.cursor.row_id() };
    SQLITE_OK
}

unsafe extern "C" fn x_disconnect(vtab: *mut sqlite3_vtab) -> c_int {
    log::trace!("Disconnecting a statement table");
    drop(unsafe { Box::from_raw(vtab as *mut StatementVTab) });
    SQLITE_OK
}

unsafe extern "C" fn x_destroy(vtab: *mut sqlite3_vtab) -> c_int {
    log::trace!("Dropping a statement table");
    drop(unsafe { Box::from_raw(vtab as *mut StatementVTab) });
    SQLITE_OK
}

/// Result code SQLite receives for `error`.
pub fn result_code(error: &Error) -> c_int {
    match StatementError::of(error) {
        Some(StatementError::Argument(..)) => SQLITE_MISUSE,
        Some(StatementError::NotReadOnly) | Some(StatementError::SchemaDerivation { .. }) => {
            SQLITE_ERROR
        }
        Some(StatementError::PlanInfeasible { .. }) => SQLITE_CONSTRAINT,
        Some(StatementError::Execution { code, .. }) => *code,
        Some(StatementError::OutOfMemory) => SQLITE_NOMEM,
        Some(StatementError::InvariantViolation(..)) => SQLITE_INTERNAL,
        None => SQLITE_ERROR,
    }
}

fn sqlite_message(error: &Error) -> *mut c_char {
    let message = CString::new(format!("{:#}", error).replace('\0', " ")).unwrap_or_default();
    unsafe { sqlite3_mprintf(c"%s".as_ptr(), message.as_ptr()) }
}

unsafe fn report_error(pz_err: *mut *mut c_char, error: &Error) -> c_int {
    let message = sqlite_message(error);
    if message.is_null() {
        return SQLITE_NOMEM;
    }
    unsafe { *pz_err = message };
    result_code(error)
}

unsafe fn set_vtab_error(vtab: *mut sqlite3_vtab, error: &Error) -> c_int {
    let message = sqlite_message(error);
    if message.is_null() {
        return SQLITE_NOMEM;
    }
    unsafe {
        sqlite3_free((*vtab).zErrMsg as *mut c_void);
        (*vtab).zErrMsg = message;
    }
    result_code(error)
}
