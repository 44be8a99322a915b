//! FILENAME: core/report-engine/src/macros.rs
//! PURPOSE: Macros turn `#NAME(args)` template cells into formulas.
//! CONTEXT: A macro sees where it is being written and what has been rendered
//! so far (live section context, render history, the group whose header is
//! being written). Lookup goes to the per-report registry first, then to the
//! global one supplied by the caller.

use report_model::{col_to_index, coord_to_a1, range_to_a1, Record};
use rustc_hash::FxHashMap;

use crate::context::{RenderHistory, SectionContext};
use crate::error::MacroError;
use crate::group::Group;

/// Everything a macro may look at.
pub struct MacroContext<'a> {
    pub row: u32,
    pub col: u32,
    pub section: Option<&'a SectionContext<'a>>,
    pub history: &'a RenderHistory,
    pub params: &'a Record,
    /// Set while a group header is being written.
    pub group: Option<&'a Group<'a>>,
}

pub trait Macro {
    /// Returns the formula text, without the leading '='.
    fn invoke(&self, args: &str, ctx: &MacroContext<'_>) -> Result<String, MacroError>;
}

impl<F> Macro for F
where
    F: Fn(&str, &MacroContext<'_>) -> Result<String, MacroError>,
{
    fn invoke(&self, args: &str, ctx: &MacroContext<'_>) -> Result<String, MacroError> {
        self(args, ctx)
    }
}

#[derive(Default)]
pub struct MacroRegistry {
    macros: FxHashMap<String, Box<dyn Macro>>,
}

impl MacroRegistry {
    pub fn new() -> Self {
        MacroRegistry::default()
    }

    /// Registry holding the built-in group and section macros.
    pub fn with_builtins() -> Self {
        let mut registry = MacroRegistry::new();
        registry.register_fn("GROUP_SUM", |args, ctx| group_aggregate("GROUP_SUM", "SUM", args, ctx));
        registry.register_fn("GROUP_COUNT", |args, ctx| group_aggregate("GROUP_COUNT", "COUNT", args, ctx));
        registry.register_fn("ROW_OF", row_of);
        registry.register_fn("SECTION_SUM", section_sum);
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, m: impl Macro + 'static) {
        self.macros.insert(name.into(), Box::new(m));
    }

    pub fn register_fn<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&str, &MacroContext<'_>) -> Result<String, MacroError> + 'static,
    {
        self.register(name, f);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Macro> {
        self.macros.get(name).map(|m| m.as_ref())
    }

    pub fn len(&self) -> usize {
        self.macros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }
}

impl std::fmt::Debug for MacroRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.macros.keys().collect();
        names.sort();
        f.debug_struct("MacroRegistry").field("macros", &names).finish()
    }
}

/// Per-report registry first, then the global one.
#[derive(Debug, Clone, Copy)]
pub struct MacroDispatcher<'a> {
    report: &'a MacroRegistry,
    global: &'a MacroRegistry,
}

impl<'a> MacroDispatcher<'a> {
    pub fn new(report: &'a MacroRegistry, global: &'a MacroRegistry) -> Self {
        MacroDispatcher { report, global }
    }

    pub fn invoke(&self, name: &str, args: &str, ctx: &MacroContext<'_>) -> Result<String, MacroError> {
        let found = self
            .report
            .get(name)
            .or_else(|| self.global.get(name))
            .ok_or_else(|| MacroError::Unknown(name.to_string()))?;
        found.invoke(args, ctx)
    }
}

// ============================================================================
// BUILT-IN MACROS
// ============================================================================

fn split_args(args: &str) -> Vec<&str> {
    if args.trim().is_empty() {
        return Vec::new();
    }
    args.split(',').map(str::trim).collect()
}

/// Column letters, or the macro's own column when omitted.
fn column_arg(name: &str, arg: Option<&&str>, ctx: &MacroContext<'_>) -> Result<u32, MacroError> {
    match arg {
        None => Ok(ctx.col),
        Some(letters) => {
            col_to_index(letters).ok_or_else(|| MacroError::failed(name, format!("'{}' is not a column", letters)))
        }
    }
}

/// `#GROUP_SUM(C)`: aggregate over the content of the group being written.
fn group_aggregate(name: &str, function: &str, args: &str, ctx: &MacroContext<'_>) -> Result<String, MacroError> {
    let group = ctx
        .group
        .ok_or_else(|| MacroError::failed(name, "only valid in a group header"))?;
    let args = split_args(args);
    let col = column_arg(name, args.first(), ctx)?;
    let header_offset = ctx.row.saturating_sub(group.start_row());
    match group.content_reference(col, header_offset) {
        Some(reference) => Ok(format!("{}({})", function, reference)),
        None => Ok("0".to_string()),
    }
}

/// `#ROW_OF(section, n, C)`: the cell of record `n` of the latest run of `section`.
fn row_of(args: &str, ctx: &MacroContext<'_>) -> Result<String, MacroError> {
    let args = split_args(args);
    let section = args
        .first()
        .ok_or_else(|| MacroError::failed("ROW_OF", "missing section id"))?;
    let n: usize = args
        .get(1)
        .and_then(|n| n.parse().ok())
        .ok_or_else(|| MacroError::failed("ROW_OF", "missing record number"))?;
    let col = column_arg("ROW_OF", args.get(2), ctx)?;
    let snapshot = ctx
        .history
        .latest(section)
        .ok_or_else(|| MacroError::failed("ROW_OF", format!("section '{}' has not been rendered", section)))?;
    let row = snapshot
        .row_of(n)
        .ok_or_else(|| MacroError::failed("ROW_OF", format!("section '{}' has no record {}", section, n)))?;
    Ok(coord_to_a1((row, col)))
}

/// `#SECTION_SUM(section, C)`: SUM over every row of the latest run of `section`.
fn section_sum(args: &str, ctx: &MacroContext<'_>) -> Result<String, MacroError> {
    let args = split_args(args);
    let section = args
        .first()
        .ok_or_else(|| MacroError::failed("SECTION_SUM", "missing section id"))?;
    let col = column_arg("SECTION_SUM", args.get(1), ctx)?;
    let snapshot = ctx.history.latest(section).ok_or_else(|| {
        MacroError::failed("SECTION_SUM", format!("section '{}' has not been rendered", section))
    })?;
    let rows = snapshot.rows();
    if rows.is_empty() {
        return Ok("0".to_string());
    }
    Ok(format!("SUM({})", range_to_a1((rows.start, col), (rows.end - 1, col))))
}
