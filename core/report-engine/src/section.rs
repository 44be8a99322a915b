//! FILENAME: core/report-engine/src/section.rs
//! PURPOSE: Walks sheets and sections and drives the record streams.
//! CONTEXT: `ReportRenderer::render` is the entry point. It renders a fresh
//! runtime copy of the report (optional columns already removed), so the
//! caller's model is never mutated. Each section:
//! - Plain: one record area per record
//! - Grouping: group headers through the `GroupManager`, one record area per record
//! - Composite: group headers, then the child sections once per record, with
//!   the record pushed onto the scope chain
//!
//! Sections without a data source run once against an empty record.

use report_model::{Area, CellValue, Record, ReportModel, SectionKind, SectionModel};

use crate::context::{RenderHistory, SectionContext};
use crate::error::{DataError, RenderError};
use crate::eval::CellEvaluator;
use crate::group::Group;
use crate::group_manager::{GroupManager, GroupRenderer};
use crate::logging::{log_enter, log_exit, log_info, RENDER, SOURCE};
use crate::macros::{MacroDispatcher, MacroRegistry};
use crate::render::{SheetWriter, StampScope};
use crate::sink::WorkbookSink;
use crate::source::{with_source, DataSource, DataSourceProvider};

// ============================================================================
// SUMMARY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetSummary {
    pub name: String,
    pub first_row: u32,
    /// Exclusive.
    pub end_row: u32,
}

impl SheetSummary {
    pub fn rows_written(&self) -> u32 {
        self.end_row - self.first_row
    }
}

#[derive(Debug, Clone)]
pub struct RenderSummary {
    pub sheets: Vec<SheetSummary>,
    pub history: RenderHistory,
}

// ============================================================================
// REPORT RENDERER
// ============================================================================

pub struct ReportRenderer<'a> {
    evaluator: &'a dyn CellEvaluator,
    report_macros: &'a MacroRegistry,
    global_macros: &'a MacroRegistry,
}

impl<'a> ReportRenderer<'a> {
    pub fn new(
        evaluator: &'a dyn CellEvaluator,
        report_macros: &'a MacroRegistry,
        global_macros: &'a MacroRegistry,
    ) -> Self {
        ReportRenderer {
            evaluator,
            report_macros,
            global_macros,
        }
    }

    /// Renders every sheet of `model` into `sink`. `params` is the outermost
    /// scope for expressions and switches optional columns on.
    pub fn render(
        &self,
        model: &ReportModel,
        params: &Record,
        provider: &mut dyn DataSourceProvider,
        sink: &mut dyn WorkbookSink,
    ) -> Result<RenderSummary, RenderError> {
        log_info!(RENDER, "render '{}' ({} sheets)", model.name, model.sheets.len());
        model.validate()?;

        let runtime = runtime_model(model, params)?;
        let macros = MacroDispatcher::new(self.report_macros, self.global_macros);
        let mut history = RenderHistory::new();
        let mut sheets = Vec::with_capacity(runtime.sheets.len());

        for sheet in &runtime.sheets {
            log_info!(RENDER, "sheet '{}'", sheet.name);
            sink.begin_sheet(&sheet.name)?;

            let mut writer = SheetWriter::new(&mut *sink, self.evaluator, macros, params, &runtime.settings);
            let mut run = SectionRun {
                writer: &mut writer,
                scopes: vec![params.clone()],
                history: &mut history,
                provider: &mut *provider,
            };
            for section in sheet.ordered_sections() {
                run.render_section(section)?;
            }

            sheets.push(SheetSummary {
                name: sheet.name.clone(),
                first_row: runtime.settings.first_row,
                end_row: writer.current_row(),
            });
        }

        log_info!(RENDER, "render '{}' done", model.name);
        Ok(RenderSummary { sheets, history })
    }
}

/// Copies the model and removes the optional columns whose parameter is off.
fn runtime_model(model: &ReportModel, params: &Record) -> Result<ReportModel, RenderError> {
    let mut runtime = model.clone();
    for sheet in &mut runtime.sheets {
        for section in &mut sheet.sections {
            apply_optional_columns(section, params)?;
        }
    }
    Ok(runtime)
}

fn apply_optional_columns(section: &mut SectionModel, params: &Record) -> Result<(), RenderError> {
    let mut dropped: Vec<u32> = section
        .optional_columns
        .iter()
        .filter(|opt| !is_switched_on(params.get(&opt.parameter)))
        .map(|opt| opt.column)
        .collect();
    // Right to left, so earlier removals do not shift later ones.
    dropped.sort_unstable_by(|a, b| b.cmp(a));
    dropped.dedup();
    for col in dropped {
        section.remove_template_column(col)?;
    }

    if let SectionKind::Composite { children, .. } = &mut section.kind {
        for child in children {
            apply_optional_columns(child, params)?;
        }
    }
    Ok(())
}

fn is_switched_on(value: Option<&CellValue>) -> bool {
    match value {
        Some(CellValue::Boolean(b)) => *b,
        Some(CellValue::Number(n)) => *n != 0.0,
        Some(CellValue::Text(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

// ============================================================================
// SECTION RUN
// ============================================================================

/// State shared by every section rendered on one sheet.
struct SectionRun<'e, 'r> {
    writer: &'e mut SheetWriter<'r>,
    /// Render parameters, then one record per enclosing composite.
    scopes: Vec<Record>,
    history: &'e mut RenderHistory,
    provider: &'e mut dyn DataSourceProvider,
}

impl<'e, 'r> SectionRun<'e, 'r> {
    fn render_section<'m>(&mut self, section: &'m SectionModel) -> Result<(), RenderError> {
        log_enter!(RENDER, "render_section", "id={} row={}", section.id, self.writer.current_row());

        let mut ctx = SectionContext::new(section.id.clone(), self.writer.current_row());
        if !matches!(section.kind, SectionKind::Plain { .. }) {
            ctx = ctx.with_groups(GroupManager::new(section.levels())?);
        }

        match &section.data_source {
            None => self.process_record(section, &mut ctx, Record::new(), false)?,
            Some(name) => {
                let source = self.provider.open(name, &self.scopes)?;
                log_info!(SOURCE, "section '{}' reads '{}'", section.id, name);
                let composite = matches!(section.kind, SectionKind::Composite { .. });
                with_source(source, |source| {
                    while source.has_next()? {
                        let record = source.next_record()?;
                        let has_more = if composite {
                            peek_has_more(source)?
                        } else {
                            source.has_next()?
                        };
                        self.process_record(section, &mut ctx, record, has_more)?;
                    }
                    Ok(())
                })?;
            }
        }

        if let Some(mut groups) = ctx.groups.take() {
            let mut headers = HeaderWriter {
                writer: &mut *self.writer,
                scopes: &self.scopes,
                history: &*self.history,
                section: &ctx,
            };
            groups.finalize_all_groups(&mut headers)?;
        }

        let snapshot = ctx.snapshot(self.writer.current_row());
        log_exit!(
            RENDER,
            "render_section",
            "id={} records={} rows={:?}",
            section.id,
            snapshot.record_count(),
            snapshot.rows()
        );
        self.history.push(snapshot);
        Ok(())
    }

    fn process_record<'m>(
        &mut self,
        section: &'m SectionModel,
        ctx: &mut SectionContext<'m>,
        record: Record,
        has_more: bool,
    ) -> Result<(), RenderError> {
        match &section.kind {
            SectionKind::Plain { area } => {
                ctx.begin_record(self.writer.current_row(), record.clone(), has_more);
                self.write_record_area(area, &record, ctx)?;
            }
            SectionKind::Grouping { record_area, .. } => {
                self.open_groups(ctx, &record)?;
                ctx.begin_record(self.writer.current_row(), record.clone(), has_more);
                self.write_record_area(record_area, &record, ctx)?;
                self.close_record(ctx);
            }
            SectionKind::Composite { children, .. } => {
                self.open_groups(ctx, &record)?;
                ctx.begin_record(self.writer.current_row(), record.clone(), has_more);

                let mut ordered: Vec<&SectionModel> = children.iter().collect();
                ordered.sort_by_key(|child| child.order);

                self.scopes.push(record);
                let result = ordered.into_iter().try_for_each(|child| self.render_section(child));
                self.scopes.pop();
                result?;

                self.close_record(ctx);
            }
        }
        Ok(())
    }

    fn write_record_area(&mut self, area: &Area, record: &Record, ctx: &SectionContext<'_>) -> Result<(), RenderError> {
        let scope = StampScope {
            record,
            scopes: &self.scopes,
            history: &*self.history,
            section: Some(ctx),
            group: None,
        };
        self.writer.write_area(area, &scope)?;
        Ok(())
    }

    /// Runs `init_record` with the manager taken out of the context, so the
    /// header renderer can still see the context.
    fn open_groups(&mut self, ctx: &mut SectionContext<'_>, record: &Record) -> Result<(), RenderError> {
        let Some(mut groups) = ctx.groups.take() else {
            return Ok(());
        };
        let result = {
            let mut headers = HeaderWriter {
                writer: &mut *self.writer,
                scopes: &self.scopes,
                history: &*self.history,
                section: ctx,
            };
            groups.init_record(record, &mut headers)
        };
        ctx.groups = Some(groups);
        result
    }

    fn close_record(&mut self, ctx: &mut SectionContext<'_>) {
        let row = self.writer.current_row();
        if let Some(groups) = ctx.groups.as_mut() {
            groups.finalize_record(row);
        }
    }
}

/// Whether another record follows, using read-ahead when the source has it.
fn peek_has_more(source: &mut dyn DataSource) -> Result<bool, DataError> {
    match source.read_ahead().map(|next| next.is_some()) {
        Err(DataError::ReadAheadUnsupported(_)) => source.has_next(),
        other => other,
    }
}

// ============================================================================
// GROUP HEADERS
// ============================================================================

/// Writes group headers for the `GroupManager` of one section.
struct HeaderWriter<'w, 'r, 'a> {
    writer: &'w mut SheetWriter<'r>,
    scopes: &'a [Record],
    history: &'a RenderHistory,
    section: &'a SectionContext<'a>,
}

impl GroupRenderer for HeaderWriter<'_, '_, '_> {
    fn current_row(&self) -> u32 {
        self.writer.current_row()
    }

    fn reserve_rows(&mut self, count: u32) -> Result<u32, RenderError> {
        self.writer.reserve_rows(count)
    }

    fn render_group(&mut self, group: &Group<'_>, area: &Area, row: u32) -> Result<(), RenderError> {
        let scope = StampScope {
            record: group.record(),
            scopes: self.scopes,
            history: self.history,
            section: Some(self.section),
            group: Some(group),
        };
        self.writer.stamp(area, row, &scope)
    }

    fn outline_rows(&mut self, first: u32, last: u32, collapsed: bool) -> Result<(), RenderError> {
        self.writer.outline(first, last, collapsed)
    }
}
