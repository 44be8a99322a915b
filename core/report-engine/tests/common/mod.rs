//! FILENAME: core/report-engine/tests/common/mod.rs
//! Test harness and fixtures for report engine integration tests.

#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;

use report_engine::{
    DataError, DataSource, DataSourceProvider, FieldEvaluator, Group, GroupManager, GroupRenderer,
    InMemoryProvider, MacroRegistry, RenderError, RenderSummary, ReportRenderer, VecDataSource,
};
use report_model::{Area, CellTemplate, CellValue, OutputWorkbook, Record, ReportModel};

// ============================================================================
// GROUP MANAGER HARNESS
// ============================================================================

/// One thing the group manager asked for, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Reserve { first: u32, count: u32 },
    Record { row: u32 },
    Header(HeaderEvent),
    Outline { first: u32, last: u32, collapsed: bool },
}

/// What a closed group looked like when its header was written.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderEvent {
    pub row: u32,
    pub index: usize,
    pub depth: u32,
    pub discriminator: Option<CellValue>,
    pub records: Vec<u32>,
    pub records_height: Option<u32>,
    pub children: Vec<Option<CellValue>>,
    /// Content reference in column B from the first header row.
    pub reference: Option<String>,
}

impl HeaderEvent {
    fn of(group: &Group<'_>, row: u32) -> Self {
        HeaderEvent {
            row,
            index: group.index(),
            depth: group.depth(),
            discriminator: group.discriminator().cloned(),
            records: group.records().to_vec(),
            records_height: group.records_height(),
            children: group.children().iter().map(|c| c.discriminator().cloned()).collect(),
            reference: group.content_reference(1, 0),
        }
    }
}

/// Row cursor that logs every call made by the group manager.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub row: u32,
    pub events: Vec<Event>,
}

impl RecordingRenderer {
    pub fn headers(&self) -> Vec<&HeaderEvent> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Header(h) => Some(h),
                _ => None,
            })
            .collect()
    }

    pub fn position_of_header(&self, row: u32) -> Option<usize> {
        self.events
            .iter()
            .position(|e| matches!(e, Event::Header(h) if h.row == row))
    }

    pub fn position_of_record(&self, row: u32) -> Option<usize> {
        self.events
            .iter()
            .position(|e| matches!(e, Event::Record { row: r } if *r == row))
    }
}

impl GroupRenderer for RecordingRenderer {
    fn current_row(&self) -> u32 {
        self.row
    }

    fn reserve_rows(&mut self, count: u32) -> Result<u32, RenderError> {
        let first = self.row;
        self.row += count;
        self.events.push(Event::Reserve { first, count });
        Ok(first)
    }

    fn render_group(&mut self, group: &Group<'_>, _area: &Area, row: u32) -> Result<(), RenderError> {
        self.events.push(Event::Header(HeaderEvent::of(group, row)));
        Ok(())
    }

    fn outline_rows(&mut self, first: u32, last: u32, collapsed: bool) -> Result<(), RenderError> {
        self.events.push(Event::Outline { first, last, collapsed });
        Ok(())
    }
}

/// Feeds records through a manager the way a section does: init, write the
/// record's rows, finalize.
pub struct GroupHarness<'m> {
    pub manager: GroupManager<'m>,
    pub renderer: RecordingRenderer,
    /// Every record fed, with the row it started at.
    pub fed: Vec<(u32, Record)>,
}

impl<'m> GroupHarness<'m> {
    pub fn new(levels: &'m [report_model::GroupModel]) -> Self {
        GroupHarness {
            manager: GroupManager::new(levels).expect("valid levels"),
            renderer: RecordingRenderer::default(),
            fed: Vec::new(),
        }
    }

    pub fn feed(&mut self, record: Record, height: u32) {
        self.manager
            .init_record(&record, &mut self.renderer)
            .expect("init_record");
        let row = self.renderer.row;
        self.renderer.events.push(Event::Record { row });
        self.renderer.row += height;
        self.manager.finalize_record(self.renderer.row);
        self.fed.push((row, record));
    }

    pub fn finish(&mut self) {
        self.manager
            .finalize_all_groups(&mut self.renderer)
            .expect("finalize_all_groups");
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub fn text(s: &str) -> Option<CellTemplate> {
    Some(CellTemplate::literal(s))
}

pub fn expr(e: &str) -> Option<CellTemplate> {
    Some(CellTemplate::expression(e))
}

/// Record built from (field, value) pairs.
pub fn rec(fields: &[(&str, CellValue)]) -> Record {
    fields.iter().map(|(k, v)| (*k, v.clone())).collect()
}

pub fn orders() -> Vec<Record> {
    vec![
        Record::new().with("region", "North").with("product", "apples").with("qty", 1).with("amount", 10),
        Record::new().with("region", "North").with("product", "pears").with("qty", 2).with("amount", 20),
        Record::new().with("region", "South").with("product", "plums").with("qty", 3).with("amount", 30),
    ]
}

// ============================================================================
// RENDER HARNESS
// ============================================================================

/// Renders a model into an in-memory workbook with the built-in macros.
pub struct RenderHarness {
    pub report_macros: MacroRegistry,
    pub global_macros: MacroRegistry,
    pub params: Record,
}

impl RenderHarness {
    pub fn new() -> Self {
        RenderHarness {
            report_macros: MacroRegistry::new(),
            global_macros: MacroRegistry::with_builtins(),
            params: Record::new(),
        }
    }

    pub fn with_param(mut self, name: &str, value: impl Into<CellValue>) -> Self {
        self.params.set(name, value);
        self
    }

    pub fn render(
        &self,
        model: &ReportModel,
        provider: &mut dyn DataSourceProvider,
    ) -> (Result<RenderSummary, RenderError>, OutputWorkbook) {
        let evaluator = FieldEvaluator::new();
        let renderer = ReportRenderer::new(&evaluator, &self.report_macros, &self.global_macros);
        let mut book = OutputWorkbook::new();
        let result = renderer.render(model, &self.params, provider, &mut book);
        (result, book)
    }
}

// ============================================================================
// CLOSE TRACKING
// ============================================================================

/// Source wrapper counting closes, optionally failing them.
pub struct TrackedSource {
    inner: VecDataSource,
    closes: Rc<Cell<usize>>,
    fail_close: bool,
}

impl DataSource for TrackedSource {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn has_next(&mut self) -> Result<bool, DataError> {
        self.inner.has_next()
    }

    fn next_record(&mut self) -> Result<Record, DataError> {
        self.inner.next_record()
    }

    fn close(&mut self) -> Result<(), DataError> {
        self.closes.set(self.closes.get() + 1);
        self.inner.close()?;
        if self.fail_close {
            return Err(DataError::Backend {
                source_name: self.inner.name().to_string(),
                message: "connection reset".to_string(),
            });
        }
        Ok(())
    }
}

/// Provider whose sources count closes; no read-ahead support.
pub struct TrackingProvider {
    pub inner: InMemoryProvider,
    pub closes: Rc<Cell<usize>>,
    pub fail_close: bool,
}

impl TrackingProvider {
    pub fn new(inner: InMemoryProvider) -> Self {
        TrackingProvider {
            inner,
            closes: Rc::new(Cell::new(0)),
            fail_close: false,
        }
    }

    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }
}

impl DataSourceProvider for TrackingProvider {
    fn open(&mut self, name: &str, scopes: &[Record]) -> Result<Box<dyn DataSource>, DataError> {
        let mut source = self.inner.open(name, scopes)?;
        let mut records = Vec::new();
        while source.has_next()? {
            records.push(source.next_record()?);
        }
        source.close()?;
        Ok(Box::new(TrackedSource {
            inner: VecDataSource::new(name, records),
            closes: Rc::clone(&self.closes),
            fail_close: self.fail_close,
        }))
    }
}
