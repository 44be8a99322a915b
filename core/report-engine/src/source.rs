//! FILENAME: core/report-engine/src/source.rs
//! PURPOSE: Data sources feeding records into sections.
//! CONTEXT: A section pulls records one at a time through `DataSource`.
//! Sources are opened by name through a `DataSourceProvider`, which sees the
//! scope chain so detail sources can filter on their master record.
//! Every opened source is closed through `with_source`, on all exit paths.

use std::collections::VecDeque;

use report_model::{CellValue, Record};
use rustc_hash::FxHashMap;

use crate::error::{DataError, RenderError};
use crate::logging::{log_debug, log_warn, SOURCE};

/// A forward-only stream of records.
pub trait DataSource {
    fn name(&self) -> &str;

    fn has_next(&mut self) -> Result<bool, DataError>;

    fn next_record(&mut self) -> Result<Record, DataError>;

    /// Peeks at the record `next_record` would return, without consuming it.
    fn read_ahead(&mut self) -> Result<Option<&Record>, DataError> {
        Err(DataError::ReadAheadUnsupported(self.name().to_string()))
    }

    fn close(&mut self) -> Result<(), DataError>;
}

/// Opens data sources by name. `scopes` holds the enclosing records,
/// outermost first (render parameters, then composite master records).
pub trait DataSourceProvider {
    fn open(&mut self, name: &str, scopes: &[Record]) -> Result<Box<dyn DataSource>, DataError>;
}

// ============================================================================
// IN-MEMORY SOURCE
// ============================================================================

#[derive(Debug, Clone)]
pub struct VecDataSource {
    name: String,
    records: VecDeque<Record>,
}

impl VecDataSource {
    pub fn new(name: impl Into<String>, records: Vec<Record>) -> Self {
        VecDataSource {
            name: name.into(),
            records: records.into(),
        }
    }
}

impl DataSource for VecDataSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_next(&mut self) -> Result<bool, DataError> {
        Ok(!self.records.is_empty())
    }

    fn next_record(&mut self) -> Result<Record, DataError> {
        self.records
            .pop_front()
            .ok_or_else(|| DataError::Exhausted(self.name.clone()))
    }

    fn read_ahead(&mut self) -> Result<Option<&Record>, DataError> {
        Ok(self.records.front())
    }

    fn close(&mut self) -> Result<(), DataError> {
        self.records.clear();
        Ok(())
    }
}

// ============================================================================
// IN-MEMORY PROVIDER
// ============================================================================

/// Links a detail dataset to its master: only rows whose `child_field`
/// equals the nearest enclosing `parent_field` are served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailLink {
    pub parent_field: String,
    pub child_field: String,
}

impl DetailLink {
    pub fn new(parent_field: impl Into<String>, child_field: impl Into<String>) -> Self {
        DetailLink {
            parent_field: parent_field.into(),
            child_field: child_field.into(),
        }
    }

    /// The master key, read from the nearest scope that has it.
    pub fn key<'s>(&self, scopes: &'s [Record]) -> Result<&'s CellValue, DataError> {
        lookup_scoped(scopes, &self.parent_field).ok_or_else(|| DataError::UnknownField(self.parent_field.clone()))
    }

    pub fn accepts(&self, record: &Record, key: &CellValue) -> bool {
        record.get(&self.child_field) == Some(key)
    }
}

/// Static named datasets, optionally linked master-detail.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    datasets: FxHashMap<String, Vec<Record>>,
    links: FxHashMap<String, DetailLink>,
    /// Names in open order, for inspection.
    opened: Vec<String>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        InMemoryProvider::default()
    }

    pub fn with_dataset(mut self, name: impl Into<String>, records: Vec<Record>) -> Self {
        self.datasets.insert(name.into(), records);
        self
    }

    pub fn with_link(
        mut self,
        name: impl Into<String>,
        parent_field: impl Into<String>,
        child_field: impl Into<String>,
    ) -> Self {
        self.links.insert(name.into(), DetailLink::new(parent_field, child_field));
        self
    }

    pub fn opened(&self) -> &[String] {
        &self.opened
    }
}

impl DataSourceProvider for InMemoryProvider {
    fn open(&mut self, name: &str, scopes: &[Record]) -> Result<Box<dyn DataSource>, DataError> {
        let records = self
            .datasets
            .get(name)
            .ok_or_else(|| DataError::UnknownSource(name.to_string()))?;

        let records = match self.links.get(name) {
            None => records.clone(),
            Some(link) => {
                let key = link.key(scopes)?;
                records.iter().filter(|r| link.accepts(r, key)).cloned().collect()
            }
        };

        log_debug!(SOURCE, "opened '{}' with {} records", name, records.len());
        self.opened.push(name.to_string());
        Ok(Box::new(VecDataSource::new(name, records)))
    }
}

/// Looks a field up through the scope chain, innermost first.
pub fn lookup_scoped<'a>(scopes: &'a [Record], field: &str) -> Option<&'a CellValue> {
    scopes.iter().rev().find_map(|scope| scope.get(field))
}

// ============================================================================
// SCOPED USE
// ============================================================================

/// Closes the source on drop unless `closed` is set, so a panic in the
/// section body still releases it.
struct OpenSource {
    source: Box<dyn DataSource>,
    closed: bool,
}

impl OpenSource {
    fn close(&mut self) -> Result<(), DataError> {
        self.closed = true;
        self.source.close()
    }
}

impl Drop for OpenSource {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(err) = self.source.close() {
                log_warn!(SOURCE, "closing '{}' while unwinding failed: {}", self.source.name(), err);
            }
        }
    }
}

/// Runs `body` over `source` and closes it afterwards, whatever the outcome,
/// including a panic in `body`. A close failure is logged; it is returned only
/// when `body` succeeded.
pub fn with_source<T>(
    source: Box<dyn DataSource>,
    body: impl FnOnce(&mut dyn DataSource) -> Result<T, RenderError>,
) -> Result<T, RenderError> {
    let mut open = OpenSource { source, closed: false };
    let result = body(open.source.as_mut());
    let closed = open.close();
    let name = open.source.name();

    match (result, closed) {
        (Ok(value), Ok(())) => {
            log_debug!(SOURCE, "closed '{}'", name);
            Ok(value)
        }
        (Ok(_), Err(close_err)) => {
            log_warn!(SOURCE, "closing '{}' failed: {}", name, close_err);
            Err(close_err.into())
        }
        (Err(err), Err(close_err)) => {
            log_warn!(SOURCE, "closing '{}' failed after an earlier error: {}", name, close_err);
            Err(err)
        }
        (Err(err), Ok(())) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(id: i64, customer: &str) -> Record {
        Record::new().with("order_id", id).with("customer", customer)
    }

    #[test]
    fn test_vec_source_read_ahead_does_not_consume() {
        let mut source = VecDataSource::new("orders", vec![order(1, "a"), order(2, "b")]);
        assert_eq!(
            source.read_ahead().unwrap().and_then(|r| r.get("order_id")).cloned(),
            Some(CellValue::Number(1.0))
        );
        assert_eq!(source.next_record().unwrap().get("order_id"), Some(&CellValue::Number(1.0)));
        source.next_record().unwrap();
        assert!(!source.has_next().unwrap());
        assert!(source.read_ahead().unwrap().is_none());
        assert_eq!(source.next_record(), Err(DataError::Exhausted("orders".to_string())));
    }

    #[test]
    fn test_provider_filters_detail_rows() {
        let lines = vec![
            Record::new().with("order_id", 1).with("sku", "x"),
            Record::new().with("order_id", 2).with("sku", "y"),
            Record::new().with("order_id", 1).with("sku", "z"),
        ];
        let mut provider = InMemoryProvider::new()
            .with_dataset("lines", lines)
            .with_link("lines", "order_id", "order_id");

        let scopes = vec![Record::new(), order(1, "a")];
        let mut source = provider.open("lines", &scopes).unwrap();
        let mut skus = Vec::new();
        while source.has_next().unwrap() {
            skus.push(source.next_record().unwrap().get("sku").cloned());
        }
        assert_eq!(skus, vec![Some(CellValue::from("x")), Some(CellValue::from("z"))]);
        assert_eq!(provider.opened(), &["lines".to_string()]);
    }

    #[test]
    fn test_provider_errors() {
        let mut provider = InMemoryProvider::new()
            .with_dataset("lines", Vec::new())
            .with_link("lines", "order_id", "order_id");
        assert!(matches!(provider.open("nope", &[]), Err(DataError::UnknownSource(_))));
        assert!(matches!(provider.open("lines", &[]), Err(DataError::UnknownField(_))));
    }

    struct BrokenClose;

    impl DataSource for BrokenClose {
        fn name(&self) -> &str {
            "broken"
        }
        fn has_next(&mut self) -> Result<bool, DataError> {
            Ok(false)
        }
        fn next_record(&mut self) -> Result<Record, DataError> {
            Err(DataError::Exhausted("broken".to_string()))
        }
        fn close(&mut self) -> Result<(), DataError> {
            Err(DataError::Backend {
                source_name: "broken".to_string(),
                message: "close".to_string(),
            })
        }
    }

    #[test]
    fn test_close_error_never_masks_primary_error() {
        let primary = with_source::<()>(Box::new(BrokenClose), |_| {
            Err(DataError::UnknownField("amount".to_string()).into())
        });
        assert_eq!(
            primary,
            Err(RenderError::Data(DataError::UnknownField("amount".to_string())))
        );

        let close_only = with_source(Box::new(BrokenClose), |_| Ok(3));
        assert!(matches!(close_only, Err(RenderError::Data(DataError::Backend { .. }))));
    }

    #[test]
    fn test_source_is_closed_when_body_panics() {
        use std::cell::Cell;
        use std::panic::{catch_unwind, AssertUnwindSafe};
        use std::rc::Rc;

        struct Counted(Rc<Cell<usize>>);

        impl DataSource for Counted {
            fn name(&self) -> &str {
                "counted"
            }
            fn has_next(&mut self) -> Result<bool, DataError> {
                Ok(false)
            }
            fn next_record(&mut self) -> Result<Record, DataError> {
                Err(DataError::Exhausted("counted".to_string()))
            }
            fn close(&mut self) -> Result<(), DataError> {
                self.0.set(self.0.get() + 1);
                Ok(())
            }
        }

        let closes = Rc::new(Cell::new(0));
        let source = Box::new(Counted(Rc::clone(&closes)));
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            with_source::<()>(source, |_| panic!("body failed"))
        }));
        assert!(outcome.is_err());
        assert_eq!(closes.get(), 1);

        with_source(Box::new(Counted(Rc::clone(&closes))), |_| Ok(())).unwrap();
        assert_eq!(closes.get(), 2);
    }

    #[test]
    fn test_read_ahead_default_is_unsupported() {
        let mut source = BrokenClose;
        assert_eq!(
            source.read_ahead().err(),
            Some(DataError::ReadAheadUnsupported("broken".to_string()))
        );
    }
}
