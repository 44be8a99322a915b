//! FILENAME: core/persistence/src/xlsx_reader.rs
//! PURPOSE: Reading xlsx files back: report data sources and rendered output.
//! CONTEXT: `XlsxProvider` serves one data source per worksheet. The first
//! row of the sheet holds the field names; every following row is a record.
//! Detail sources can be linked to a master field like the in-memory provider.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use report_engine::{log_debug, DataError, DataSource, DataSourceProvider, DetailLink};
use report_model::{CellValue, Grid, OutputCell, OutputSheet, OutputWorkbook, Record};

use crate::{PersistenceError, PERSIST};

fn convert_data(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Boolean(*b),
        Data::Error(e) => CellValue::Error(format!("{:?}", e)),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) => CellValue::Text(s.clone()),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

// ============================================================================
// DATA SOURCES
// ============================================================================

/// Opens worksheets of one xlsx file as record streams.
pub struct XlsxProvider {
    workbook: Xlsx<BufReader<File>>,
    links: HashMap<String, DetailLink>,
}

impl XlsxProvider {
    pub fn from_path(path: &Path) -> Result<Self, PersistenceError> {
        let workbook: Xlsx<_> = open_workbook(path)?;
        if workbook.sheet_names().is_empty() {
            return Err(PersistenceError::InvalidFormat("Workbook contains no sheets".to_string()));
        }
        Ok(XlsxProvider {
            workbook,
            links: HashMap::new(),
        })
    }

    /// Serves only the rows of `sheet` whose `child_field` matches the
    /// enclosing `parent_field`.
    pub fn with_link(
        mut self,
        sheet: impl Into<String>,
        parent_field: impl Into<String>,
        child_field: impl Into<String>,
    ) -> Self {
        self.links.insert(sheet.into(), DetailLink::new(parent_field, child_field));
        self
    }

    fn read_sheet(&mut self, name: &str) -> Result<Range<Data>, PersistenceError> {
        if !self.workbook.sheet_names().iter().any(|s| s == name) {
            return Err(PersistenceError::SheetNotFound(name.to_string()));
        }
        Ok(self.workbook.worksheet_range(name)?)
    }
}

impl DataSourceProvider for XlsxProvider {
    fn open(&mut self, name: &str, scopes: &[Record]) -> Result<Box<dyn DataSource>, DataError> {
        let range = self.read_sheet(name)?;
        let mut source = SheetDataSource::new(name, range);
        if let Some(link) = self.links.get(name) {
            let key = link.key(scopes)?.clone();
            source.filter = Some((link.clone(), key));
        }
        log_debug!(PERSIST, "opened sheet '{}' with fields {:?}", name, source.fields);
        Ok(Box::new(source))
    }
}

/// Records of one worksheet, converted row by row as they are pulled.
pub struct SheetDataSource {
    name: String,
    fields: Vec<String>,
    rows: Range<Data>,
    /// Next data row, relative to the range (row 0 is the header).
    cursor: usize,
    filter: Option<(DetailLink, CellValue)>,
    peeked: Option<Record>,
}

impl SheetDataSource {
    pub fn new(name: impl Into<String>, rows: Range<Data>) -> Self {
        let fields = rows
            .rows()
            .next()
            .map(|header| header.iter().map(|cell| convert_data(cell).display_value()).collect())
            .unwrap_or_default();
        SheetDataSource {
            name: name.into(),
            fields,
            rows,
            cursor: 1,
            filter: None,
            peeked: None,
        }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Converts rows until one passes the link filter.
    fn pull(&mut self) -> Option<Record> {
        while self.cursor < self.rows.height() {
            let row = self.cursor;
            self.cursor += 1;
            let record: Record = self
                .fields
                .iter()
                .enumerate()
                .filter(|(_, field)| !field.is_empty())
                .map(|(col, field)| {
                    let value = self.rows.get((row, col)).map(convert_data).unwrap_or_default();
                    (field.as_str(), value)
                })
                .collect();
            match &self.filter {
                Some((link, key)) if !link.accepts(&record, key) => continue,
                _ => return Some(record),
            }
        }
        None
    }
}

impl DataSource for SheetDataSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_next(&mut self) -> Result<bool, DataError> {
        if self.peeked.is_none() {
            self.peeked = self.pull();
        }
        Ok(self.peeked.is_some())
    }

    fn next_record(&mut self) -> Result<Record, DataError> {
        match self.peeked.take() {
            Some(record) => Ok(record),
            None => self.pull().ok_or_else(|| DataError::Exhausted(self.name.clone())),
        }
    }

    fn read_ahead(&mut self) -> Result<Option<&Record>, DataError> {
        if self.peeked.is_none() {
            self.peeked = self.pull();
        }
        Ok(self.peeked.as_ref())
    }

    fn close(&mut self) -> Result<(), DataError> {
        self.peeked = None;
        self.cursor = self.rows.height();
        Ok(())
    }
}

// ============================================================================
// RENDERED OUTPUT
// ============================================================================

/// Loads cell values and formulas of every sheet. Styles, merges and
/// outlines are not read back.
pub fn load_xlsx(path: &Path) -> Result<OutputWorkbook, PersistenceError> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let sheet_names = workbook.sheet_names().to_vec();

    if sheet_names.is_empty() {
        return Err(PersistenceError::InvalidFormat("Workbook contains no sheets".to_string()));
    }

    let mut book = OutputWorkbook::new();
    for sheet_name in &sheet_names {
        let range = workbook.worksheet_range(sheet_name)?;
        let mut grid = Grid::new();

        let (start_row, start_col) = range.start().unwrap_or((0, 0));
        for (row, col, data) in range.cells() {
            if matches!(data, Data::Empty) {
                continue;
            }
            let (row, col) = (start_row + row as u32, start_col + col as u32);
            grid.set_cell(row, col, OutputCell::new(convert_data(data)));
        }

        let formulas = workbook.worksheet_formula(sheet_name)?;
        let (start_row, start_col) = formulas.start().unwrap_or((0, 0));
        for (row, col, formula) in formulas.cells() {
            if formula.is_empty() {
                continue;
            }
            let (row, col) = (start_row + row as u32, start_col + col as u32);
            grid.cell_mut(row, col).formula = Some(formula.clone());
        }

        book.sheets.push(OutputSheet {
            name: sheet_name.clone(),
            grid,
        });
    }

    Ok(book)
}
