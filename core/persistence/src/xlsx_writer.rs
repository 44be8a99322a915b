//! FILENAME: core/persistence/src/xlsx_writer.rs
//! PURPOSE: Saves a rendered `OutputWorkbook` as an xlsx file.
//! CONTEXT: Style indices in the grid resolve against the report's
//! `StyleRegistry`. Merged regions are written first with `merge_range` and
//! their anchor cell is then overwritten with the real content; cells covered
//! by a merge are not written.

use std::collections::HashSet;
use std::path::Path;

use report_engine::{log_debug, log_info};
use report_model::{CellStyle, CellValue, Color, Grid, OutputCell, OutputWorkbook, StyleRegistry, TextAlign, VerticalAlign};
use rust_xlsxwriter::{Format, FormatAlign, FormatUnderline, Workbook as XlsxWorkbook, Worksheet};

use crate::{PersistenceError, PERSIST};

pub fn save_xlsx(book: &OutputWorkbook, styles: &StyleRegistry, path: &Path) -> Result<(), PersistenceError> {
    let mut xlsx = build_workbook(book, styles)?;
    xlsx.save(path)?;
    log_info!(PERSIST, "saved {} sheets to {}", book.sheets.len(), path.display());
    Ok(())
}

/// Same as `save_xlsx`, returning the file bytes.
pub fn save_xlsx_to_buffer(book: &OutputWorkbook, styles: &StyleRegistry) -> Result<Vec<u8>, PersistenceError> {
    let mut xlsx = build_workbook(book, styles)?;
    Ok(xlsx.save_to_buffer()?)
}

fn build_workbook(book: &OutputWorkbook, styles: &StyleRegistry) -> Result<XlsxWorkbook, PersistenceError> {
    // Index 0 and default-equal styles write without a format.
    let formats: Vec<Option<Format>> = styles
        .all_styles()
        .iter()
        .enumerate()
        .map(|(index, style)| (index > 0 && !style.is_default()).then(|| convert_style_to_format(style)))
        .collect();

    let mut xlsx = XlsxWorkbook::new();
    for sheet in &book.sheets {
        let worksheet = xlsx.add_worksheet();
        worksheet.set_name(&sheet.name)?;
        write_grid(worksheet, &sheet.grid, &formats)?;
        log_debug!(PERSIST, "sheet '{}': {} cells, {} merges", sheet.name, sheet.grid.cells.len(), sheet.grid.merged.len());
    }
    Ok(xlsx)
}

fn write_grid(worksheet: &mut Worksheet, grid: &Grid, formats: &[Option<Format>]) -> Result<(), PersistenceError> {
    // Row heights are in points, as xlsx expects
    for (&row, &height) in &grid.row_heights {
        worksheet.set_row_height(row, height)?;
    }

    let mut covered = HashSet::new();
    for region in &grid.merged {
        let anchor = (region.first_row, region.first_col);
        if anchor == (region.last_row, region.last_col) {
            continue;
        }
        let format = grid
            .get_cell(region.first_row, region.first_col)
            .and_then(|cell| format_for(formats, cell.style_index))
            .cloned()
            .unwrap_or_else(Format::new);
        worksheet.merge_range(
            region.first_row,
            xlsx_col(region.first_col)?,
            region.last_row,
            xlsx_col(region.last_col)?,
            "",
            &format,
        )?;
        for row in region.first_row..=region.last_row {
            for col in region.first_col..=region.last_col {
                if (row, col) != anchor {
                    covered.insert((row, col));
                }
            }
        }
    }

    let mut cells: Vec<(&(u32, u32), &OutputCell)> = grid.cells.iter().collect();
    cells.sort_unstable_by_key(|(pos, _)| **pos);
    for (&(row, col), cell) in cells {
        if covered.contains(&(row, col)) {
            continue;
        }
        write_cell(worksheet, row, xlsx_col(col)?, cell, format_for(formats, cell.style_index))?;
    }

    for group in &grid.row_groups {
        if group.collapsed {
            worksheet.group_rows_collapsed(group.first_row, group.last_row)?;
        } else {
            worksheet.group_rows(group.first_row, group.last_row)?;
        }
    }

    for &row in &grid.hidden_rows {
        worksheet.set_row_hidden(row)?;
    }
    Ok(())
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &OutputCell,
    format: Option<&Format>,
) -> Result<(), PersistenceError> {
    if let Some(formula) = &cell.formula {
        let formula = formula.strip_prefix('=').unwrap_or(formula);
        match format {
            Some(fmt) => worksheet.write_formula_with_format(row, col, formula, fmt)?,
            None => worksheet.write_formula(row, col, formula)?,
        };
        return Ok(());
    }

    match (&cell.value, format) {
        (CellValue::Empty, Some(fmt)) => {
            worksheet.write_blank(row, col, fmt)?;
        }
        (CellValue::Empty, None) => {}
        (CellValue::Number(n), Some(fmt)) => {
            worksheet.write_number_with_format(row, col, *n, fmt)?;
        }
        (CellValue::Number(n), None) => {
            worksheet.write_number(row, col, *n)?;
        }
        (CellValue::Text(s), Some(fmt)) => {
            worksheet.write_string_with_format(row, col, s, fmt)?;
        }
        (CellValue::Text(s), None) => {
            worksheet.write_string(row, col, s)?;
        }
        (CellValue::Boolean(b), Some(fmt)) => {
            worksheet.write_boolean_with_format(row, col, *b, fmt)?;
        }
        (CellValue::Boolean(b), None) => {
            worksheet.write_boolean(row, col, *b)?;
        }
        (error @ CellValue::Error(_), Some(fmt)) => {
            worksheet.write_string_with_format(row, col, error.display_value(), fmt)?;
        }
        (error @ CellValue::Error(_), None) => {
            worksheet.write_string(row, col, error.display_value())?;
        }
    }
    Ok(())
}

fn format_for(formats: &[Option<Format>], style_index: usize) -> Option<&Format> {
    formats.get(style_index).and_then(Option::as_ref)
}

fn xlsx_col(col: u32) -> Result<u16, PersistenceError> {
    u16::try_from(col).map_err(|_| PersistenceError::InvalidFormat(format!("column {} is beyond the xlsx range", col)))
}

fn convert_style_to_format(style: &CellStyle) -> Format {
    let mut format = Format::new();

    // Font settings
    if style.font.bold {
        format = format.set_bold();
    }
    if style.font.italic {
        format = format.set_italic();
    }
    if style.font.underline {
        format = format.set_underline(FormatUnderline::Single);
    }
    format = format.set_font_size(style.font.size);
    format = format.set_font_name(&style.font.family);

    // Colors
    if style.font.color != Color::black() {
        format = format.set_font_color(color_to_xlsx(style.font.color));
    }
    if let Some(background) = style.background {
        format = format.set_background_color(color_to_xlsx(background));
    }

    // Horizontal alignment
    match style.text_align {
        TextAlign::General => {}
        TextAlign::Left => format = format.set_align(FormatAlign::Left),
        TextAlign::Center => format = format.set_align(FormatAlign::Center),
        TextAlign::Right => format = format.set_align(FormatAlign::Right),
    }

    // Vertical alignment
    format = format.set_align(match style.vertical_align {
        VerticalAlign::Top => FormatAlign::Top,
        VerticalAlign::Middle => FormatAlign::VerticalCenter,
        VerticalAlign::Bottom => FormatAlign::Bottom,
    });

    if style.wrap_text {
        format = format.set_text_wrap();
    }

    if let Some(num_format) = &style.number_format {
        format = format.set_num_format(num_format);
    }

    format
}

fn color_to_xlsx(color: Color) -> rust_xlsxwriter::Color {
    rust_xlsxwriter::Color::RGB(color.to_rgb())
}
