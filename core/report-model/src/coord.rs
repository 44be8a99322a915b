//! FILENAME: core/report-model/src/coord.rs
//! PURPOSE: Column letters and A1 references for generated formulas.
//! CONTEXT: Output rows/columns are 0-based everywhere in the renderer. Formulas
//! written into the sheet need A1 text, so this module converts in one place.

/// A cell coordinate as (row, col) with 0-based indices.
pub type CellCoord = (u32, u32);

/// Number of rows in a worksheet (Excel 2007+ limit).
pub const MAX_SHEET_ROWS: u32 = 1_048_576;

/// Number of columns in a worksheet (Excel 2007+ limit, "XFD").
pub const MAX_SHEET_COLS: u32 = 16_384;

/// Converts a 0-based column index to its letters.
/// 0 -> "A", 25 -> "Z", 26 -> "AA", 701 -> "ZZ".
pub fn index_to_col(col_index: u32) -> String {
    let mut letters = Vec::new();
    let mut n = col_index as u64 + 1;
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        letters.push(b'A' + rem);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Converts column letters to a 0-based index.
/// Returns None for an empty string or any non-letter character.
pub fn col_to_index(col_str: &str) -> Option<u32> {
    if col_str.is_empty() {
        return None;
    }
    let mut result: u32 = 0;
    for c in col_str.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let digit = (c.to_ascii_uppercase() as u32) - ('A' as u32) + 1;
        result = result.checked_mul(26)?.checked_add(digit)?;
    }
    Some(result - 1)
}

/// (row, col) -> "B3".
pub fn coord_to_a1(coord: CellCoord) -> String {
    let (row, col) = coord;
    format!("{}{}", index_to_col(col), row + 1)
}

/// Inclusive range text. A single-cell range collapses to one reference.
pub fn range_to_a1(first: CellCoord, last: CellCoord) -> String {
    if first == last {
        coord_to_a1(first)
    } else {
        format!("{}:{}", coord_to_a1(first), coord_to_a1(last))
    }
}
