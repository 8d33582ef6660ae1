//! Destinations for mapped cell values.
//!
//! [`CellSink`] is the only thing the renderer needs from a worksheet. The
//! [`XlsxSink`] writes into an `umya-spreadsheet` worksheet; [`GridSink`]
//! keeps values in memory for inspection.

use std::collections::BTreeMap;

use thiserror::Error;
use umya_spreadsheet::Worksheet;

use crate::cell::{CellRange, CellRef};

/// Largest column and row a worksheet can address.
pub const MAX_COL: u32 = 16_384;
pub const MAX_ROW: u32 = 1_048_576;

/// Why one cell write was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CellError {
  #[error("{cell} is covered by merged range {range} and is not its anchor")]
  Blocked { cell: CellRef, range: String },

  #[error("{0} lies outside the worksheet")]
  OutOfBounds(CellRef),
}

pub trait CellSink {
  fn write(&mut self, cell: CellRef, value: &str) -> Result<(), CellError>;
}

/// Refuse cells past the sheet limits or under a merged range's non-anchor
/// area.
fn check(cell: CellRef, merged: &[(CellRange, String)]) -> Result<(), CellError> {
  if cell.col == 0 || cell.row == 0 || cell.col > MAX_COL || cell.row > MAX_ROW {
    return Err(CellError::OutOfBounds(cell));
  }
  match merged.iter().find(|(r, _)| r.contains(cell) && r.anchor() != cell) {
    Some((_, range)) => Err(CellError::Blocked { cell, range: range.clone() }),
    None => Ok(()),
  }
}

// ─── In-memory grid ──────────────────────────────────────────────────────────

/// A sparse in-memory worksheet.
#[derive(Debug, Default, Clone)]
pub struct GridSink {
  cells:  BTreeMap<CellRef, String>,
  merged: Vec<(CellRange, String)>,
}

impl GridSink {
  pub fn new() -> Self { Self::default() }

  /// Declare a merged range such as `"B37:C37"`. Unparsable ranges are
  /// ignored.
  pub fn with_merged(mut self, range: &str) -> Self {
    if let Some(r) = CellRange::parse(range) {
      self.merged.push((r, range.to_string()));
    }
    self
  }

  pub fn get(&self, cell: CellRef) -> Option<&str> { self.cells.get(&cell).map(String::as_str) }

  /// Value at an A1 address; absent and unparsable addresses read as `""`.
  pub fn value(&self, address: &str) -> &str {
    CellRef::parse(address).and_then(|c| self.get(c)).unwrap_or_default()
  }

  pub fn cells(&self) -> impl Iterator<Item = (CellRef, &str)> {
    self.cells.iter().map(|(c, v)| (*c, v.as_str()))
  }
}

impl CellSink for GridSink {
  fn write(&mut self, cell: CellRef, value: &str) -> Result<(), CellError> {
    check(cell, &self.merged)?;
    self.cells.insert(cell, value.to_string());
    Ok(())
  }
}

// ─── umya-spreadsheet ────────────────────────────────────────────────────────

/// Writes string values into one worksheet of an open workbook.
pub struct XlsxSink<'a> {
  sheet:  &'a mut Worksheet,
  merged: Vec<(CellRange, String)>,
}

impl<'a> XlsxSink<'a> {
  pub fn new(sheet: &'a mut Worksheet) -> Self {
    let merged = sheet
      .get_merge_cells()
      .iter()
      .filter_map(|r| {
        let range = r.get_range();
        CellRange::parse(&range).map(|parsed| (parsed, range))
      })
      .collect();
    Self { sheet, merged }
  }
}

impl CellSink for XlsxSink<'_> {
  fn write(&mut self, cell: CellRef, value: &str) -> Result<(), CellError> {
    check(cell, &self.merged)?;
    self.sheet.get_cell_mut(cell.to_string().as_str()).set_value_string(value);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn at(s: &str) -> CellRef { CellRef::parse(s).unwrap() }

  #[test]
  fn grid_sink_stores_and_overwrites() {
    let mut grid = GridSink::new();
    grid.write(at("E5"), "山田").unwrap();
    grid.write(at("E5"), "鈴木").unwrap();
    assert_eq!(grid.value("E5"), "鈴木");
    assert_eq!(grid.value("E6"), "");
  }

  #[test]
  fn merged_anchor_accepts_and_rest_refuses() {
    let mut grid = GridSink::new().with_merged("J40:AC44");
    assert!(grid.write(at("J40"), "x").is_ok());
    assert_eq!(
      grid.write(at("K41"), "y"),
      Err(CellError::Blocked { cell: at("K41"), range: "J40:AC44".into() })
    );
    assert!(grid.write(at("AD40"), "z").is_ok());
  }

  #[test]
  fn out_of_bounds_refused() {
    let mut grid = GridSink::new();
    let far = CellRef::new(MAX_COL + 1, 1);
    assert_eq!(grid.write(far, "x"), Err(CellError::OutOfBounds(far)));
  }

  #[test]
  fn xlsx_sink_writes_text_and_respects_merges() {
    let mut book = umya_spreadsheet::new_file();
    let sheet = book.get_sheet_mut(&0).unwrap();
    sheet.add_merge_cells("B27:AR33");

    let mut sink = XlsxSink::new(sheet);
    assert!(sink.write(at("AM5"), "15").is_ok());
    assert!(sink.write(at("B27"), "PR").is_ok());
    assert!(matches!(sink.write(at("C28"), "lost"), Err(CellError::Blocked { .. })));

    let sheet = book.get_sheet(&0).unwrap();
    assert_eq!(sheet.get_value("AM5"), "15");
    assert_eq!(sheet.get_value("B27"), "PR");
    assert_eq!(sheet.get_value("C28"), "");
  }
}
