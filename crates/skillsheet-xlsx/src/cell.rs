//! A1-style cell addresses.

use std::{fmt, str::FromStr};

/// A 1-based `(column, row)` worksheet coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellRef {
  pub col: u32,
  pub row: u32,
}

impl CellRef {
  pub const fn new(col: u32, row: u32) -> Self { Self { col, row } }

  /// Parse `"AB15"`. Lowercase letters and `$` absolute markers are accepted.
  pub fn parse(s: &str) -> Option<Self> {
    let s: String = s.trim().chars().filter(|c| *c != '$').collect();
    let split = s.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = s.split_at(split);
    let col = column_index(letters)?;
    if !digits.chars().all(|c| c.is_ascii_digit()) {
      return None;
    }
    let row: u32 = digits.parse().ok()?;
    (row > 0).then_some(Self { col, row })
  }

  pub fn offset(self, rows: u32, cols: u32) -> Self {
    Self { col: self.col + cols, row: self.row + rows }
  }
}

impl fmt::Display for CellRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}{}", column_letters(self.col), self.row)
  }
}

impl FromStr for CellRef {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::parse(s).ok_or_else(|| format!("not a cell address: {s:?}"))
  }
}

/// `"A"` → 1, `"Z"` → 26, `"AA"` → 27.
pub fn column_index(letters: &str) -> Option<u32> {
  if letters.is_empty() || letters.len() > 3 {
    return None;
  }
  letters.chars().try_fold(0u32, |acc, c| {
    c.is_ascii_alphabetic()
      .then(|| acc * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1))
  })
}

/// Inverse of [`column_index`].
pub fn column_letters(mut col: u32) -> String {
  let mut out = Vec::new();
  while col > 0 {
    let rem = (col - 1) % 26;
    out.push(char::from(b'A' + rem as u8));
    col = (col - 1) / 26;
  }
  out.iter().rev().collect()
}

/// A rectangular range such as a merged region, `"B37:C40"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
  pub start: CellRef,
  pub end:   CellRef,
}

impl CellRange {
  /// Parse `"A1:C3"`; a single address yields a one-cell range.
  pub fn parse(s: &str) -> Option<Self> {
    let (a, b) = match s.split_once(':') {
      Some((a, b)) => (CellRef::parse(a)?, CellRef::parse(b)?),
      None => {
        let c = CellRef::parse(s)?;
        (c, c)
      }
    };
    Some(Self {
      start: CellRef::new(a.col.min(b.col), a.row.min(b.row)),
      end:   CellRef::new(a.col.max(b.col), a.row.max(b.row)),
    })
  }

  pub fn contains(&self, cell: CellRef) -> bool {
    (self.start.col..=self.end.col).contains(&cell.col)
      && (self.start.row..=self.end.row).contains(&cell.row)
  }

  /// The top-left cell, the only one of a merged region that holds a value.
  pub fn anchor(&self) -> CellRef { self.start }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_and_prints_addresses() {
    let c = CellRef::parse("AB15").unwrap();
    assert_eq!(c, CellRef::new(28, 15));
    assert_eq!(c.to_string(), "AB15");
    assert_eq!(CellRef::parse("$e$5"), Some(CellRef::new(5, 5)));
    assert_eq!(CellRef::parse("AV1").unwrap().to_string(), "AV1");
  }

  #[test]
  fn rejects_malformed_addresses() {
    for bad in ["", "15", "A", "A0", "A1B", "1A", "ABCD1"] {
      assert_eq!(CellRef::parse(bad), None, "{bad}");
    }
  }

  #[test]
  fn column_letters_round_trip_at_boundaries() {
    for (col, letters) in [(1, "A"), (26, "Z"), (27, "AA"), (52, "AZ"), (53, "BA"), (702, "ZZ"), (703, "AAA")] {
      assert_eq!(column_letters(col), letters);
      assert_eq!(column_index(letters), Some(col));
    }
  }

  #[test]
  fn offset_moves_down_and_right() {
    let j = CellRef::parse("J37").unwrap();
    assert_eq!(j.offset(3, 0).to_string(), "J40");
    assert_eq!(j.offset(1, 2).to_string(), "L38");
  }

  #[test]
  fn range_contains_and_anchor() {
    let r = CellRange::parse("C3:B2").unwrap();
    assert_eq!(r.anchor().to_string(), "B2");
    assert!(r.contains(CellRef::parse("C2").unwrap()));
    assert!(!r.contains(CellRef::parse("D3").unwrap()));
    assert_eq!(CellRange::parse("E5").unwrap().start, CellRef::new(5, 5));
  }
}
