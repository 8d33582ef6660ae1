//! ETags for exported documents.
//!
//! The tag hashes the sheet content and the export layout rather than the
//! workbook bytes, so it is known before rendering and stable across
//! renders of unchanged data.

use sha2::{Digest, Sha256};
use skillsheet_core::sheet::SkillSheet;
use skillsheet_xlsx::ExportLayout;

/// Quoted SHA-256 ETag for exporting `sheet` with `layout`.
pub fn export_etag(sheet: &SkillSheet, layout: &ExportLayout) -> Result<String, serde_json::Error> {
  let mut hasher = Sha256::new();
  hasher.update(serde_json::to_vec(sheet)?);
  hasher.update(format!("{layout:?}").as_bytes());
  Ok(format!("\"{}\"", hex::encode(hasher.finalize())))
}

/// Whether an `If-None-Match` value matches `etag`, including `*` and
/// comma-separated lists.
pub fn matches(if_none_match: &str, etag: &str) -> bool {
  if_none_match
    .split(',')
    .map(|t| t.trim().trim_start_matches("W/"))
    .any(|t| t == "*" || t == etag)
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;
  use skillsheet_core::person::{Gender, Person, PersonFields};

  use super::*;

  fn sheet(name: &str) -> SkillSheet {
    SkillSheet {
      person:   Person {
        id:         1,
        fields:     PersonFields {
          name:            name.into(),
          name_kana:       "カナ".into(),
          gender:          Gender::Female,
          birth_date:      NaiveDate::from_ymd_opt(1995, 1, 2).unwrap(),
          transportation:  String::new(),
          nearest_station: String::new(),
          access_method:   String::new(),
          access_time:     String::new(),
          final_education: String::new(),
          graduation_date: String::new(),
          self_pr:         String::new(),
          qualifications:  vec![],
        },
        created_at: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap(),
        owner:      None,
      },
      skills:   vec![],
      projects: vec![],
    }
  }

  #[test]
  fn stable_for_same_content() {
    let layout = ExportLayout::enhanced();
    assert_eq!(export_etag(&sheet("a"), &layout).unwrap(), export_etag(&sheet("a"), &layout).unwrap());
  }

  #[test]
  fn changes_with_content_and_layout() {
    let enhanced = ExportLayout::enhanced();
    let a = export_etag(&sheet("a"), &enhanced).unwrap();
    assert_ne!(a, export_etag(&sheet("b"), &enhanced).unwrap());
    assert_ne!(a, export_etag(&sheet("a"), &ExportLayout::legacy()).unwrap());
  }

  #[test]
  fn if_none_match_forms() {
    let tag = "\"abc\"";
    assert!(matches("\"abc\"", tag));
    assert!(matches("\"x\", W/\"abc\"", tag));
    assert!(matches("*", tag));
    assert!(!matches("\"abd\"", tag));
  }
}
