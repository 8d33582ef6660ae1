//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Writes always use one canonical form: JSON arrays for phases, tags and
//! qualifications, a decimal for experience, ISO dates. Reads are lenient
//! because older rows hold Python literals or comma/newline separated text.

use chrono::NaiveDateTime;
use rusqlite::Row;

use skillsheet_core::{
  PersonId, ProjectId,
  person::{Gender, Person, PersonFields, SheetSummary, birth_date},
  project::{EnvironmentTags, Industry, NewProject, PhaseFlags, Project, ProjectRole},
  skill::{Experience, normalize_tag},
};

use crate::{Error, Result};

// ─── Phases ──────────────────────────────────────────────────────────────────

pub fn encode_phases(flags: &PhaseFlags) -> String {
  let labels: Vec<&str> = flags.checked().map(|p| p.label()).collect();
  serde_json::Value::from(labels).to_string()
}

/// Accepts a JSON array of labels, a JSON object of label → flag, a Python
/// dict or list literal, or comma/newline separated labels.
pub fn decode_phases(raw: &str) -> PhaseFlags {
  let raw = raw.trim();
  if raw.is_empty() {
    return PhaseFlags::default();
  }
  if let Ok(value) = serde_json::from_str::<serde_json::Value>(raw) {
    match value {
      serde_json::Value::Array(items) => {
        return PhaseFlags::from_labels(items.iter().filter_map(|v| v.as_str()));
      }
      serde_json::Value::Object(map) => {
        return PhaseFlags::from_labels(
          map.iter().filter(|(_, v)| truthy_json(v)).map(|(k, _)| k.as_str()),
        );
      }
      _ => {}
    }
  }

  let labels = split_list(raw.trim_matches(['{', '}'])).filter_map(|item| {
    match item.split_once(':') {
      Some((label, flag)) => truthy_literal(flag).then(|| normalize_tag(label)),
      None => Some(normalize_tag(item)),
    }
  });
  PhaseFlags::from_labels(labels.collect::<Vec<_>>())
}

fn truthy_json(v: &serde_json::Value) -> bool {
  match v {
    serde_json::Value::Bool(b) => *b,
    serde_json::Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
    serde_json::Value::String(s) => truthy_literal(s),
    _ => false,
  }
}

fn truthy_literal(s: &str) -> bool {
  matches!(s.trim().trim_matches(['\'', '"']), "True" | "true" | "1")
}

// ─── Environment tags ────────────────────────────────────────────────────────

pub fn encode_tags(tags: &[String]) -> String {
  serde_json::Value::from(tags.to_vec()).to_string()
}

/// Accepts a JSON array, a Python list literal or comma/newline separated
/// text. Every tag is normalized and placeholders are dropped.
pub fn decode_tags(raw: &str) -> Vec<String> {
  let raw = raw.trim();
  if raw.is_empty() {
    return Vec::new();
  }
  let items: Vec<String> = match serde_json::from_str::<Vec<String>>(raw) {
    Ok(items) => items,
    Err(_) => split_list(raw).map(str::to_string).collect(),
  };
  items
    .iter()
    .map(|t| normalize_tag(t))
    .filter(|t| !t.is_empty())
    .collect()
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
  raw.split([',', '\n']).map(str::trim).filter(|s| !s.is_empty())
}

// ─── Experience ──────────────────────────────────────────────────────────────

pub fn encode_experience(e: Experience) -> String { e.years().to_string() }

pub fn decode_experience(raw: &str) -> Experience { Experience::parse(raw) }

// ─── Qualifications ──────────────────────────────────────────────────────────

pub fn encode_qualifications(items: &[String]) -> String {
  let items: Vec<&str> = items.iter().map(|q| q.trim()).filter(|q| !q.is_empty()).collect();
  serde_json::Value::from(items).to_string()
}

/// Accepts a JSON array or comma/newline separated text. Only the array form
/// keeps commas inside an entry.
pub fn decode_qualifications(raw: &str) -> Vec<String> {
  match serde_json::from_str::<Vec<String>>(raw.trim()) {
    Ok(items) => items
      .into_iter()
      .map(|q| q.trim().to_string())
      .filter(|q| !q.is_empty())
      .collect(),
    Err(_) => split_list(raw).map(str::to_string).collect(),
  }
}

// ─── Dates ───────────────────────────────────────────────────────────────────

pub fn encode_birth_date(date: chrono::NaiveDate) -> String {
  date.format("%Y-%m-%d").to_string()
}

/// `CURRENT_TIMESTAMP` yields `YYYY-MM-DD HH:MM:SS`; RFC 3339 is accepted
/// too.
pub fn decode_timestamp(s: &str) -> Result<NaiveDateTime> {
  let s = s.trim();
  NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
    .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
    .or_else(|_| chrono::DateTime::parse_from_rfc3339(s).map(|dt| dt.naive_utc()))
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Raw rows ────────────────────────────────────────────────────────────────

/// A person row as read from `user_info` or `basic_info`, before decoding.
#[derive(Debug)]
pub struct RawPerson {
  pub id:              PersonId,
  pub name:            String,
  pub name_kana:       String,
  pub transportation:  String,
  pub nearest_station: String,
  pub access_method:   String,
  pub access_time:     String,
  pub gender:          String,
  pub birth_date:      String,
  pub final_education: String,
  pub graduation_date: String,
  pub self_pr:         String,
  pub qualifications:  Vec<String>,
  pub created_at:      String,
  pub owner:           Option<i64>,
}

impl RawPerson {
  /// Reads the columns shared by both person tables. `qualifications` and
  /// `owner` are filled in by the layout.
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:              row.get("id")?,
      name:            text(row, "name")?,
      name_kana:       text(row, "name_kana")?,
      transportation:  text(row, "transportation")?,
      nearest_station: text(row, "nearest_station")?,
      access_method:   text(row, "access_method")?,
      access_time:     text(row, "access_time")?,
      gender:          text(row, "gender")?,
      birth_date:      text(row, "birth_date")?,
      final_education: text(row, "final_education")?,
      graduation_date: text(row, "graduation_date")?,
      self_pr:         text(row, "self_pr")?,
      qualifications:  Vec::new(),
      created_at:      text(row, "created_at")?,
      owner:           None,
    })
  }

  pub fn into_person(self) -> Result<Person> {
    let gender = Gender::parse(&self.gender)
      .ok_or(Error::Decode { column: "gender", value: self.gender.clone() })?;
    let birth_date = birth_date::parse(&self.birth_date)
      .ok_or_else(|| Error::DateParse(format!("birth_date {:?}", self.birth_date)))?;
    Ok(Person {
      id:         self.id,
      fields:     PersonFields {
        name: self.name,
        name_kana: self.name_kana,
        gender,
        birth_date,
        transportation: self.transportation,
        nearest_station: self.nearest_station,
        access_method: self.access_method,
        access_time: self.access_time,
        final_education: self.final_education,
        graduation_date: self.graduation_date,
        self_pr: self.self_pr,
        qualifications: self.qualifications,
      },
      created_at: decode_timestamp(&self.created_at)?,
      owner:      self.owner,
    })
  }
}

#[derive(Debug)]
pub struct RawSummary {
  pub id:         PersonId,
  pub name:       String,
  pub name_kana:  String,
  pub created_at: String,
}

impl RawSummary {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get("id")?,
      name:       text(row, "name")?,
      name_kana:  text(row, "name_kana")?,
      created_at: text(row, "created_at")?,
    })
  }

  pub fn into_summary(self) -> Result<SheetSummary> {
    Ok(SheetSummary {
      id:         self.id,
      name:       self.name,
      name_kana:  self.name_kana,
      created_at: decode_timestamp(&self.created_at)?,
    })
  }
}

/// A `projects` row. Decoding is lenient and cannot fail.
#[derive(Debug)]
pub struct RawProject {
  pub id:           ProjectId,
  pub period_start: String,
  pub period_end:   String,
  pub system_name:  String,
  pub role:         String,
  pub industry:     String,
  pub work_content: String,
  pub phases:       String,
  pub headcount:    String,
  pub env_langs:    String,
  pub env_tools:    String,
  pub env_dbs:      String,
  pub env_oss:      String,
}

impl RawProject {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:           row.get("id")?,
      period_start: text(row, "period_start")?,
      period_end:   text(row, "period_end")?,
      system_name:  text(row, "system_name")?,
      role:         text(row, "role")?,
      industry:     text(row, "industry")?,
      work_content: text(row, "work_content")?,
      phases:       text(row, "phases")?,
      headcount:    text(row, "headcount")?,
      env_langs:    text(row, "env_langs")?,
      env_tools:    text(row, "env_tools")?,
      env_dbs:      text(row, "env_dbs")?,
      env_oss:      text(row, "env_oss")?,
    })
  }

  pub fn into_project(self) -> Project {
    Project {
      id:      self.id,
      details: NewProject {
        period_start: self.period_start,
        period_end:   self.period_end,
        system_name:  self.system_name,
        work_content: self.work_content,
        role:         ProjectRole::parse(&self.role),
        industry:     Industry::parse(&self.industry),
        headcount:    self.headcount,
        phases:       decode_phases(&self.phases),
        environment:  EnvironmentTags {
          languages: decode_tags(&self.env_langs),
          tools:     decode_tags(&self.env_tools),
          databases: decode_tags(&self.env_dbs),
          machines:  decode_tags(&self.env_oss),
        },
      },
    }
  }
}

/// Column values as bound into `INSERT` / `UPDATE` statements, in
/// `PROJECT_COLUMNS` order.
pub fn project_params(p: &NewProject) -> [String; 12] {
  [
    p.period_start.clone(),
    p.period_end.clone(),
    p.system_name.clone(),
    p.role.label().to_string(),
    p.industry.label().to_string(),
    p.work_content.clone(),
    encode_phases(&p.phases),
    p.headcount.clone(),
    encode_tags(&p.environment.languages),
    encode_tags(&p.environment.tools),
    encode_tags(&p.environment.databases),
    encode_tags(&p.environment.machines),
  ]
}

/// Nullable text column, with non-text values (e.g. an integer
/// `access_time`) rendered as text.
pub fn text(row: &Row<'_>, column: &str) -> rusqlite::Result<String> {
  use rusqlite::types::ValueRef;
  Ok(match row.get_ref(column)? {
    ValueRef::Null => String::new(),
    ValueRef::Integer(i) => i.to_string(),
    ValueRef::Real(f) => f.to_string(),
    ValueRef::Text(t) | ValueRef::Blob(t) => String::from_utf8_lossy(t).into_owned(),
  })
}

#[cfg(test)]
mod tests {
  use skillsheet_core::project::Phase;

  use super::*;

  #[test]
  fn phases_read_every_historical_encoding() {
    let want = PhaseFlags::from_checked([Phase::Requirements, Phase::Implementation]);
    for raw in [
      r#"["要件","製造"]"#,
      r#"{"要件": true, "製造": true, "単体": false}"#,
      "{'要件': True, '基本': False, '製造': True}",
      "['要件', '製造']",
      "要件,製造",
      "要件\n製造\n謎",
    ] {
      assert_eq!(decode_phases(raw), want, "input {raw:?}");
    }
    assert_eq!(decode_phases(""), PhaseFlags::default());
    assert_eq!(decode_phases(&encode_phases(&want)), want);
  }

  #[test]
  fn tags_read_every_historical_encoding() {
    let want = vec!["Rust".to_string(), "Go".to_string()];
    for raw in [r#"["Rust","Go"]"#, "['Rust', 'Go']", "Rust, Go", "Rust\nGo\n", r#"[" Rust ", "''", "Go"]"#] {
      assert_eq!(decode_tags(raw), want, "input {raw:?}");
    }
    assert!(decode_tags("[]").is_empty());
    assert!(decode_tags("").is_empty());
    assert_eq!(decode_tags(&encode_tags(&want)), want);
  }

  #[test]
  fn qualifications_split_on_commas_and_newlines() {
    assert_eq!(decode_qualifications("基本情報, 応用情報\nTOEIC 800"), vec![
      "基本情報".to_string(),
      "応用情報".to_string(),
      "TOEIC 800".to_string(),
    ]);
    assert_eq!(encode_qualifications(&[" a ".into(), "".into(), "b".into()]), r#"["a","b"]"#);
  }

  #[test]
  fn qualifications_with_commas_survive_a_write() {
    let items = vec!["TOEIC 800点, 英検2級".to_string(), "基本情報".to_string()];
    assert_eq!(decode_qualifications(&encode_qualifications(&items)), items);
    assert!(decode_qualifications("[]").is_empty());
  }

  #[test]
  fn timestamps_accept_sqlite_and_rfc3339() {
    assert!(decode_timestamp("2024-05-01 10:20:30").is_ok());
    assert!(decode_timestamp("2024-05-01T10:20:30.123").is_ok());
    assert!(decode_timestamp("2024-05-01T10:20:30+09:00").is_ok());
    assert!(decode_timestamp("yesterday").is_err());
  }

  #[test]
  fn experience_round_trips_through_text() {
    let e = Experience::from_years_months(3, 4);
    assert_eq!(decode_experience(&encode_experience(e)), e);
    assert_eq!(decode_experience(""), Experience::ZERO);
  }
}
