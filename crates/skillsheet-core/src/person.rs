//! The person a skill sheet describes.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::{AccountId, PersonId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
  #[serde(rename = "男", alias = "male")]
  Male,
  #[serde(rename = "女", alias = "female")]
  Female,
}

impl Gender {
  pub fn label(self) -> &'static str {
    match self {
      Gender::Male => "男",
      Gender::Female => "女",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s.trim() {
      "男" | "male" => Some(Gender::Male),
      "女" | "female" => Some(Gender::Female),
      _ => None,
    }
  }
}

impl fmt::Display for Gender {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

/// Offered choices for `access_method`. The field itself is free text.
pub const ACCESS_METHODS: [&str; 4] = ["徒歩", "自転車", "バス", "車"];

/// Everything the form collects about a person, without storage metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonFields {
  pub name:            String,
  pub name_kana:       String,
  pub gender:          Gender,
  #[serde(with = "birth_date")]
  pub birth_date:      NaiveDate,
  #[serde(default)]
  pub transportation:  String,
  #[serde(default)]
  pub nearest_station: String,
  #[serde(default)]
  pub access_method:   String,
  /// Minutes, digits only.
  #[serde(default)]
  pub access_time:     String,
  #[serde(default)]
  pub final_education: String,
  /// `yyyy/MM` or empty.
  #[serde(default)]
  pub graduation_date: String,
  #[serde(default)]
  pub self_pr:         String,
  #[serde(default)]
  pub qualifications:  Vec<String>,
}

impl PersonFields {
  /// Trims free-text fields and drops blank qualifications.
  pub fn normalized(mut self) -> Self {
    for field in [
      &mut self.name,
      &mut self.name_kana,
      &mut self.transportation,
      &mut self.nearest_station,
      &mut self.access_method,
      &mut self.access_time,
      &mut self.final_education,
      &mut self.graduation_date,
    ] {
      *field = field.trim().to_string();
    }
    self.qualifications = self
      .qualifications
      .into_iter()
      .map(|q| q.trim().to_string())
      .filter(|q| !q.is_empty())
      .collect();
    self
  }
}

/// A stored person row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
  pub id:         PersonId,
  #[serde(flatten)]
  pub fields:     PersonFields,
  pub created_at: NaiveDateTime,
  /// Account that created the sheet. Always `None` in the legacy layout.
  pub owner:      Option<AccountId>,
}

/// List-view projection of a person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetSummary {
  pub id:         PersonId,
  pub name:       String,
  pub name_kana:  String,
  pub created_at: NaiveDateTime,
}

/// Birth dates travel as `yyyy/MM/dd`; ISO `yyyy-MM-dd` is accepted on input.
pub mod birth_date {
  use chrono::NaiveDate;
  use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

  pub const FORMAT: &str = "%Y/%m/%d";

  pub fn parse(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, FORMAT)
      .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
      .ok()
  }

  pub fn serialize<S: Serializer>(date: &NaiveDate, ser: S) -> Result<S::Ok, S::Error> {
    ser.collect_str(&date.format(FORMAT))
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<NaiveDate, D::Error> {
    let raw = String::deserialize(de)?;
    parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid birth date {raw:?}")))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn person_fields_accept_both_date_forms() {
    let slash: PersonFields = serde_json::from_value(serde_json::json!({
      "name": "山田 太郎",
      "name_kana": "ヤマダ タロウ",
      "gender": "男",
      "birth_date": "1990/04/01",
    }))
    .unwrap();
    let iso: PersonFields = serde_json::from_value(serde_json::json!({
      "name": "山田 太郎",
      "name_kana": "ヤマダ タロウ",
      "gender": "male",
      "birth_date": "1990-04-01",
    }))
    .unwrap();
    assert_eq!(slash, iso);
    assert!(slash.qualifications.is_empty());

    let out = serde_json::to_value(&slash).unwrap();
    assert_eq!(out["birth_date"], "1990/04/01");
    assert_eq!(out["gender"], "男");
  }

  #[test]
  fn missing_birth_date_is_rejected() {
    let res: Result<PersonFields, _> = serde_json::from_value(serde_json::json!({
      "name": "a", "name_kana": "b", "gender": "女",
    }));
    assert!(res.is_err());
  }

  #[test]
  fn normalized_trims_and_drops_blank_qualifications() {
    let fields = PersonFields {
      name:            "  花子 ".into(),
      name_kana:       "ハナコ".into(),
      gender:          Gender::Female,
      birth_date:      NaiveDate::from_ymd_opt(1995, 1, 2).unwrap(),
      transportation:  String::new(),
      nearest_station: " 渋谷".into(),
      access_method:   "徒歩".into(),
      access_time:     "10".into(),
      final_education: String::new(),
      graduation_date: String::new(),
      self_pr:         "  keep my spacing  ".into(),
      qualifications:  vec![" 基本情報 ".into(), "".into(), "  ".into()],
    }
    .normalized();
    assert_eq!(fields.name, "花子");
    assert_eq!(fields.nearest_station, "渋谷");
    assert_eq!(fields.self_pr, "  keep my spacing  ");
    assert_eq!(fields.qualifications, vec!["基本情報".to_string()]);
  }
}
