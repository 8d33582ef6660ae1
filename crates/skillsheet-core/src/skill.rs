//! Skills: a named technology of one category with an experience span.

use std::fmt;

use serde::{Deserialize, Serialize};

// ─── SkillKind ──────────────────────────────────────────────────────────────

/// Skill category. The serialized form doubles as the `skill_type` column
/// value in the normalized layout.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum SkillKind {
  #[serde(rename = "language")]
  Language,
  #[serde(rename = "tool")]
  Tool,
  #[serde(rename = "db", alias = "database")]
  Database,
  #[serde(rename = "machine")]
  Machine,
}

impl SkillKind {
  /// Every kind in rendering order.
  pub const ALL: [SkillKind; 4] = [
    SkillKind::Language,
    SkillKind::Tool,
    SkillKind::Database,
    SkillKind::Machine,
  ];

  pub fn tag(self) -> &'static str {
    match self {
      SkillKind::Language => "language",
      SkillKind::Tool => "tool",
      SkillKind::Database => "db",
      SkillKind::Machine => "machine",
    }
  }

  pub fn from_tag(tag: &str) -> Option<Self> {
    match tag.trim() {
      "language" => Some(SkillKind::Language),
      "tool" => Some(SkillKind::Tool),
      "db" | "database" => Some(SkillKind::Database),
      "machine" => Some(SkillKind::Machine),
      _ => None,
    }
  }
}

impl fmt::Display for SkillKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.tag())
  }
}

// ─── Experience ─────────────────────────────────────────────────────────────

/// Experience span, stored as fractional years.
///
/// The whole-month count is `round(years * 12)`; rendering splits it into
/// years and remaining months.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Experience(f64);

impl Experience {
  pub const ZERO: Experience = Experience(0.0);

  /// Negative and non-finite inputs collapse to zero.
  pub fn from_years(years: f64) -> Self {
    if years.is_finite() && years > 0.0 {
      Experience(years)
    } else {
      Experience::ZERO
    }
  }

  pub fn from_years_months(years: u32, months: u32) -> Self {
    Experience::from_years(f64::from(years) + f64::from(months) / 12.0)
  }

  /// Lenient parse of a stored value: a decimal year count or the display
  /// form (`3年4ヶ月`, `3年`, `6ヶ月`). Anything else reads as zero.
  pub fn parse(raw: &str) -> Self {
    let raw = raw.trim();
    if let Ok(years) = raw.parse::<f64>() {
      return Experience::from_years(years);
    }
    Self::parse_display(raw).unwrap_or(Experience::ZERO)
  }

  fn parse_display(raw: &str) -> Option<Self> {
    let (years, rest) = match raw.split_once('年') {
      Some((years, rest)) => (years.trim().parse::<u32>().ok()?, rest.trim()),
      None => (0, raw),
    };
    let months = match rest {
      "" if raw.contains('年') => 0,
      "" => return None,
      rest => rest
        .strip_suffix("ヶ月")
        .or_else(|| rest.strip_suffix("か月"))?
        .trim()
        .parse::<u32>()
        .ok()?,
    };
    Some(Experience::from_years_months(years, months))
  }

  pub fn years(self) -> f64 { self.0 }

  pub fn total_months(self) -> u32 {
    // `from_years` guarantees a finite, non-negative value.
    (self.0 * 12.0).round() as u32
  }

  /// `(whole years, remaining months)`.
  pub fn years_months(self) -> (u32, u32) {
    let months = self.total_months();
    (months / 12, months % 12)
  }
}

impl fmt::Display for Experience {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.years_months() {
      (0, months) => write!(f, "{months}ヶ月"),
      (years, 0) => write!(f, "{years}年"),
      (years, months) => write!(f, "{years}年{months}ヶ月"),
    }
  }
}

// ─── Skill ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
  pub kind:       SkillKind,
  pub name:       String,
  #[serde(default)]
  pub experience: Experience,
}

impl Skill {
  pub fn new(kind: SkillKind, name: impl Into<String>, experience: Experience) -> Self {
    Self { kind, name: name.into(), experience }
  }

  /// Same kind and same normalized name.
  pub fn matches(&self, kind: SkillKind, normalized_name: &str) -> bool {
    self.kind == kind && normalize_tag(&self.name) == normalized_name
  }
}

// ─── Tag normalization ──────────────────────────────────────────────────────

/// Canonical form of a free-text skill or environment tag.
///
/// Strips any run of whitespace (including U+3000), brackets and straight or
/// curly quotes from both ends. Case is preserved. Placeholder strings such
/// as `''` or `[]` normalize to the empty string.
pub fn normalize_tag(raw: &str) -> String {
  raw.trim_matches(is_tag_padding).to_string()
}

fn is_tag_padding(c: char) -> bool {
  c.is_whitespace()
    || matches!(c, '\u{3000}' | '[' | ']' | '\'' | '"' | '“' | '”' | '‘' | '’')
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn normalize_strips_quotes_brackets_and_whitespace() {
    assert_eq!(normalize_tag("  Rust  "), "Rust");
    assert_eq!(normalize_tag("[\"Python\"]"), "Python");
    assert_eq!(normalize_tag("'Go'"), "Go");
    assert_eq!(normalize_tag("\u{3000}“Java”\u{3000}"), "Java");
    assert_eq!(normalize_tag("C#"), "C#");
    assert_eq!(normalize_tag("TypeScript"), "TypeScript");
  }

  #[test]
  fn normalize_drops_placeholders() {
    for raw in ["''", "\"\"", "[]", "  ", "[ '' ]"] {
      assert_eq!(normalize_tag(raw), "", "input {raw:?}");
    }
  }

  #[test]
  fn normalize_is_idempotent() {
    for raw in ["  'C#'", "\"\"nested\"\"", "plain", "[“x”]", "a, b"] {
      let once = normalize_tag(raw);
      assert_eq!(normalize_tag(&once), once, "input {raw:?}");
    }
  }

  #[test]
  fn experience_display_omits_zero_terms() {
    assert_eq!(Experience::from_years_months(0, 0).to_string(), "0ヶ月");
    assert_eq!(Experience::from_years_months(2, 0).to_string(), "2年");
    assert_eq!(Experience::from_years_months(0, 6).to_string(), "6ヶ月");
    assert_eq!(Experience::from_years_months(3, 4).to_string(), "3年4ヶ月");
  }

  #[test]
  fn experience_rounds_to_months() {
    let e = Experience::from_years_months(3, 4);
    assert_eq!(e.total_months(), 40);
    assert_eq!(e.years_months(), (3, 4));
    assert_eq!(Experience::parse("1.5").years_months(), (1, 6));
    assert_eq!(Experience::from_years(-2.0), Experience::ZERO);
  }

  #[test]
  fn experience_parses_display_form() {
    assert_eq!(Experience::parse("3年4ヶ月").years_months(), (3, 4));
    assert_eq!(Experience::parse("3年").years_months(), (3, 0));
    assert_eq!(Experience::parse("6ヶ月").years_months(), (0, 6));
    assert_eq!(Experience::parse("garbage"), Experience::ZERO);
    assert_eq!(Experience::parse(""), Experience::ZERO);
  }

  #[test]
  fn kind_tags_round_trip() {
    for kind in SkillKind::ALL {
      assert_eq!(SkillKind::from_tag(kind.tag()), Some(kind));
    }
    assert_eq!(SkillKind::from_tag("database"), Some(SkillKind::Database));
    assert_eq!(SkillKind::from_tag("os"), None);
  }
}
