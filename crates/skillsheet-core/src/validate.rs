//! Form validation. Every check runs so callers can report all problems at
//! once.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
  person::PersonFields,
  project::{NewProject, PeriodEnd, YearMonth},
  sheet::NewSkillSheet,
};

/// One rejected field. `field` is a dotted path such as `projects[1].period_start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIssue {
  pub field:   String,
  pub message: String,
}

impl FieldIssue {
  pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
    Self { field: field.into(), message: message.into() }
  }
}

impl fmt::Display for FieldIssue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}: {}", self.field, self.message)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("validation failed: {}", summary(.issues))]
pub struct ValidationError {
  pub issues: Vec<FieldIssue>,
}

fn summary(issues: &[FieldIssue]) -> String {
  issues.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

impl ValidationError {
  /// `Ok` when `issues` is empty.
  pub fn check(issues: Vec<FieldIssue>) -> Result<(), ValidationError> {
    if issues.is_empty() { Ok(()) } else { Err(ValidationError { issues }) }
  }
}

impl PersonFields {
  pub fn validate(&self, today: NaiveDate) -> Result<(), ValidationError> {
    let mut issues = Vec::new();
    person_issues(self, today, &mut issues);
    ValidationError::check(issues)
  }
}

impl NewProject {
  pub fn validate(&self) -> Result<(), ValidationError> {
    let mut issues = Vec::new();
    project_issues(self, "project", &mut issues);
    ValidationError::check(issues)
  }
}

impl NewSkillSheet {
  pub fn validate(&self, today: NaiveDate) -> Result<(), ValidationError> {
    let mut issues = Vec::new();
    person_issues(&self.person, today, &mut issues);
    for (i, project) in self.projects.iter().enumerate() {
      project_issues(project, &format!("projects[{i}]"), &mut issues);
    }
    ValidationError::check(issues)
  }
}

fn person_issues(p: &PersonFields, today: NaiveDate, issues: &mut Vec<FieldIssue>) {
  if p.name.trim().is_empty() {
    issues.push(FieldIssue::new("name", "must not be blank"));
  }
  if p.name_kana.trim().is_empty() {
    issues.push(FieldIssue::new("name_kana", "must not be blank"));
  }
  if p.birth_date > today {
    issues.push(FieldIssue::new("birth_date", "must not be in the future"));
  }

  let access_time = p.access_time.trim();
  if !access_time.bytes().all(|b| b.is_ascii_digit()) {
    issues.push(FieldIssue::new("access_time", "must be a whole number of minutes"));
  }

  let graduation = p.graduation_date.trim();
  if !graduation.is_empty() {
    match parse_graduation(graduation) {
      None => issues.push(FieldIssue::new("graduation_date", "must be yyyy/MM")),
      Some(ym) if ym > YearMonth::from_date(today).unwrap_or(ym) => {
        issues.push(FieldIssue::new("graduation_date", "must not be in the future"))
      }
      Some(_) => {}
    }
  }
}

/// Graduation dates are strictly `yyyy/MM`.
fn parse_graduation(raw: &str) -> Option<YearMonth> {
  let (year, month) = raw.split_once('/')?;
  if year.len() != 4 || month.len() != 2 {
    return None;
  }
  YearMonth::new(year.parse().ok()?, month.parse().ok()?)
}

fn project_issues(p: &NewProject, prefix: &str, issues: &mut Vec<FieldIssue>) {
  if !p.period_start.trim().is_empty() && p.start().is_none() {
    issues.push(FieldIssue::new(
      format!("{prefix}.period_start"),
      "must be a year and month such as 2021/04",
    ));
  }
  if !p.period_end.trim().is_empty() && p.end().is_none() {
    issues.push(FieldIssue::new(
      format!("{prefix}.period_end"),
      format!("must be a year and month or {}", PeriodEnd::PRESENT_LABEL),
    ));
  }
  if let (Some(start), Some(PeriodEnd::Month(end))) = (p.start(), p.end()) {
    if end < start {
      issues.push(FieldIssue::new(format!("{prefix}.period_end"), "must not precede period_start"));
    }
  }
}
