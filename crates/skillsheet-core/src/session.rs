//! Edit sessions: a buffered, per-person copy of its projects that is
//! mutated field by field and written back in one go.
//!
//! A session is created when a person enters edit mode, receives
//! [`ProjectPatch`]es, and ends on [`EditSession::submit`] or
//! [`EditSession::discard`].

use serde::{Deserialize, Serialize};

use crate::{
  Error, PersonId, ProjectId, Result,
  aggregate::TagDurations,
  project::{EnvironmentTags, Industry, NewProject, PhaseFlags, ProjectRole},
  sheet::SkillSheet,
  skill::{Experience, SkillKind, normalize_tag},
};

/// Replacement content for one stored project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectUpdate {
  pub id:        ProjectId,
  pub project:   NewProject,
  #[serde(default)]
  pub durations: TagDurations,
}

/// A buffered project inside a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDraft {
  pub id:        ProjectId,
  pub project:   NewProject,
  /// Durations set during the session. Only these are written back.
  #[serde(default)]
  pub durations: TagDurations,
  /// Stored experience of each tag when the session opened. Display only.
  #[serde(default)]
  pub current:   TagDurations,
}

impl ProjectDraft {
  fn into_update(self) -> ProjectUpdate {
    ProjectUpdate { id: self.id, project: self.project, durations: self.durations }
  }
}

/// Field-level change to one draft. `None` leaves the field as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectPatch {
  pub period_start: Option<String>,
  pub period_end:   Option<String>,
  pub system_name:  Option<String>,
  pub work_content: Option<String>,
  pub role:         Option<ProjectRole>,
  pub industry:     Option<Industry>,
  pub headcount:    Option<String>,
  pub phases:       Option<PhaseFlags>,
  pub environment:  Option<EnvironmentTags>,
  pub durations:    Option<TagDurations>,
}

impl ProjectPatch {
  pub fn apply_to(self, draft: &mut ProjectDraft) {
    let p = &mut draft.project;
    if let Some(v) = self.period_start {
      p.period_start = v;
    }
    if let Some(v) = self.period_end {
      p.period_end = v;
    }
    if let Some(v) = self.system_name {
      p.system_name = v;
    }
    if let Some(v) = self.work_content {
      p.work_content = v;
    }
    if let Some(v) = self.role {
      p.role = v;
    }
    if let Some(v) = self.industry {
      p.industry = v;
    }
    if let Some(v) = self.headcount {
      p.headcount = v;
    }
    if let Some(v) = self.phases {
      p.phases = v;
    }
    if let Some(v) = self.environment {
      p.environment = v;
    }
    if let Some(v) = self.durations {
      draft.durations = v;
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditSession {
  person_id: PersonId,
  drafts:    Vec<ProjectDraft>,
}

impl EditSession {
  /// Snapshots the sheet's projects, newest first. Each draft's `current`
  /// holds the person's stored experience for its tags; explicit
  /// `durations` start empty.
  pub fn open(sheet: &SkillSheet) -> Self {
    let drafts = sheet
      .projects_newest_first()
      .into_iter()
      .map(|project| {
        let mut current = TagDurations::new();
        for (kind, tags) in project.details.environment.iter() {
          for tag in tags {
            if let Some(experience) = current_experience(sheet, kind, tag) {
              let (years, months) = experience.years_months();
              current.set(kind, tag, years, months);
            }
          }
        }
        ProjectDraft {
          id: project.id,
          project: project.details,
          durations: TagDurations::new(),
          current,
        }
      })
      .collect();
    Self { person_id: sheet.person.id, drafts }
  }

  pub fn person_id(&self) -> PersonId { self.person_id }

  pub fn drafts(&self) -> &[ProjectDraft] { &self.drafts }

  pub fn apply(&mut self, index: usize, patch: ProjectPatch) -> Result<&ProjectDraft> {
    let len = self.drafts.len();
    let draft = self
      .drafts
      .get_mut(index)
      .ok_or(Error::DraftOutOfRange { index, len })?;
    patch.apply_to(draft);
    Ok(draft)
  }

  /// Drops the draft for a project deleted while the session was open.
  pub fn forget_project(&mut self, project_id: ProjectId) {
    self.drafts.retain(|d| d.id != project_id);
  }

  /// Ends the session, yielding the buffered updates. Tags without an
  /// explicit duration keep their stored experience.
  pub fn submit(self) -> (PersonId, Vec<ProjectUpdate>) {
    (self.person_id, self.drafts.into_iter().map(ProjectDraft::into_update).collect())
  }

  /// Ends the session without writing anything.
  pub fn discard(self) {}
}

fn current_experience(sheet: &SkillSheet, kind: SkillKind, tag: &str) -> Option<Experience> {
  let name = normalize_tag(tag);
  sheet
    .skills
    .iter()
    .find(|s| s.matches(kind, &name))
    .map(|s| s.experience)
}

#[cfg(test)]
mod tests {
  use chrono::{NaiveDate, NaiveDateTime};

  use super::*;
  use crate::{
    person::{Gender, Person, PersonFields},
    project::Project,
    skill::Skill,
  };

  fn sheet() -> SkillSheet {
    let created_at: NaiveDateTime =
      NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(9, 0, 0).unwrap();
    SkillSheet {
      person:   Person {
        id: 7,
        fields: PersonFields {
          name:            "a".into(),
          name_kana:       "b".into(),
          gender:          Gender::Female,
          birth_date:      NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
          transportation:  String::new(),
          nearest_station: String::new(),
          access_method:   String::new(),
          access_time:     String::new(),
          final_education: String::new(),
          graduation_date: String::new(),
          self_pr:         String::new(),
          qualifications:  vec![],
        },
        created_at,
        owner: None,
      },
      skills:   vec![Skill::new(SkillKind::Language, "Rust", Experience::from_years_months(2, 3))],
      projects: vec![
        Project {
          id:      1,
          details: NewProject { period_start: "2019/01".into(), ..Default::default() },
        },
        Project {
          id:      2,
          details: NewProject {
            period_start: "2022/10".into(),
            environment: EnvironmentTags { languages: vec!["Rust".into()], ..Default::default() },
            ..Default::default()
          },
        },
      ],
    }
  }

  #[test]
  fn open_orders_newest_first_and_shows_current_durations() {
    let session = EditSession::open(&sheet());
    assert_eq!(session.person_id(), 7);
    let ids: Vec<_> = session.drafts().iter().map(|d| d.id).collect();
    assert_eq!(ids, vec![2, 1]);
    let rust = session.drafts()[0].current.get(SkillKind::Language, "Rust").unwrap();
    assert_eq!(rust.years_months(), (2, 3));
    assert!(session.drafts()[0].durations.is_empty());
    assert!(session.drafts()[1].current.is_empty());
  }

  #[test]
  fn submit_carries_only_patched_durations() {
    let mut sheet = sheet();
    sheet.projects[0].details.environment.languages = vec!["Rust".into()];
    let mut session = EditSession::open(&sheet);

    let mut five = TagDurations::new();
    five.set(SkillKind::Language, "Rust", 5, 0);
    session.apply(0, ProjectPatch { durations: Some(five), ..Default::default() }).unwrap();

    let (_, updates) = session.submit();
    let rust = updates[0].durations.get(SkillKind::Language, "Rust").unwrap();
    assert_eq!(rust.years_months(), (5, 0));
    assert!(updates[1].durations.is_empty());
  }

  #[test]
  fn patches_touch_only_given_fields() {
    let mut session = EditSession::open(&sheet());
    session
      .apply(1, ProjectPatch {
        system_name: Some("会計システム".into()),
        role: Some(ProjectRole::ProjectLeader),
        ..Default::default()
      })
      .unwrap();
    let (person_id, updates) = session.submit();
    assert_eq!(person_id, 7);
    assert_eq!(updates[1].project.system_name, "会計システム");
    assert_eq!(updates[1].project.role, ProjectRole::ProjectLeader);
    assert_eq!(updates[1].project.period_start, "2019/01");
  }

  #[test]
  fn out_of_range_patch_is_an_error() {
    let mut session = EditSession::open(&sheet());
    let err = session.apply(5, ProjectPatch::default()).unwrap_err();
    assert!(matches!(err, Error::DraftOutOfRange { index: 5, len: 2 }));
  }

  #[test]
  fn forgetting_a_project_drops_its_draft() {
    let mut session = EditSession::open(&sheet());
    session.forget_project(2);
    assert_eq!(session.drafts().len(), 1);
    session.discard();
  }
}
