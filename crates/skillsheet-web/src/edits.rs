//! Open edit sessions, keyed by a random id.
//!
//! Each session belongs to the account that opened it; other accounts see it
//! as missing. Deleting a person or project prunes the sessions that refer
//! to it.

use std::collections::HashMap;

use skillsheet_core::{AccountId, PersonId, ProjectId, session::EditSession};
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

struct Entry {
  owner:   AccountId,
  session: EditSession,
}

#[derive(Default)]
pub struct EditSessions {
  sessions: Mutex<HashMap<Uuid, Entry>>,
}

impl EditSessions {
  pub fn new() -> Self { Self::default() }

  pub async fn open(&self, owner: AccountId, session: EditSession) -> Uuid {
    let id = Uuid::new_v4();
    debug!(%id, person = session.person_id(), "opened edit session");
    self.sessions.lock().await.insert(id, Entry { owner, session });
    id
  }

  /// Run `f` against the session if it exists and belongs to `owner`.
  pub async fn with<T>(
    &self,
    id: Uuid,
    owner: AccountId,
    f: impl FnOnce(&mut EditSession) -> T,
  ) -> Option<T> {
    let mut sessions = self.sessions.lock().await;
    sessions.get_mut(&id).filter(|e| e.owner == owner).map(|e| f(&mut e.session))
  }

  /// Remove and return the session.
  pub async fn take(&self, id: Uuid, owner: AccountId) -> Option<EditSession> {
    let mut sessions = self.sessions.lock().await;
    if sessions.get(&id)?.owner != owner {
      return None;
    }
    sessions.remove(&id).map(|e| e.session)
  }

  /// Put back a session taken for a submit that did not go through.
  pub async fn restore(&self, id: Uuid, owner: AccountId, session: EditSession) {
    self.sessions.lock().await.insert(id, Entry { owner, session });
  }

  /// Drop every session editing `person`.
  pub async fn forget_person(&self, person: PersonId) {
    let mut sessions = self.sessions.lock().await;
    let before = sessions.len();
    sessions.retain(|_, e| e.session.person_id() != person);
    let dropped = before - sessions.len();
    if dropped > 0 {
      debug!(person, dropped, "dropped edit sessions of deleted person");
    }
  }

  /// Drop the draft of a deleted project from every session of its person.
  pub async fn forget_project(&self, person: PersonId, project: ProjectId) {
    let mut sessions = self.sessions.lock().await;
    for entry in sessions.values_mut().filter(|e| e.session.person_id() == person) {
      entry.session.forget_project(project);
    }
  }

  pub async fn len(&self) -> usize { self.sessions.lock().await.len() }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;
  use skillsheet_core::{
    person::{Gender, Person, PersonFields},
    project::{NewProject, Project},
    sheet::SkillSheet,
  };

  use super::*;

  fn session(person: PersonId, projects: &[ProjectId]) -> EditSession {
    let sheet = SkillSheet {
      person:   Person {
        id:         person,
        fields:     PersonFields {
          name:            "n".into(),
          name_kana:       "k".into(),
          gender:          Gender::Male,
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
        created_at: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap(),
        owner:      None,
      },
      skills:   vec![],
      projects: projects
        .iter()
        .map(|id| Project { id: *id, details: NewProject::default() })
        .collect(),
    };
    EditSession::open(&sheet)
  }

  #[tokio::test]
  async fn sessions_are_private_to_their_owner() {
    let edits = EditSessions::new();
    let id = edits.open(1, session(10, &[1])).await;
    assert!(edits.with(id, 2, |_| ()).await.is_none());
    assert!(edits.take(id, 2).await.is_none());
    assert_eq!(edits.with(id, 1, |s| s.person_id()).await, Some(10));
    assert!(edits.take(id, 1).await.is_some());
    assert_eq!(edits.len().await, 0);
  }

  #[tokio::test]
  async fn deleting_a_person_drops_its_sessions() {
    let edits = EditSessions::new();
    edits.open(1, session(10, &[1])).await;
    let keep = edits.open(1, session(11, &[2])).await;
    edits.forget_person(10).await;
    assert_eq!(edits.len().await, 1);
    assert!(edits.with(keep, 1, |_| ()).await.is_some());
  }

  #[tokio::test]
  async fn deleting_a_project_drops_its_draft() {
    let edits = EditSessions::new();
    let id = edits.open(1, session(10, &[1, 2])).await;
    edits.forget_project(10, 1).await;
    let ids = edits
      .with(id, 1, |s| s.drafts().iter().map(|d| d.id).collect::<Vec<_>>())
      .await
      .unwrap();
    assert_eq!(ids, vec![2]);
  }
}
