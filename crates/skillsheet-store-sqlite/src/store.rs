//! [`SqliteStore`], the SQLite implementation of [`SkillSheetStore`].

use std::path::Path;

use chrono::Local;
use rusqlite::Connection;
use tracing::{debug, info, warn};

use skillsheet_core::{
  AccountId, PersonId, ProjectId,
  aggregate::{self, SkillChange, TagDurations},
  person::{PersonFields, SheetSummary},
  project::NewProject,
  session::ProjectUpdate,
  sheet::{NewSkillSheet, SkillSheet},
  skill::Skill,
  store::{LayoutKind, Scope, SkillSheetStore},
};

use crate::{
  Result,
  encode::{RawPerson, RawProject},
  layout::{self, Layout},
  schema,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A skill sheet store backed by a single SQLite file.
///
/// Clones share one reference-counted connection. The table
/// layout is probed once on open and reused for every operation.
#[derive(Clone)]
pub struct SqliteStore {
  conn:   tokio_rusqlite::Connection,
  layout: &'static dyn Layout,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref().to_owned();
    let conn = tokio_rusqlite::Connection::open(&path).await?;
    let store = Self::from_connection(conn).await?;
    info!(path = %path.display(), layout = ?store.layout(), "opened store");
    Ok(store)
  }

  /// Open a fresh in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::from_connection(conn).await
  }

  /// Wrap an already-open connection, initialising the schema around
  /// whatever tables it already holds.
  pub async fn from_connection(conn: tokio_rusqlite::Connection) -> Result<Self> {
    let kind = conn.call(|conn| Ok(schema::init(conn)?)).await?;
    debug!(layout = ?kind, "detected layout");
    Ok(Self { conn, layout: layout::for_kind(kind) })
  }

  pub(crate) fn connection(&self) -> &tokio_rusqlite::Connection { &self.conn }

  /// Run `f` inside one transaction. Any error rolls the whole operation back.
  async fn write<T, F>(&self, op: &'static str, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&Connection, &'static dyn Layout) -> rusqlite::Result<T> + Send + 'static,
  {
    let layout = self.layout;
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let out = f(&tx, layout)?;
        tx.commit()?;
        Ok(out)
      })
      .await
      .map_err(|e| {
        warn!(op, error = %e, "transaction rolled back");
        e.into()
      })
  }
}

// ─── Shared row logic ────────────────────────────────────────────────────────

/// Apply aggregator output to the person's skill rows.
fn apply_skill_changes(
  conn: &Connection,
  layout: &dyn Layout,
  id: PersonId,
  changes: &[SkillChange],
) -> rusqlite::Result<()> {
  for change in changes {
    match change {
      SkillChange::Insert(skill) => layout.insert_skill(conn, id, skill)?,
      SkillChange::Update { stored_name, skill } => {
        layout.update_skill(conn, id, stored_name, skill)?
      }
    }
  }
  Ok(())
}

/// Fold one project's tags into the stored skills.
fn fold_project_skills(
  conn: &Connection,
  layout: &dyn Layout,
  id: PersonId,
  project: &NewProject,
  durations: &TagDurations,
) -> rusqlite::Result<()> {
  let existing = layout.skills(conn, id)?;
  let changes = aggregate::aggregate(&existing, &project.environment, durations);
  debug!(person = id, changes = changes.len(), "folding project tags into skills");
  apply_skill_changes(conn, layout, id, &changes)
}

/// The sheet's own skill list, collapsed so each (kind, name) appears once
/// with the last given experience.
fn initial_skill_changes(skills: &[Skill]) -> Vec<SkillChange> {
  let mut merged: Vec<Skill> = Vec::new();
  for skill in skills {
    match merged.iter_mut().find(|s| s.kind == skill.kind && s.name == skill.name) {
      Some(slot) => slot.experience = skill.experience,
      None => merged.push(skill.clone()),
    }
  }
  merged.into_iter().map(SkillChange::Insert).collect()
}

struct RawSheet {
  person:   RawPerson,
  skills:   Vec<Skill>,
  projects: Vec<RawProject>,
}

impl RawSheet {
  fn into_sheet(self) -> Result<SkillSheet> {
    Ok(SkillSheet {
      person:   self.person.into_person()?,
      skills:   self.skills,
      projects: self.projects.into_iter().map(RawProject::into_project).collect(),
    })
  }
}

// ─── SkillSheetStore impl ────────────────────────────────────────────────────

impl SkillSheetStore for SqliteStore {
  type Error = crate::Error;

  fn layout(&self) -> LayoutKind { self.layout.kind() }

  async fn create(&self, owner: Option<AccountId>, sheet: NewSkillSheet) -> Result<PersonId> {
    sheet.validate(Local::now().date_naive())?;
    let sheet = sheet.normalized();

    let id = self
      .write("create", move |conn, layout| {
        let id = layout.insert_person(conn, owner, &sheet.person)?;
        apply_skill_changes(conn, layout, id, &initial_skill_changes(&sheet.skills))?;
        for project in &sheet.projects {
          layout.insert_project(conn, id, project)?;
          fold_project_skills(conn, layout, id, project, &TagDurations::new())?;
        }
        Ok(id)
      })
      .await?;

    info!(id, "created skill sheet");
    Ok(id)
  }

  async fn list(&self, scope: Scope) -> Result<Vec<SheetSummary>> {
    let layout = self.layout;
    let raw = self
      .conn
      .call(move |conn| Ok(layout.summaries(conn, scope)?))
      .await?;
    raw.into_iter().map(|r| r.into_summary()).collect()
  }

  async fn read(&self, scope: Scope, id: PersonId) -> Result<Option<SkillSheet>> {
    let layout = self.layout;
    let raw = self
      .conn
      .call(move |conn| {
        if !layout.visible(conn, scope, id)? {
          return Ok(None);
        }
        let Some(person) = layout.person(conn, id)? else {
          return Ok(None);
        };
        Ok(Some(RawSheet {
          person,
          skills: layout.skills(conn, id)?,
          projects: layout.projects(conn, id)?,
        }))
      })
      .await?;
    raw.map(RawSheet::into_sheet).transpose()
  }

  async fn update_person(&self, scope: Scope, id: PersonId, fields: PersonFields) -> Result<bool> {
    fields.validate(Local::now().date_naive())?;
    let fields = fields.normalized();
    self
      .write("update_person", move |conn, layout| {
        if !layout.visible(conn, scope, id)? {
          return Ok(false);
        }
        layout.update_person(conn, id, &fields)?;
        Ok(true)
      })
      .await
  }

  async fn append_project(
    &self,
    scope: Scope,
    id: PersonId,
    project: NewProject,
    durations: TagDurations,
  ) -> Result<Option<ProjectId>> {
    project.validate()?;
    let project = project.normalized();
    self
      .write("append_project", move |conn, layout| {
        if !layout.visible(conn, scope, id)? {
          return Ok(None);
        }
        let project_id = layout.insert_project(conn, id, &project)?;
        fold_project_skills(conn, layout, id, &project, &durations)?;
        Ok(Some(project_id))
      })
      .await
  }

  async fn update_projects(
    &self,
    scope: Scope,
    id: PersonId,
    updates: Vec<ProjectUpdate>,
  ) -> Result<bool> {
    for update in &updates {
      update.project.validate()?;
    }
    let updates: Vec<ProjectUpdate> = updates
      .into_iter()
      .map(|u| ProjectUpdate { project: u.project.normalized(), ..u })
      .collect();

    self
      .write("update_projects", move |conn, layout| {
        if !layout.visible(conn, scope, id)? {
          return Ok(false);
        }
        for update in &updates {
          if !layout.update_project(conn, id, update.id, &update.project)? {
            debug!(person = id, project = update.id, "skipping project of another person");
            continue;
          }
          fold_project_skills(conn, layout, id, &update.project, &update.durations)?;
        }
        Ok(true)
      })
      .await
  }

  async fn delete_project(&self, scope: Scope, id: PersonId, project_id: ProjectId) -> Result<bool> {
    self
      .write("delete_project", move |conn, layout| {
        if !layout.visible(conn, scope, id)? {
          return Ok(false);
        }
        layout.delete_project(conn, id, project_id)
      })
      .await
  }

  async fn delete(&self, scope: Scope, id: PersonId) -> Result<bool> {
    let deleted = self
      .write("delete", move |conn, layout| {
        if !layout.visible(conn, scope, id)? {
          return Ok(false);
        }
        layout.delete_person(conn, id)
      })
      .await?;
    if deleted {
      info!(id, "deleted skill sheet");
    }
    Ok(deleted)
  }
}
