//! The two table layouts and the probe that tells them apart.
//!
//! The layout is detected once when the store opens and every operation is
//! dispatched through the matching [`Layout`] implementation.

use rusqlite::{Connection, OptionalExtension as _, params};

use skillsheet_core::{
  AccountId, PersonId, ProjectId,
  person::PersonFields,
  project::NewProject,
  skill::Skill,
  store::Scope,
};
pub use skillsheet_core::store::LayoutKind;

use crate::{
  encode::{RawPerson, RawProject, RawSummary, project_params},
  legacy::LegacyStore,
  normalized::NormalizedStore,
  schema::PROJECT_COLUMNS,
};

// ─── Probing ─────────────────────────────────────────────────────────────────

/// `Normalized` if `user_info` exists, otherwise `Legacy`. Read-only, so
/// repeated calls on one connection agree.
pub fn detect_layout(conn: &Connection) -> rusqlite::Result<LayoutKind> {
  Ok(if table_exists(conn, "user_info")? {
    LayoutKind::Normalized
  } else {
    LayoutKind::Legacy
  })
}

pub fn table_exists(conn: &Connection, table: &str) -> rusqlite::Result<bool> {
  conn
    .query_row(
      "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
      params![table],
      |_| Ok(true),
    )
    .optional()
    .map(|found| found.unwrap_or(false))
}

pub fn table_columns(conn: &Connection, table: &str) -> rusqlite::Result<Vec<String>> {
  let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
  let names = stmt
    .query_map([], |row| row.get::<_, String>(1))?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(names)
}

// ─── Layout trait ────────────────────────────────────────────────────────────

/// Row-level operations a layout must provide. Every method runs on the
/// caller's connection or transaction; none of them commit.
pub(crate) trait Layout: Send + Sync {
  fn kind(&self) -> LayoutKind;

  /// Whether `id` exists and is visible under `scope`.
  fn visible(&self, conn: &Connection, scope: Scope, id: PersonId) -> rusqlite::Result<bool>;

  fn insert_person(
    &self,
    conn: &Connection,
    owner: Option<AccountId>,
    fields: &PersonFields,
  ) -> rusqlite::Result<PersonId>;

  fn update_person(
    &self,
    conn: &Connection,
    id: PersonId,
    fields: &PersonFields,
  ) -> rusqlite::Result<()>;

  fn summaries(&self, conn: &Connection, scope: Scope) -> rusqlite::Result<Vec<RawSummary>>;

  fn person(&self, conn: &Connection, id: PersonId) -> rusqlite::Result<Option<RawPerson>>;

  /// Skill rows in insertion order. Rows with an unknown kind are skipped.
  fn skills(&self, conn: &Connection, id: PersonId) -> rusqlite::Result<Vec<Skill>>;

  fn insert_skill(&self, conn: &Connection, id: PersonId, skill: &Skill) -> rusqlite::Result<()>;

  /// Rewrites the row currently named `stored_name` with `skill`.
  fn update_skill(
    &self,
    conn: &Connection,
    id: PersonId,
    stored_name: &str,
    skill: &Skill,
  ) -> rusqlite::Result<()>;

  /// Removes skill rows, project rows and the person row, in that order.
  fn delete_person(&self, conn: &Connection, id: PersonId) -> rusqlite::Result<bool>;

  /// Column in `projects` referencing the person.
  fn project_owner_column(&self) -> &'static str;

  fn projects(&self, conn: &Connection, id: PersonId) -> rusqlite::Result<Vec<RawProject>> {
    let sql = format!(
      "SELECT * FROM projects WHERE {} = ?1 ORDER BY id",
      self.project_owner_column()
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
      .query_map(params![id], |row| RawProject::from_row(row))?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
  }

  fn insert_project(
    &self,
    conn: &Connection,
    id: PersonId,
    project: &NewProject,
  ) -> rusqlite::Result<ProjectId> {
    let columns: Vec<&str> = PROJECT_COLUMNS.iter().map(|(c, _)| *c).collect();
    let placeholders: Vec<String> = (2..=columns.len() + 1).map(|i| format!("?{i}")).collect();
    let sql = format!(
      "INSERT INTO projects ({}, {}) VALUES (?1, {})",
      self.project_owner_column(),
      columns.join(", "),
      placeholders.join(", "),
    );
    let values = project_params(project);
    let mut bound: Vec<&dyn rusqlite::ToSql> = vec![&id];
    bound.extend(values.iter().map(|v| v as &dyn rusqlite::ToSql));
    conn.execute(&sql, bound.as_slice())?;
    Ok(conn.last_insert_rowid())
  }

  /// Returns `false` if the project does not belong to the person.
  fn update_project(
    &self,
    conn: &Connection,
    id: PersonId,
    project_id: ProjectId,
    project: &NewProject,
  ) -> rusqlite::Result<bool> {
    let assignments: Vec<String> = PROJECT_COLUMNS
      .iter()
      .enumerate()
      .map(|(i, (c, _))| format!("{c} = ?{}", i + 3))
      .collect();
    let sql = format!(
      "UPDATE projects SET {} WHERE id = ?1 AND {} = ?2",
      assignments.join(", "),
      self.project_owner_column(),
    );
    let values = project_params(project);
    let mut bound: Vec<&dyn rusqlite::ToSql> = vec![&project_id, &id];
    bound.extend(values.iter().map(|v| v as &dyn rusqlite::ToSql));
    Ok(conn.execute(&sql, bound.as_slice())? > 0)
  }

  fn delete_project(
    &self,
    conn: &Connection,
    id: PersonId,
    project_id: ProjectId,
  ) -> rusqlite::Result<bool> {
    let sql = format!(
      "DELETE FROM projects WHERE id = ?1 AND {} = ?2",
      self.project_owner_column()
    );
    Ok(conn.execute(&sql, params![project_id, id])? > 0)
  }
}

pub(crate) fn for_kind(kind: LayoutKind) -> &'static dyn Layout {
  match kind {
    LayoutKind::Legacy => &LegacyStore,
    LayoutKind::Normalized => &NormalizedStore,
  }
}
