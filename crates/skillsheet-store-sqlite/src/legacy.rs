//! Legacy layout: `basic_info`, a `qualifications` table and one table per
//! skill kind. Rows have no owner, so every scope sees every row.

use rusqlite::{Connection, OptionalExtension as _, params};

use skillsheet_core::{
  AccountId, PersonId,
  person::PersonFields,
  skill::{Skill, SkillKind},
  store::{LayoutKind, Scope},
};

use crate::{
  encode::{RawPerson, RawSummary, decode_experience, encode_birth_date, encode_experience, text},
  layout::Layout,
};

/// `(table, name column)` holding skills of one kind.
fn skill_table(kind: SkillKind) -> (&'static str, &'static str) {
  match kind {
    SkillKind::Language => ("languages", "language"),
    SkillKind::Tool => ("tools", "tool"),
    SkillKind::Database => ("databases", "\"database\""),
    SkillKind::Machine => ("machines", "machine"),
  }
}

pub(crate) struct LegacyStore;

impl LegacyStore {
  fn write_qualifications(
    conn: &Connection,
    id: PersonId,
    items: &[String],
  ) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM qualifications WHERE basic_info_id = ?1", params![id])?;
    let mut stmt = conn
      .prepare("INSERT INTO qualifications (basic_info_id, qualification) VALUES (?1, ?2)")?;
    for q in items.iter().map(|q| q.trim()).filter(|q| !q.is_empty()) {
      stmt.execute(params![id, q])?;
    }
    Ok(())
  }
}

impl Layout for LegacyStore {
  fn kind(&self) -> LayoutKind { LayoutKind::Legacy }

  fn visible(&self, conn: &Connection, _scope: Scope, id: PersonId) -> rusqlite::Result<bool> {
    conn
      .query_row("SELECT 1 FROM basic_info WHERE id = ?1", params![id], |_| Ok(true))
      .optional()
      .map(|found| found.unwrap_or(false))
  }

  fn insert_person(
    &self,
    conn: &Connection,
    _owner: Option<AccountId>,
    p: &PersonFields,
  ) -> rusqlite::Result<PersonId> {
    conn.execute(
      "INSERT INTO basic_info (name, name_kana, transportation, nearest_station,
                               access_method, access_time, gender, birth_date,
                               final_education, graduation_date, self_pr)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
      params![
        p.name,
        p.name_kana,
        p.transportation,
        p.nearest_station,
        p.access_method,
        p.access_time,
        p.gender.label(),
        encode_birth_date(p.birth_date),
        p.final_education,
        p.graduation_date,
        p.self_pr,
      ],
    )?;
    let id = conn.last_insert_rowid();
    Self::write_qualifications(conn, id, &p.qualifications)?;
    Ok(id)
  }

  fn update_person(
    &self,
    conn: &Connection,
    id: PersonId,
    p: &PersonFields,
  ) -> rusqlite::Result<()> {
    conn.execute(
      "UPDATE basic_info SET
         name = ?2, name_kana = ?3, transportation = ?4, nearest_station = ?5,
         access_method = ?6, access_time = ?7, gender = ?8, birth_date = ?9,
         final_education = ?10, graduation_date = ?11, self_pr = ?12
       WHERE id = ?1",
      params![
        id,
        p.name,
        p.name_kana,
        p.transportation,
        p.nearest_station,
        p.access_method,
        p.access_time,
        p.gender.label(),
        encode_birth_date(p.birth_date),
        p.final_education,
        p.graduation_date,
        p.self_pr,
      ],
    )?;
    Self::write_qualifications(conn, id, &p.qualifications)
  }

  fn summaries(&self, conn: &Connection, _scope: Scope) -> rusqlite::Result<Vec<RawSummary>> {
    let mut stmt = conn.prepare(
      "SELECT id, name, name_kana, created_at FROM basic_info
       ORDER BY created_at DESC, id DESC",
    )?;
    let rows = stmt
      .query_map([], |row| RawSummary::from_row(row))?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
  }

  fn person(&self, conn: &Connection, id: PersonId) -> rusqlite::Result<Option<RawPerson>> {
    let Some(mut person) = conn
      .query_row("SELECT * FROM basic_info WHERE id = ?1", params![id], |row| {
        RawPerson::from_row(row)
      })
      .optional()?
    else {
      return Ok(None);
    };

    let mut stmt =
      conn.prepare("SELECT qualification FROM qualifications WHERE basic_info_id = ?1 ORDER BY id")?;
    person.qualifications = stmt
      .query_map(params![id], |row| text(row, "qualification"))?
      .collect::<rusqlite::Result<Vec<_>>>()?
      .into_iter()
      .filter(|q| !q.trim().is_empty())
      .collect();
    Ok(Some(person))
  }

  fn skills(&self, conn: &Connection, id: PersonId) -> rusqlite::Result<Vec<Skill>> {
    let mut out = Vec::new();
    for kind in SkillKind::ALL {
      let (table, column) = skill_table(kind);
      let mut stmt = conn.prepare(&format!(
        "SELECT {column} AS name, experience_years FROM {table}
         WHERE basic_info_id = ?1 ORDER BY id"
      ))?;
      let rows = stmt.query_map(params![id], |row| {
        let years = text(row, "experience_years")?;
        Ok(Skill::new(kind, text(row, "name")?, decode_experience(&years)))
      })?;
      for skill in rows {
        out.push(skill?);
      }
    }
    Ok(out)
  }

  fn insert_skill(&self, conn: &Connection, id: PersonId, skill: &Skill) -> rusqlite::Result<()> {
    let (table, column) = skill_table(skill.kind);
    conn.execute(
      &format!(
        "INSERT INTO {table} (basic_info_id, {column}, experience_years) VALUES (?1, ?2, ?3)"
      ),
      params![id, skill.name, encode_experience(skill.experience)],
    )?;
    Ok(())
  }

  fn update_skill(
    &self,
    conn: &Connection,
    id: PersonId,
    stored_name: &str,
    skill: &Skill,
  ) -> rusqlite::Result<()> {
    let (table, column) = skill_table(skill.kind);
    conn.execute(
      &format!(
        "UPDATE {table} SET {column} = ?3, experience_years = ?4
         WHERE basic_info_id = ?1 AND {column} = ?2"
      ),
      params![id, stored_name, skill.name, encode_experience(skill.experience)],
    )?;
    Ok(())
  }

  fn delete_person(&self, conn: &Connection, id: PersonId) -> rusqlite::Result<bool> {
    conn.execute("DELETE FROM qualifications WHERE basic_info_id = ?1", params![id])?;
    for kind in SkillKind::ALL {
      let (table, _) = skill_table(kind);
      conn.execute(&format!("DELETE FROM {table} WHERE basic_info_id = ?1"), params![id])?;
    }
    conn.execute("DELETE FROM projects WHERE basic_info_id = ?1", params![id])?;
    Ok(conn.execute("DELETE FROM basic_info WHERE id = ?1", params![id])? > 0)
  }

  fn project_owner_column(&self) -> &'static str { "basic_info_id" }
}
