//! Normalized layout: `user_info`, a single `skills` table keyed by
//! `skill_type`, and `projects` keyed by `user_info_id`.

use rusqlite::{Connection, OptionalExtension as _, params};
use tracing::debug;

use skillsheet_core::{
  AccountId, PersonId,
  person::PersonFields,
  skill::{Skill, SkillKind},
  store::{LayoutKind, Scope},
};

use crate::{
  encode::{
    RawPerson, RawSummary, decode_experience, decode_qualifications, encode_birth_date,
    encode_experience, encode_qualifications, text,
  },
  layout::Layout,
};

pub(crate) struct NormalizedStore;

impl Layout for NormalizedStore {
  fn kind(&self) -> LayoutKind { LayoutKind::Normalized }

  fn visible(&self, conn: &Connection, scope: Scope, id: PersonId) -> rusqlite::Result<bool> {
    let owner: Option<Option<AccountId>> = conn
      .query_row("SELECT login_user_id FROM user_info WHERE id = ?1", params![id], |row| {
        row.get(0)
      })
      .optional()?;
    Ok(owner.is_some_and(|owner| scope.permits(owner)))
  }

  fn insert_person(
    &self,
    conn: &Connection,
    owner: Option<AccountId>,
    p: &PersonFields,
  ) -> rusqlite::Result<PersonId> {
    conn.execute(
      "INSERT INTO user_info (name, name_kana, transportation, nearest_station,
                              access_method, access_time, gender, birth_date,
                              final_education, graduation_date, self_pr,
                              qualifications, login_user_id)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
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
        encode_qualifications(&p.qualifications),
        owner,
      ],
    )?;
    Ok(conn.last_insert_rowid())
  }

  fn update_person(
    &self,
    conn: &Connection,
    id: PersonId,
    p: &PersonFields,
  ) -> rusqlite::Result<()> {
    conn.execute(
      "UPDATE user_info SET
         name = ?2, name_kana = ?3, transportation = ?4, nearest_station = ?5,
         access_method = ?6, access_time = ?7, gender = ?8, birth_date = ?9,
         final_education = ?10, graduation_date = ?11, self_pr = ?12,
         qualifications = ?13
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
        encode_qualifications(&p.qualifications),
      ],
    )?;
    Ok(())
  }

  fn summaries(&self, conn: &Connection, scope: Scope) -> rusqlite::Result<Vec<RawSummary>> {
    let rows = match scope.owner() {
      Some(owner) => {
        let mut stmt = conn.prepare(
          "SELECT id, name, name_kana, created_at FROM user_info
           WHERE login_user_id = ?1
           ORDER BY created_at DESC, id DESC",
        )?;
        stmt
          .query_map(params![owner], |row| RawSummary::from_row(row))?
          .collect::<rusqlite::Result<Vec<_>>>()?
      }
      None => {
        let mut stmt = conn.prepare(
          "SELECT id, name, name_kana, created_at FROM user_info
           ORDER BY created_at DESC, id DESC",
        )?;
        stmt
          .query_map([], |row| RawSummary::from_row(row))?
          .collect::<rusqlite::Result<Vec<_>>>()?
      }
    };
    Ok(rows)
  }

  fn person(&self, conn: &Connection, id: PersonId) -> rusqlite::Result<Option<RawPerson>> {
    conn
      .query_row("SELECT * FROM user_info WHERE id = ?1", params![id], |row| {
        let mut person = RawPerson::from_row(row)?;
        person.qualifications = decode_qualifications(&text(row, "qualifications")?);
        person.owner = row.get("login_user_id")?;
        Ok(person)
      })
      .optional()
  }

  fn skills(&self, conn: &Connection, id: PersonId) -> rusqlite::Result<Vec<Skill>> {
    let mut stmt = conn.prepare(
      "SELECT skill_type, skill_name, experience_years FROM skills
       WHERE user_info_id = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![id], |row| {
      Ok((
        text(row, "skill_type")?,
        text(row, "skill_name")?,
        text(row, "experience_years")?,
      ))
    })?;

    let mut out = Vec::new();
    for row in rows {
      let (tag, name, years) = row?;
      match SkillKind::from_tag(&tag) {
        Some(kind) => out.push(Skill::new(kind, name, decode_experience(&years))),
        None => debug!(person = id, skill_type = %tag, "skipping skill of unknown type"),
      }
    }
    Ok(out)
  }

  fn insert_skill(&self, conn: &Connection, id: PersonId, skill: &Skill) -> rusqlite::Result<()> {
    conn.execute(
      "INSERT INTO skills (user_info_id, skill_type, skill_name, experience_years)
       VALUES (?1, ?2, ?3, ?4)",
      params![id, skill.kind.tag(), skill.name, encode_experience(skill.experience)],
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
    conn.execute(
      "UPDATE skills SET skill_name = ?4, experience_years = ?5
       WHERE user_info_id = ?1 AND skill_type = ?2 AND skill_name = ?3",
      params![
        id,
        skill.kind.tag(),
        stored_name,
        skill.name,
        encode_experience(skill.experience)
      ],
    )?;
    Ok(())
  }

  fn delete_person(&self, conn: &Connection, id: PersonId) -> rusqlite::Result<bool> {
    conn.execute("DELETE FROM skills WHERE user_info_id = ?1", params![id])?;
    conn.execute("DELETE FROM projects WHERE user_info_id = ?1", params![id])?;
    Ok(conn.execute("DELETE FROM user_info WHERE id = ?1", params![id])? > 0)
  }

  fn project_owner_column(&self) -> &'static str { "user_info_id" }
}
