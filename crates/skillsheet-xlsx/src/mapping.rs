//! Field Mapper: where every field of a skill sheet lands on the template.
//!
//! Scalar fields have one fixed cell each. Repeatable fields (skill rows,
//! project blocks, environment tags) are placed by a function of their
//! repetition index. Anything past a configured maximum is dropped, and
//! every slot up to the maximum that has no value is written blank so a
//! longer list from an earlier export never shows through.

use skillsheet_core::{
  person::{PersonFields, birth_date},
  project::{Phase, Project},
  sheet::SkillSheet,
  skill::SkillKind,
};

use crate::cell::CellRef;

/// Column numbers used by the template.
mod col {
  pub const B: u32 = 2;
  pub const D: u32 = 4;
  pub const E: u32 = 5;
  pub const H: u32 = 8;
  pub const J: u32 = 10;
  pub const L: u32 = 12;
  pub const N: u32 = 14;
  pub const P: u32 = 16;
  pub const Q: u32 = 17;
  pub const R: u32 = 18;
  pub const T: u32 = 20;
  pub const V: u32 = 22;
  pub const X: u32 = 24;
  pub const Z: u32 = 26;
  pub const AB: u32 = 28;
  pub const AD: u32 = 30;
  pub const AE: u32 = 31;
  pub const AF: u32 = 32;
  pub const AG: u32 = 33;
  pub const AJ: u32 = 36;
  pub const AL: u32 = 38;
  pub const AM: u32 = 39;
  pub const AV: u32 = 48;
}

/// Mark written into a phase column when that phase is checked.
pub const PHASE_MARK: &str = "●";

// ─── Person ──────────────────────────────────────────────────────────────────

/// Scalar person fields with a fixed target cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonField {
  Name,
  NameKana,
  Transportation,
  NearestStation,
  AccessMethod,
  AccessTime,
  Gender,
  BirthDate,
  FinalEducation,
  GraduationDate,
  SelfPr,
}

impl PersonField {
  pub const ALL: [PersonField; 11] = [
    PersonField::Name,
    PersonField::NameKana,
    PersonField::Transportation,
    PersonField::NearestStation,
    PersonField::AccessMethod,
    PersonField::AccessTime,
    PersonField::Gender,
    PersonField::BirthDate,
    PersonField::FinalEducation,
    PersonField::GraduationDate,
    PersonField::SelfPr,
  ];

  pub fn cell(self) -> CellRef {
    match self {
      PersonField::Name => CellRef::new(col::E, 5),
      PersonField::NameKana => CellRef::new(col::E, 4),
      PersonField::Transportation => CellRef::new(col::T, 5),
      PersonField::NearestStation => CellRef::new(col::AB, 5),
      PersonField::AccessMethod => CellRef::new(col::AJ, 5),
      PersonField::AccessTime => CellRef::new(col::AM, 5),
      PersonField::Gender => CellRef::new(col::Q, 5),
      PersonField::BirthDate => CellRef::new(col::AV, 1),
      PersonField::FinalEducation => CellRef::new(col::B, 8),
      PersonField::GraduationDate => CellRef::new(col::AE, 8),
      PersonField::SelfPr => CellRef::new(col::B, 27),
    }
  }

  pub fn value(self, p: &PersonFields) -> String {
    match self {
      PersonField::Name => p.name.clone(),
      PersonField::NameKana => p.name_kana.clone(),
      PersonField::Transportation => p.transportation.clone(),
      PersonField::NearestStation => p.nearest_station.clone(),
      PersonField::AccessMethod => p.access_method.clone(),
      PersonField::AccessTime => p.access_time.clone(),
      PersonField::Gender => p.gender.label().to_string(),
      PersonField::BirthDate => p.birth_date.format(birth_date::FORMAT).to_string(),
      PersonField::FinalEducation => p.final_education.clone(),
      PersonField::GraduationDate => p.graduation_date.clone(),
      PersonField::SelfPr => p.self_pr.clone(),
    }
  }
}

/// Qualification slots, filled in order. Further qualifications are dropped.
pub const QUALIFICATION_CELLS: [CellRef; 6] = [
  CellRef::new(col::B, 10),
  CellRef::new(col::B, 11),
  CellRef::new(col::B, 12),
  CellRef::new(col::V, 10),
  CellRef::new(col::V, 11),
  CellRef::new(col::V, 12),
];

// ─── Projects ────────────────────────────────────────────────────────────────

/// Single-cell project fields, positioned relative to the block's base row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectField {
  PeriodStart,
  PeriodEnd,
  SystemName,
  WorkContent,
  Industry,
  Role,
  Headcount,
}

impl ProjectField {
  pub const ALL: [ProjectField; 7] = [
    ProjectField::PeriodStart,
    ProjectField::PeriodEnd,
    ProjectField::SystemName,
    ProjectField::WorkContent,
    ProjectField::Industry,
    ProjectField::Role,
    ProjectField::Headcount,
  ];

  /// `(row offset from base, column)`.
  fn position(self) -> (u32, u32) {
    match self {
      ProjectField::PeriodStart => (0, col::D),
      ProjectField::PeriodEnd => (1, col::E),
      ProjectField::SystemName => (3, col::J),
      ProjectField::WorkContent => (3, col::B),
      ProjectField::Industry => (2, col::L),
      ProjectField::Role => (2, col::T),
      ProjectField::Headcount => (2, col::Z),
    }
  }

  fn value(self, p: &Project) -> String {
    let d = &p.details;
    match self {
      ProjectField::PeriodStart => d.period_start.clone(),
      ProjectField::PeriodEnd => d.period_end.clone(),
      ProjectField::SystemName => d.system_name.clone(),
      ProjectField::WorkContent => d.work_content.clone(),
      ProjectField::Industry => d.industry.label().to_string(),
      ProjectField::Role => d.role.label().to_string(),
      ProjectField::Headcount => d.headcount.clone(),
    }
  }
}

/// Phase columns on the row below the base, in [`Phase::ALL`] order.
const PHASE_COLUMNS: [u32; 10] = [
  col::J,
  col::L,
  col::N,
  col::P,
  col::R,
  col::T,
  col::V,
  col::X,
  col::Z,
  col::AB,
];

fn tag_column(kind: SkillKind) -> u32 {
  match kind {
    SkillKind::Language => col::AD,
    SkillKind::Tool => col::AG,
    SkillKind::Database => col::AJ,
    SkillKind::Machine => col::AM,
  }
}

/// `(name column, duration column)` of a skill block.
fn skill_columns(kind: SkillKind) -> (u32, u32) {
  match kind {
    SkillKind::Language => (col::B, col::H),
    SkillKind::Tool => (col::L, col::R),
    SkillKind::Database => (col::V, col::AB),
    SkillKind::Machine => (col::AF, col::AL),
  }
}

// ─── Layout ──────────────────────────────────────────────────────────────────

/// One value destined for one cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellWrite {
  pub cell:  CellRef,
  pub value: String,
}

impl CellWrite {
  fn new(cell: CellRef, value: impl Into<String>) -> Self { Self { cell, value: value.into() } }
}

/// Repetition bases and caps for one export table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportLayout {
  /// Base row of the first project block.
  pub project_base_row:  u32,
  /// Rows between consecutive project blocks.
  pub project_stride:    u32,
  pub max_projects:      usize,
  /// Environment tags shown per category within one project block.
  pub tags_per_category: usize,
  pub skill_first_row:   u32,
  pub skills_per_kind:   usize,
  /// Name of an extra worksheet that receives every project as a table row.
  pub projects_sheet:    Option<String>,
}

impl ExportLayout {
  /// Three project blocks at rows 37, 50 and 63 with three tags each.
  pub fn enhanced() -> Self {
    Self {
      project_base_row:  37,
      project_stride:    13,
      max_projects:      3,
      tags_per_category: 3,
      skill_first_row:   15,
      skills_per_kind:   10,
      projects_sheet:    None,
    }
  }

  /// Ten project blocks with eleven tags each, plus a `Projects` table.
  pub fn legacy() -> Self {
    Self {
      max_projects: 10,
      tags_per_category: 11,
      projects_sheet: Some("Projects".to_string()),
      ..Self::enhanced()
    }
  }

  pub fn project_base(&self, index: usize) -> u32 {
    self.project_base_row + self.project_stride * index as u32
  }

  pub fn project_cell(&self, index: usize, field: ProjectField) -> CellRef {
    let (row, col) = field.position();
    CellRef::new(col, self.project_base(index) + row)
  }

  pub fn phase_cell(&self, index: usize, phase: Phase) -> CellRef {
    CellRef::new(PHASE_COLUMNS[phase.index()], self.project_base(index) + 1)
  }

  pub fn tag_cell(&self, index: usize, kind: SkillKind, slot: usize) -> CellRef {
    CellRef::new(tag_column(kind), self.project_base(index) + 2 + slot as u32)
  }

  /// `(name cell, duration cell)` of the `slot`th skill of `kind`.
  pub fn skill_cells(&self, kind: SkillKind, slot: usize) -> (CellRef, CellRef) {
    let (name, years) = skill_columns(kind);
    let row = self.skill_first_row + slot as u32;
    (CellRef::new(name, row), CellRef::new(years, row))
  }

  /// Every write for the main worksheet, in a fixed order: person fields,
  /// qualifications, skill blocks, then project blocks newest first.
  pub fn cell_writes(&self, sheet: &SkillSheet) -> Vec<CellWrite> {
    let mut out = Vec::new();
    let person = &sheet.person.fields;

    for field in PersonField::ALL {
      out.push(CellWrite::new(field.cell(), field.value(person)));
    }

    for (i, cell) in QUALIFICATION_CELLS.iter().enumerate() {
      let value = person.qualifications.get(i).map(String::as_str).unwrap_or_default();
      out.push(CellWrite::new(*cell, value));
    }

    for kind in SkillKind::ALL {
      let mut skills = sheet.skills.iter().filter(|s| s.kind == kind);
      for slot in 0..self.skills_per_kind {
        let (name_cell, years_cell) = self.skill_cells(kind, slot);
        match skills.next() {
          Some(skill) => {
            out.push(CellWrite::new(name_cell, skill.name.as_str()));
            out.push(CellWrite::new(years_cell, skill.experience.to_string()));
          }
          None => {
            out.push(CellWrite::new(name_cell, ""));
            out.push(CellWrite::new(years_cell, ""));
          }
        }
      }
    }

    let projects = sheet.projects_newest_first();
    for index in 0..self.max_projects {
      self.project_writes(index, projects.get(index), &mut out);
    }

    out
  }

  fn project_writes(&self, index: usize, project: Option<&Project>, out: &mut Vec<CellWrite>) {
    for field in ProjectField::ALL {
      let value = project.map(|p| field.value(p)).unwrap_or_default();
      out.push(CellWrite::new(self.project_cell(index, field), value));
    }

    for phase in Phase::ALL {
      let checked = project.is_some_and(|p| p.details.phases.get(phase));
      let mark = if checked { PHASE_MARK } else { "" };
      out.push(CellWrite::new(self.phase_cell(index, phase), mark));
    }

    for kind in SkillKind::ALL {
      let tags = project.map(|p| p.details.environment.get(kind)).unwrap_or_default();
      for slot in 0..self.tags_per_category {
        let value = tags.get(slot).map(String::as_str).unwrap_or_default();
        out.push(CellWrite::new(self.tag_cell(index, kind, slot), value));
      }
    }
  }

  /// Header and one row per project (newest first) for the tabular sheet.
  /// Tag columns are padded so every row has the header's width.
  pub fn projects_table(&self, sheet: &SkillSheet) -> Vec<Vec<String>> {
    let n = self.tags_per_category;
    let mut header: Vec<String> = [
      "開始(yyyy/MM)",
      "終了(yyyy/MM|現在)",
      "システム名/案件名",
      "業務内容",
      "役割",
      "業種",
    ]
    .map(String::from)
    .to_vec();
    header.extend(Phase::ALL.iter().map(|p| format!("工程:{}", p.label())));
    header.push("人数".to_string());
    for label in ["言語", "ツール/FW/Lib", "DB", "OS/マシン"] {
      header.extend((1..=n).map(|i| format!("環境:{label}{i}")));
    }

    let mut rows = vec![header];
    for project in sheet.projects_newest_first() {
      let d = &project.details;
      let mut row = vec![
        d.period_start.clone(),
        d.period_end.clone(),
        d.system_name.clone(),
        d.work_content.clone(),
        d.role.label().to_string(),
        d.industry.label().to_string(),
      ];
      row.extend(d.phases.iter().map(|(_, on)| if on { "1" } else { "0" }.to_string()));
      row.push(d.headcount.clone());
      for kind in SkillKind::ALL {
        let tags = d.environment.get(kind);
        row.extend((0..n).map(|i| tags.get(i).cloned().unwrap_or_default()));
      }
      rows.push(row);
    }
    rows
  }
}

impl Default for ExportLayout {
  fn default() -> Self { Self::enhanced() }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn enhanced_project_bases_repeat_every_13_rows() {
    let layout = ExportLayout::enhanced();
    assert_eq!(
      (0..3).map(|i| layout.project_base(i)).collect::<Vec<_>>(),
      vec![37, 50, 63]
    );
  }

  #[test]
  fn project_block_cells_match_template() {
    let layout = ExportLayout::enhanced();
    let at = |field| layout.project_cell(1, field).to_string();
    assert_eq!(at(ProjectField::PeriodStart), "D50");
    assert_eq!(at(ProjectField::PeriodEnd), "E51");
    assert_eq!(at(ProjectField::Industry), "L52");
    assert_eq!(at(ProjectField::Role), "T52");
    assert_eq!(at(ProjectField::Headcount), "Z52");
    assert_eq!(at(ProjectField::SystemName), "J53");
    assert_eq!(at(ProjectField::WorkContent), "B53");
    assert_eq!(layout.phase_cell(0, Phase::EnvironmentSetup).to_string(), "J38");
    assert_eq!(layout.phase_cell(0, Phase::Other).to_string(), "AB38");
    assert_eq!(layout.tag_cell(0, SkillKind::Tool, 2).to_string(), "AG41");
    assert_eq!(layout.tag_cell(2, SkillKind::Machine, 0).to_string(), "AM65");
  }

  #[test]
  fn skill_blocks_start_at_row_15() {
    let layout = ExportLayout::enhanced();
    let (name, years) = layout.skill_cells(SkillKind::Database, 9);
    assert_eq!((name.to_string(), years.to_string()), ("V24".into(), "AB24".into()));
    let (name, years) = layout.skill_cells(SkillKind::Machine, 0);
    assert_eq!((name.to_string(), years.to_string()), ("AF15".into(), "AL15".into()));
  }

  #[test]
  fn legacy_layout_widens_caps_only() {
    let legacy = ExportLayout::legacy();
    assert_eq!(legacy.max_projects, 10);
    assert_eq!(legacy.tags_per_category, 11);
    assert_eq!(legacy.project_base(9), 37 + 13 * 9);
    assert_eq!(legacy.projects_sheet.as_deref(), Some("Projects"));
    // Eleven tags fit inside one 13-row block.
    assert!(legacy.tag_cell(0, SkillKind::Language, 10).row < legacy.project_base(1));
  }

  #[test]
  fn scalar_cells_are_distinct() {
    let mut cells: Vec<CellRef> = PersonField::ALL.iter().map(|f| f.cell()).collect();
    cells.extend(QUALIFICATION_CELLS);
    let before = cells.len();
    cells.sort();
    cells.dedup();
    assert_eq!(cells.len(), before);
  }
}
