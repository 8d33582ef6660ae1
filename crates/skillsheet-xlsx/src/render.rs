//! Document Renderer: template in, filled workbook bytes out.

use std::{
  fs,
  io::{self, Cursor},
  path::{Path, PathBuf},
};

use chrono::{Local, NaiveDateTime};
use tracing::{debug, info, warn};
use umya_spreadsheet::{Spreadsheet, reader, writer};

use skillsheet_core::sheet::SkillSheet;

use crate::{
  cell::CellRef,
  error::{ExportError, Result},
  mapping::ExportLayout,
  sink::{CellSink, XlsxSink},
};

/// Progress of one export. A failed export reports the phase it was in via
/// [`ExportError::phase`] and must be restarted from `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportPhase {
  Idle,
  TemplateLoaded,
  FieldsWritten,
  Saved,
  Done,
}

/// A finished export.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
  pub bytes:     Vec<u8>,
  /// Cells the template refused, in write order.
  pub skipped:   Vec<CellRef>,
  /// Where the bytes were also written, when an output directory is set.
  pub path:      Option<PathBuf>,
  /// Suggested download name.
  pub file_name: String,
}

#[derive(Debug, Clone, Default)]
pub struct Renderer {
  layout:     ExportLayout,
  output_dir: Option<PathBuf>,
}

impl Renderer {
  pub fn new(layout: ExportLayout) -> Self { Self { layout, output_dir: None } }

  /// Also write every rendered document into `dir`.
  pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.output_dir = Some(dir.into());
    self
  }

  pub fn layout(&self) -> &ExportLayout { &self.layout }

  /// Write every mapped cell of `sheet` into `sink`, returning the cells the
  /// sink refused. A refused write is logged and skipped.
  pub fn map(&self, sheet: &SkillSheet, sink: &mut impl CellSink) -> Vec<CellRef> {
    let mut skipped = Vec::new();
    for write in self.layout.cell_writes(sheet) {
      if let Err(e) = sink.write(write.cell, &write.value) {
        warn!(cell = %write.cell, error = %e, "skipping cell");
        skipped.push(write.cell);
      }
    }
    skipped
  }

  pub fn render(&self, sheet: &SkillSheet, template: &Path) -> Result<RenderedDocument> {
    self.render_at(sheet, template, Local::now().naive_local())
  }

  /// [`render`](Self::render) with an explicit clock for the output file
  /// name.
  pub fn render_at(
    &self,
    sheet: &SkillSheet,
    template: &Path,
    now: NaiveDateTime,
  ) -> Result<RenderedDocument> {
    let mut phase = ExportPhase::Idle;
    debug!(?phase, template = %template.display(), "starting export");

    // The template is read into memory and never opened for writing.
    let mut book = load_template(template)?;
    phase = ExportPhase::TemplateLoaded;
    debug!(?phase);

    let active = book.get_workbook_view().get_active_tab().to_owned() as usize;
    let sheet_ws = book.get_sheet_mut(&active).ok_or(ExportError::NoWorksheet)?;
    let skipped = self.map(sheet, &mut XlsxSink::new(sheet_ws));
    if let Some(name) = &self.layout.projects_sheet {
      self.write_projects_sheet(&mut book, name, sheet);
    }
    phase = ExportPhase::FieldsWritten;
    debug!(?phase, skipped = skipped.len());

    let mut buf = Cursor::new(Vec::new());
    writer::xlsx::write_writer(&book, &mut buf).map_err(|e| ExportError::Save(e.to_string()))?;
    let bytes = buf.into_inner();
    phase = ExportPhase::Saved;
    debug!(?phase, bytes = bytes.len());

    let person = &sheet.person.fields.name;
    let path = match &self.output_dir {
      Some(dir) => {
        let path = dir.join(output_file_name(person, now));
        write_output(&path, &bytes)?;
        Some(path)
      }
      None => None,
    };
    phase = ExportPhase::Done;

    info!(
      ?phase,
      person = sheet.person.id,
      skipped = skipped.len(),
      path = ?path,
      "export saved"
    );
    Ok(RenderedDocument { bytes, skipped, path, file_name: download_name(person) })
  }

  /// Replace the contents of the tabular projects sheet, creating it when
  /// the template lacks one.
  fn write_projects_sheet(&self, book: &mut Spreadsheet, name: &str, sheet: &SkillSheet) {
    if book.get_sheet_by_name(name).is_none() {
      if let Err(e) = book.new_sheet(name) {
        warn!(sheet = name, error = e, "cannot add projects sheet");
        return;
      }
    }
    let Some(ws) = book.get_sheet_by_name_mut(name) else {
      return;
    };

    let stale = ws.get_highest_row();
    if stale > 0 {
      ws.remove_row(&1, &stale);
    }

    let mut sink = XlsxSink::new(ws);
    for (r, row) in self.layout.projects_table(sheet).iter().enumerate() {
      for (c, value) in row.iter().enumerate() {
        let cell = CellRef::new(c as u32 + 1, r as u32 + 1);
        if let Err(e) = sink.write(cell, value) {
          warn!(sheet = name, %cell, error = %e, "skipping cell");
        }
      }
    }
  }
}

fn load_template(path: &Path) -> Result<Spreadsheet> {
  let bytes = fs::read(path).map_err(|e| match e.kind() {
    io::ErrorKind::NotFound => ExportError::TemplateMissing { path: path.to_owned() },
    _ => ExportError::Load { path: path.to_owned(), message: e.to_string() },
  })?;
  reader::xlsx::read_reader(Cursor::new(bytes), true)
    .map_err(|e| ExportError::Load { path: path.to_owned(), message: e.to_string() })
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
  let fail = |source| ExportError::Output { path: path.to_owned(), source };
  if let Some(dir) = path.parent() {
    fs::create_dir_all(dir).map_err(fail)?;
  }
  fs::write(path, bytes).map_err(fail)
}

/// Person names end up in file names; path separators and other characters
/// Windows refuses become `_`.
fn file_safe(name: &str) -> String {
  let cleaned: String = name
    .trim()
    .chars()
    .map(|c| match c {
      '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
      c if c.is_whitespace() || c.is_control() => '_',
      c => c,
    })
    .collect();
  if cleaned.is_empty() { "unnamed".to_string() } else { cleaned }
}

/// `SkillSheetOutput_<name>_<yyyymmdd_HHMMSS>.xlsx`
pub fn output_file_name(name: &str, now: NaiveDateTime) -> String {
  format!("SkillSheetOutput_{}_{}.xlsx", file_safe(name), now.format("%Y%m%d_%H%M%S"))
}

/// `<name>SkillSheet.xlsx`
pub fn download_name(name: &str) -> String { format!("{}SkillSheet.xlsx", file_safe(name)) }

#[cfg(test)]
mod tests {
  use chrono::{NaiveDate, NaiveDateTime};
  use skillsheet_core::{
    person::{Gender, Person, PersonFields},
    project::{NewProject, Phase, PhaseFlags, Project, ProjectRole},
    skill::{Experience, Skill, SkillKind},
  };

  use super::*;
  use crate::sink::GridSink;

  fn stamp() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 6).unwrap().and_hms_opt(7, 8, 9).unwrap()
  }

  fn project(id: i64, start: &str) -> Project {
    Project {
      id,
      details: NewProject {
        period_start: start.into(),
        period_end: "現在".into(),
        system_name: format!("system {start}"),
        role: ProjectRole::parse("PG"),
        headcount: "5".into(),
        phases: PhaseFlags::from_checked([Phase::Implementation, Phase::UnitTest]),
        ..Default::default()
      },
    }
  }

  fn sheet() -> SkillSheet {
    SkillSheet {
      person:   Person {
        id:         1,
        fields:     PersonFields {
          name:            "山田 太郎".into(),
          name_kana:       "ヤマダ タロウ".into(),
          gender:          Gender::Male,
          birth_date:      NaiveDate::from_ymd_opt(1990, 4, 1).unwrap(),
          transportation:  "JR山手線".into(),
          nearest_station: "新宿".into(),
          access_method:   "徒歩".into(),
          access_time:     "10".into(),
          final_education: "○○大学".into(),
          graduation_date: "2013/03".into(),
          self_pr:         "よろしくお願いします".into(),
          qualifications:  vec!["基本情報".into(), "応用情報".into()],
        },
        created_at: stamp(),
        owner:      None,
      },
      skills:   vec![
        Skill::new(SkillKind::Language, "Rust", Experience::from_years_months(3, 4)),
        Skill::new(SkillKind::Language, "Python", Experience::from_years_months(2, 0)),
        Skill::new(SkillKind::Database, "PostgreSQL", Experience::from_years_months(0, 6)),
      ],
      projects: vec![project(1, "2021/04"), project(2, "2019/01"), project(3, "2023/07")],
    }
  }

  #[test]
  fn writes_person_fields_and_formatted_skills() {
    let mut grid = GridSink::new();
    let skipped = Renderer::default().map(&sheet(), &mut grid);
    assert!(skipped.is_empty());

    assert_eq!(grid.value("E5"), "山田 太郎");
    assert_eq!(grid.value("Q5"), "男");
    assert_eq!(grid.value("AV1"), "1990/04/01");
    assert_eq!(grid.value("B11"), "応用情報");
    assert_eq!(grid.value("B15"), "Rust");
    assert_eq!(grid.value("H15"), "3年4ヶ月");
    assert_eq!(grid.value("H16"), "2年");
    assert_eq!(grid.value("V15"), "PostgreSQL");
    assert_eq!(grid.value("AB15"), "6ヶ月");
  }

  #[test]
  fn projects_render_newest_first() {
    let mut grid = GridSink::new();
    Renderer::default().map(&sheet(), &mut grid);
    assert_eq!(grid.value("D37"), "2023/07");
    assert_eq!(grid.value("D50"), "2021/04");
    assert_eq!(grid.value("D63"), "2019/01");
    assert_eq!(grid.value("J40"), "system 2023/07");
    assert_eq!(grid.value("T39"), "PG(ﾌﾟﾛｸﾞﾗﾏ)");
    assert_eq!(grid.value("R38"), "●");
    assert_eq!(grid.value("T38"), "●");
    assert_eq!(grid.value("J38"), "");
  }

  #[test]
  fn environment_tags_truncate_to_block_cap() {
    let mut s = sheet();
    s.projects = vec![project(1, "2022/01")];
    s.projects[0].details.environment.languages = (1..=12).map(|i| format!("lang{i}")).collect();

    let mut grid = GridSink::new();
    Renderer::default().map(&s, &mut grid);
    assert_eq!(grid.value("AD39"), "lang1");
    assert_eq!(grid.value("AD41"), "lang3");
    assert!(grid.get(CellRef::parse("AD42").unwrap()).is_none());

    let mut grid = GridSink::new();
    Renderer::new(ExportLayout::legacy()).map(&s, &mut grid);
    assert_eq!(grid.value("AD49"), "lang11");
    assert!(grid.get(CellRef::parse("AD50").unwrap()).is_none());
  }

  #[test]
  fn unused_slots_are_blanked() {
    let mut s = sheet();
    s.projects.truncate(1);
    s.person.fields.qualifications.clear();

    let mut grid = GridSink::new();
    for address in ["B10", "B16", "H16", "D50", "J53", "AD52", "L51"] {
      grid.write(CellRef::parse(address).unwrap(), "stale").unwrap();
    }
    Renderer::default().map(&s, &mut grid);
    for address in ["B10", "D50", "J53", "AD52", "L51"] {
      assert_eq!(grid.value(address), "", "{address}");
    }
    // Python still occupies the second language slot.
    assert_eq!(grid.value("B16"), "Python");
  }

  #[test]
  fn blocked_cells_are_skipped_and_reported() {
    let mut grid = GridSink::new().with_merged("AD39:AF41");
    let mut s = sheet();
    s.projects[2].details.environment.languages = vec!["Rust".into(), "Go".into()];

    let skipped = Renderer::default().map(&s, &mut grid);
    assert_eq!(
      skipped.iter().map(|c| c.to_string()).collect::<Vec<_>>(),
      vec!["AD40", "AD41"]
    );
    assert_eq!(grid.value("AD39"), "Rust");
    // Writes after the blocked cells still happened.
    assert_eq!(grid.value("D50"), "2021/04");
  }

  // ─── Workbook round trips ──────────────────────────────────────────────────

  fn write_template(dir: &Path) -> PathBuf {
    let mut book = umya_spreadsheet::new_file();
    let ws = book.get_sheet_mut(&0).unwrap();
    ws.get_cell_mut("A1").set_value_string("スキルシート");
    ws.get_cell_mut("AD40").set_value_string("old");
    ws.add_merge_cells("J40:AC44");
    ws.add_merge_cells("AG39:AI41");
    let path = dir.join("template.xlsx");
    umya_spreadsheet::writer::xlsx::write(&book, &path).unwrap();
    path
  }

  fn read_back(bytes: &[u8]) -> Spreadsheet {
    reader::xlsx::read_reader(Cursor::new(bytes.to_vec()), true).unwrap()
  }

  #[test]
  fn renders_into_copy_of_template() {
    let dir = tempfile::tempdir().unwrap();
    let template = write_template(dir.path());
    let before = fs::read(&template).unwrap();

    let out = dir.path().join("out");
    let doc = Renderer::default()
      .with_output_dir(&out)
      .render_at(&sheet(), &template, stamp())
      .unwrap();

    assert_eq!(fs::read(&template).unwrap(), before);
    let path = doc.path.clone().unwrap();
    assert_eq!(path.file_name().unwrap(), "SkillSheetOutput_山田_太郎_20240506_070809.xlsx");
    assert_eq!(fs::read(&path).unwrap(), doc.bytes);
    assert_eq!(doc.file_name, "山田_太郎SkillSheet.xlsx");

    let book = read_back(&doc.bytes);
    let ws = book.get_sheet(&0).unwrap();
    assert_eq!(ws.get_value("A1"), "スキルシート");
    assert_eq!(ws.get_value("E5"), "山田 太郎");
    assert_eq!(ws.get_value("D37"), "2023/07");
    assert_eq!(ws.get_value("J40"), "system 2023/07");
    assert_eq!(ws.get_value("AD40"), "");
    // J40 anchors its merge; the second and third tool slots sit under AG39.
    assert_eq!(
      doc.skipped.iter().map(|c| c.to_string()).collect::<Vec<_>>(),
      vec!["AG40", "AG41"]
    );
  }

  #[test]
  fn renders_into_the_active_worksheet() {
    let dir = tempfile::tempdir().unwrap();
    let mut book = umya_spreadsheet::new_file();
    book.get_sheet_mut(&0).unwrap().get_cell_mut("A1").set_value_string("表紙");
    book.new_sheet("スキルシート").unwrap();
    book.set_active_sheet(1);
    let template = dir.path().join("template.xlsx");
    umya_spreadsheet::writer::xlsx::write(&book, &template).unwrap();

    let doc = Renderer::default().render(&sheet(), &template).unwrap();
    let book = read_back(&doc.bytes);
    let cover = book.get_sheet(&0).unwrap();
    assert_eq!(cover.get_value("A1"), "表紙");
    assert_eq!(cover.get_value("E5"), "");
    let sheet_ws = book.get_sheet_by_name("スキルシート").unwrap();
    assert_eq!(sheet_ws.get_value("E5"), "山田 太郎");
  }

  #[test]
  fn legacy_layout_adds_projects_table() {
    let dir = tempfile::tempdir().unwrap();
    let template = write_template(dir.path());

    let doc = Renderer::new(ExportLayout::legacy()).render(&sheet(), &template).unwrap();
    assert!(doc.path.is_none());

    let book = read_back(&doc.bytes);
    let table = book.get_sheet_by_name("Projects").unwrap();
    assert_eq!(table.get_value("A1"), "開始(yyyy/MM)");
    assert_eq!(table.get_value("A2"), "2023/07");
    assert_eq!(table.get_value("A4"), "2019/01");
    assert_eq!(table.get_value("A5"), "");
  }

  #[test]
  fn missing_template_fails_before_anything_is_written() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let err = Renderer::default()
      .with_output_dir(&out)
      .render(&sheet(), &dir.path().join("nope.xlsx"))
      .unwrap_err();
    assert!(matches!(err, ExportError::TemplateMissing { .. }));
    assert_eq!(err.phase(), ExportPhase::TemplateLoaded);
    assert!(!out.exists());
  }

  #[test]
  fn unreadable_template_is_a_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.xlsx");
    fs::write(&path, b"not a zip").unwrap();
    let err = Renderer::default().render(&sheet(), &path).unwrap_err();
    assert!(matches!(err, ExportError::Load { .. }));
  }

  #[test]
  fn file_names_replace_unsafe_characters() {
    assert_eq!(output_file_name("a/b:c", stamp()), "SkillSheetOutput_a_b_c_20240506_070809.xlsx");
    assert_eq!(download_name("  "), "unnamedSkillSheet.xlsx");
  }
}
