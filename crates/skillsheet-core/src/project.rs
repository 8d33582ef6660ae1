//! Projects: one engagement in a person's history.

use std::{cmp::Ordering, collections::BTreeMap, fmt};

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{ProjectId, skill::{SkillKind, normalize_tag}};

// ─── Phase ──────────────────────────────────────────────────────────────────

/// Process phase, in the fixed display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
  EnvironmentSetup,
  Requirements,
  BasicDesign,
  DetailedDesign,
  Implementation,
  UnitTest,
  IntegrationTest,
  SystemTest,
  Maintenance,
  Other,
}

impl Phase {
  pub const ALL: [Phase; 10] = [
    Phase::EnvironmentSetup,
    Phase::Requirements,
    Phase::BasicDesign,
    Phase::DetailedDesign,
    Phase::Implementation,
    Phase::UnitTest,
    Phase::IntegrationTest,
    Phase::SystemTest,
    Phase::Maintenance,
    Phase::Other,
  ];

  pub fn label(self) -> &'static str {
    match self {
      Phase::EnvironmentSetup => "環境構築",
      Phase::Requirements => "要件",
      Phase::BasicDesign => "基本",
      Phase::DetailedDesign => "詳細",
      Phase::Implementation => "製造",
      Phase::UnitTest => "単体",
      Phase::IntegrationTest => "結合",
      Phase::SystemTest => "総合",
      Phase::Maintenance => "保守運用",
      Phase::Other => "他",
    }
  }

  pub fn from_label(label: &str) -> Option<Self> {
    let label = label.trim();
    Phase::ALL.into_iter().find(|p| p.label() == label)
  }

  pub fn index(self) -> usize { self as usize }
}

/// Ten boolean flags keyed by [`Phase`].
///
/// Serializes as an object with every label present. Deserializes from that
/// object (missing labels false, unknown labels ignored) or from a list of
/// checked labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PhaseFlags([bool; 10]);

impl PhaseFlags {
  pub fn from_checked<I: IntoIterator<Item = Phase>>(phases: I) -> Self {
    let mut flags = PhaseFlags::default();
    for phase in phases {
      flags.set(phase, true);
    }
    flags
  }

  /// Labels that do not name a phase are ignored.
  pub fn from_labels<I, S>(labels: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    Self::from_checked(labels.into_iter().filter_map(|l| Phase::from_label(l.as_ref())))
  }

  pub fn get(&self, phase: Phase) -> bool { self.0[phase.index()] }

  pub fn set(&mut self, phase: Phase, on: bool) { self.0[phase.index()] = on; }

  /// Checked phases in display order.
  pub fn checked(&self) -> impl Iterator<Item = Phase> + '_ {
    Phase::ALL.into_iter().filter(|p| self.get(*p))
  }

  pub fn iter(&self) -> impl Iterator<Item = (Phase, bool)> + '_ {
    Phase::ALL.into_iter().map(|p| (p, self.get(p)))
  }
}

impl Serialize for PhaseFlags {
  fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
    ser.collect_map(self.iter().map(|(p, on)| (p.label(), on)))
  }
}

impl<'de> Deserialize<'de> for PhaseFlags {
  fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
      Map(BTreeMap<String, bool>),
      List(Vec<String>),
    }

    Ok(match Repr::deserialize(de)? {
      Repr::Map(map) => PhaseFlags::from_labels(
        map.into_iter().filter(|(_, on)| *on).map(|(label, _)| label),
      ),
      Repr::List(labels) => PhaseFlags::from_labels(labels),
    })
  }
}

// ─── ProjectRole ────────────────────────────────────────────────────────────

/// Role on a project. Unknown input is kept verbatim as `Custom`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProjectRole {
  Consultant,
  ProjectManagementOffice,
  ProjectManager,
  ProjectLeader,
  SubLeader,
  SystemEngineer,
  Programmer,
  Member,
  #[default]
  Unspecified,
  Custom(String),
}

impl ProjectRole {
  pub const CHOICES: [ProjectRole; 8] = [
    ProjectRole::Consultant,
    ProjectRole::ProjectManagementOffice,
    ProjectRole::ProjectManager,
    ProjectRole::ProjectLeader,
    ProjectRole::SubLeader,
    ProjectRole::SystemEngineer,
    ProjectRole::Programmer,
    ProjectRole::Member,
  ];

  /// Short code, e.g. `PM`.
  pub fn code(&self) -> Option<&'static str> {
    Some(match self {
      ProjectRole::Consultant => "CNSL",
      ProjectRole::ProjectManagementOffice => "PMO",
      ProjectRole::ProjectManager => "PM",
      ProjectRole::ProjectLeader => "PL",
      ProjectRole::SubLeader => "SL",
      ProjectRole::SystemEngineer => "SE",
      ProjectRole::Programmer => "PG",
      ProjectRole::Member => "M",
      ProjectRole::Unspecified | ProjectRole::Custom(_) => return None,
    })
  }

  /// Canonical half-width label written to storage and the document.
  pub fn label(&self) -> &str {
    match self {
      ProjectRole::Consultant => "CNSL(ｺﾝｻﾙﾀﾝﾄ)",
      ProjectRole::ProjectManagementOffice => "PMO(ﾌﾟﾛｼﾞｪｸﾄﾏﾈｰｼﾞﾒﾝﾄｵﾌｨｽ)",
      ProjectRole::ProjectManager => "PM(ﾌﾟﾛｼﾞｪｸﾄﾏﾈｰｼﾞｬｰ)",
      ProjectRole::ProjectLeader => "PL(ﾌﾟﾛｼﾞｪｸﾄﾘｰﾀﾞｰ)",
      ProjectRole::SubLeader => "SL(ｻﾌﾞﾘｰﾀﾞｰ)",
      ProjectRole::SystemEngineer => "SE(ｼｽﾃﾑｴﾝｼﾞﾆｱ)",
      ProjectRole::Programmer => "PG(ﾌﾟﾛｸﾞﾗﾏ)",
      ProjectRole::Member => "M（ﾒﾝﾊﾞｰ）",
      ProjectRole::Unspecified => "",
      ProjectRole::Custom(s) => s,
    }
  }

  /// Accepts the half-width label, the full-width label or the bare code.
  pub fn parse(raw: &str) -> Self {
    let raw = raw.trim();
    if raw.is_empty() {
      return ProjectRole::Unspecified;
    }
    let code = raw
      .split(['(', '（'])
      .next()
      .unwrap_or(raw)
      .trim()
      .to_ascii_uppercase();
    ProjectRole::CHOICES
      .into_iter()
      .find(|role| role.code() == Some(code.as_str()))
      .unwrap_or_else(|| ProjectRole::Custom(raw.to_string()))
  }
}

impl From<String> for ProjectRole {
  fn from(s: String) -> Self { ProjectRole::parse(&s) }
}

impl From<ProjectRole> for String {
  fn from(role: ProjectRole) -> Self { role.label().to_string() }
}

impl fmt::Display for ProjectRole {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

// ─── Industry ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Industry {
  Agriculture,
  Mining,
  Construction,
  Manufacturing,
  InformationCommunication,
  Transport,
  WholesaleRetail,
  FinanceInsurance,
  RealEstate,
  FoodLodging,
  MedicalWelfare,
  Education,
  CompoundServices,
  Services,
  Government,
  Other,
  #[default]
  Unspecified,
  Custom(String),
}

impl Industry {
  pub const CHOICES: [Industry; 16] = [
    Industry::Agriculture,
    Industry::Mining,
    Industry::Construction,
    Industry::Manufacturing,
    Industry::InformationCommunication,
    Industry::Transport,
    Industry::WholesaleRetail,
    Industry::FinanceInsurance,
    Industry::RealEstate,
    Industry::FoodLodging,
    Industry::MedicalWelfare,
    Industry::Education,
    Industry::CompoundServices,
    Industry::Services,
    Industry::Government,
    Industry::Other,
  ];

  pub fn label(&self) -> &str {
    match self {
      Industry::Agriculture => "農林業",
      Industry::Mining => "鉱業",
      Industry::Construction => "建設業",
      Industry::Manufacturing => "製造業",
      Industry::InformationCommunication => "情報通信",
      Industry::Transport => "運輸業",
      Industry::WholesaleRetail => "卸売・小売",
      Industry::FinanceInsurance => "金融・保険",
      Industry::RealEstate => "不動産業",
      Industry::FoodLodging => "飲食・宿泊所",
      Industry::MedicalWelfare => "医療・福祉",
      Industry::Education => "教育・学習",
      Industry::CompoundServices => "複合サービス事業",
      Industry::Services => "サービス業",
      Industry::Government => "公務",
      Industry::Other => "その他（業務詳細に記入）",
      Industry::Unspecified => "",
      Industry::Custom(s) => s,
    }
  }

  pub fn parse(raw: &str) -> Self {
    let raw = raw.trim();
    if raw.is_empty() {
      return Industry::Unspecified;
    }
    if raw.starts_with("その他") {
      return Industry::Other;
    }
    Industry::CHOICES
      .into_iter()
      .find(|i| i.label() == raw)
      .unwrap_or_else(|| Industry::Custom(raw.to_string()))
  }
}

impl From<String> for Industry {
  fn from(s: String) -> Self { Industry::parse(&s) }
}

impl From<Industry> for String {
  fn from(industry: Industry) -> Self { industry.label().to_string() }
}

impl fmt::Display for Industry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

// ─── Periods ────────────────────────────────────────────────────────────────

/// Month-granularity date. Orders chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
  pub year:  i32,
  pub month: u32,
}

impl YearMonth {
  pub fn new(year: i32, month: u32) -> Option<Self> {
    (1..=12).contains(&month).then_some(YearMonth { year, month })
  }

  /// Accepts `yyyy/MM`, `yyyy-MM`, `yyyyMM`, `yyyy/MM/dd` and `yyyy-MM-dd`.
  pub fn parse(raw: &str) -> Option<Self> {
    let raw = raw.trim();
    if raw.len() == 6 && raw.bytes().all(|b| b.is_ascii_digit()) {
      return YearMonth::new(raw[..4].parse().ok()?, raw[4..].parse().ok()?);
    }

    let sep = if raw.contains('/') { '/' } else { '-' };
    let parts: Vec<&str> = raw.split(sep).collect();
    let numeric = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !parts.iter().all(|p| numeric(p)) || parts[0].len() != 4 || parts[1..].iter().any(|p| p.len() > 2) {
      return None;
    }
    match parts.as_slice() {
      [y, m] => YearMonth::new(y.parse().ok()?, m.parse().ok()?),
      [y, m, d] => {
        let date = NaiveDate::from_ymd_opt(y.parse().ok()?, m.parse().ok()?, d.parse().ok()?)?;
        YearMonth::from_date(date)
      }
      _ => None,
    }
  }

  pub fn from_date(date: NaiveDate) -> Option<Self> {
    use chrono::Datelike;
    YearMonth::new(date.year(), date.month())
  }
}

impl fmt::Display for YearMonth {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:04}/{:02}", self.year, self.month)
  }
}

/// End of a project period: a month or the "present" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodEnd {
  Month(YearMonth),
  Present,
}

impl PeriodEnd {
  pub const PRESENT_LABEL: &'static str = "現在";

  pub fn parse(raw: &str) -> Option<Self> {
    let raw = raw.trim();
    if raw == Self::PRESENT_LABEL || raw.eq_ignore_ascii_case("present") {
      return Some(PeriodEnd::Present);
    }
    YearMonth::parse(raw).map(PeriodEnd::Month)
  }
}

impl fmt::Display for PeriodEnd {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PeriodEnd::Month(ym) => ym.fmt(f),
      PeriodEnd::Present => f.write_str(Self::PRESENT_LABEL),
    }
  }
}

// ─── EnvironmentTags ────────────────────────────────────────────────────────

/// Technologies used on a project, one ordered list per [`SkillKind`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentTags {
  #[serde(default)]
  pub languages: Vec<String>,
  #[serde(default)]
  pub tools:     Vec<String>,
  #[serde(default)]
  pub databases: Vec<String>,
  #[serde(default)]
  pub machines:  Vec<String>,
}

impl EnvironmentTags {
  pub fn get(&self, kind: SkillKind) -> &[String] {
    match kind {
      SkillKind::Language => &self.languages,
      SkillKind::Tool => &self.tools,
      SkillKind::Database => &self.databases,
      SkillKind::Machine => &self.machines,
    }
  }

  pub fn get_mut(&mut self, kind: SkillKind) -> &mut Vec<String> {
    match kind {
      SkillKind::Language => &mut self.languages,
      SkillKind::Tool => &mut self.tools,
      SkillKind::Database => &mut self.databases,
      SkillKind::Machine => &mut self.machines,
    }
  }

  pub fn iter(&self) -> impl Iterator<Item = (SkillKind, &[String])> + '_ {
    SkillKind::ALL.into_iter().map(|k| (k, self.get(k)))
  }

  pub fn is_empty(&self) -> bool { self.iter().all(|(_, tags)| tags.is_empty()) }

  /// Every tag normalized, placeholders dropped, order kept.
  pub fn normalized(mut self) -> Self {
    for kind in SkillKind::ALL {
      let tags = self.get_mut(kind);
      *tags = tags
        .iter()
        .map(|t| normalize_tag(t))
        .filter(|t| !t.is_empty())
        .collect();
    }
    self
  }
}

// ─── Project ────────────────────────────────────────────────────────────────

/// The editable content of a project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProject {
  #[serde(default)]
  pub period_start: String,
  #[serde(default)]
  pub period_end:   String,
  #[serde(default)]
  pub system_name:  String,
  #[serde(default)]
  pub work_content: String,
  #[serde(default)]
  pub role:         ProjectRole,
  #[serde(default)]
  pub industry:     Industry,
  #[serde(default)]
  pub headcount:    String,
  #[serde(default)]
  pub phases:       PhaseFlags,
  #[serde(default)]
  pub environment:  EnvironmentTags,
}

impl NewProject {
  pub fn start(&self) -> Option<YearMonth> { YearMonth::parse(&self.period_start) }

  pub fn end(&self) -> Option<PeriodEnd> { PeriodEnd::parse(&self.period_end) }

  pub fn normalized(mut self) -> Self {
    self.period_start = self.period_start.trim().to_string();
    self.period_end = self.period_end.trim().to_string();
    self.headcount = self.headcount.trim().to_string();
    self.environment = self.environment.normalized();
    self
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
  pub id:      ProjectId,
  #[serde(flatten)]
  pub details: NewProject,
}

/// Sorts newest start first. Unparsable starts go last; ties and the
/// unparsable tail fall back to descending id.
pub fn sort_newest_first(projects: &mut [Project]) {
  projects.sort_by(|a, b| match (a.details.start(), b.details.start()) {
    (Some(x), Some(y)) => y.cmp(&x).then(b.id.cmp(&a.id)),
    (Some(_), None) => Ordering::Less,
    (None, Some(_)) => Ordering::Greater,
    (None, None) => b.id.cmp(&a.id),
  });
}

#[cfg(test)]
mod tests {
  use super::*;

  fn project(id: ProjectId, start: &str) -> Project {
    Project {
      id,
      details: NewProject { period_start: start.into(), ..Default::default() },
    }
  }

  #[test]
  fn year_month_accepts_common_forms() {
    let want = YearMonth::new(2021, 4);
    for raw in ["2021/04", "2021-04", "202104", "2021/4", "2021/04/30", "2021-04-01"] {
      assert_eq!(YearMonth::parse(raw), want, "input {raw:?}");
    }
    for raw in ["", "2021", "2021/13", "21/04", "2021/02/30", "April 2021", "2021/04/01/01"] {
      assert_eq!(YearMonth::parse(raw), None, "input {raw:?}");
    }
    assert_eq!(want.unwrap().to_string(), "2021/04");
  }

  #[test]
  fn period_end_accepts_present() {
    assert_eq!(PeriodEnd::parse("現在"), Some(PeriodEnd::Present));
    assert_eq!(PeriodEnd::parse(" Present "), Some(PeriodEnd::Present));
    assert_eq!(
      PeriodEnd::parse("2020/12"),
      Some(PeriodEnd::Month(YearMonth { year: 2020, month: 12 }))
    );
    assert_eq!(PeriodEnd::parse("soon"), None);
  }

  #[test]
  fn newest_first_puts_unparsable_last() {
    let mut projects = vec![
      project(1, "2021/04"),
      project(2, "2019/01"),
      project(3, "unknown"),
      project(4, "2023/07"),
      project(5, ""),
    ];
    sort_newest_first(&mut projects);
    let ids: Vec<_> = projects.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![4, 1, 2, 5, 3]);
  }

  #[test]
  fn phase_flags_default_false_and_ignore_unknown() {
    let flags: PhaseFlags =
      serde_json::from_value(serde_json::json!({"要件": true, "製造": false, "謎": true})).unwrap();
    assert_eq!(flags.checked().collect::<Vec<_>>(), vec![Phase::Requirements]);

    let flags: PhaseFlags = serde_json::from_value(serde_json::json!(["他", "基本"])).unwrap();
    assert_eq!(flags.checked().collect::<Vec<_>>(), vec![Phase::BasicDesign, Phase::Other]);

    let json = serde_json::to_value(flags).unwrap();
    assert_eq!(json.as_object().unwrap().len(), 10);
    assert_eq!(json["環境構築"], false);
    assert_eq!(json["他"], true);
  }

  #[test]
  fn role_parses_every_label_form() {
    assert_eq!(ProjectRole::parse("PM(ﾌﾟﾛｼﾞｪｸﾄﾏﾈｰｼﾞｬｰ)"), ProjectRole::ProjectManager);
    assert_eq!(ProjectRole::parse("PM（プロジェクトマネージャー）"), ProjectRole::ProjectManager);
    assert_eq!(ProjectRole::parse("pmo"), ProjectRole::ProjectManagementOffice);
    assert_eq!(ProjectRole::parse("M（メンバー）"), ProjectRole::Member);
    assert_eq!(ProjectRole::parse(""), ProjectRole::Unspecified);
    assert_eq!(ProjectRole::parse("QA"), ProjectRole::Custom("QA".into()));
    for role in ProjectRole::CHOICES {
      assert_eq!(ProjectRole::parse(role.label()), role);
    }
  }

  #[test]
  fn industry_other_variants_collapse() {
    assert_eq!(Industry::parse("その他"), Industry::Other);
    assert_eq!(Industry::parse("その他（業務詳細に記入）"), Industry::Other);
    assert_eq!(Industry::parse("金融・保険"), Industry::FinanceInsurance);
    assert_eq!(Industry::parse("宇宙"), Industry::Custom("宇宙".into()));
    for industry in Industry::CHOICES {
      assert_eq!(Industry::parse(industry.label()), industry);
    }
  }

  #[test]
  fn environment_normalization_drops_placeholders() {
    let tags = EnvironmentTags {
      languages: vec![" 'Rust' ".into(), "''".into(), "Go".into()],
      databases: vec!["[]".into()],
      ..Default::default()
    }
    .normalized();
    assert_eq!(tags.languages, vec!["Rust".to_string(), "Go".to_string()]);
    assert!(tags.databases.is_empty());
  }
}
