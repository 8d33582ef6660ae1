//! Skill aggregation: folding a project's environment tags into a person's
//! skill list.
//!
//! [`aggregate`] is pure. It reports what should change and the store applies
//! the changes in the same transaction as the project write.

use serde::{Deserialize, Serialize};

use crate::{
  project::EnvironmentTags,
  skill::{Experience, Skill, SkillKind, normalize_tag},
};

/// Explicit duration for one tag, entered as whole years plus months.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDuration {
  pub kind:   SkillKind,
  pub name:   String,
  #[serde(default)]
  pub years:  u32,
  #[serde(default)]
  pub months: u32,
}

impl TagDuration {
  pub fn experience(&self) -> Experience {
    Experience::from_years_months(self.years, self.months)
  }
}

/// Per-(kind, normalized tag) explicit durations. Later entries win.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagDurations(Vec<TagDuration>);

impl TagDurations {
  pub fn new() -> Self { Self::default() }

  pub fn set(&mut self, kind: SkillKind, name: &str, years: u32, months: u32) {
    let name = normalize_tag(name);
    self.0.retain(|d| !(d.kind == kind && normalize_tag(&d.name) == name));
    self.0.push(TagDuration { kind, name, years, months });
  }

  pub fn get(&self, kind: SkillKind, name: &str) -> Option<Experience> {
    let name = normalize_tag(name);
    self
      .0
      .iter()
      .rev()
      .find(|d| d.kind == kind && normalize_tag(&d.name) == name)
      .map(TagDuration::experience)
  }

  pub fn iter(&self) -> impl Iterator<Item = &TagDuration> { self.0.iter() }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

impl FromIterator<TagDuration> for TagDurations {
  fn from_iter<I: IntoIterator<Item = TagDuration>>(iter: I) -> Self {
    let mut out = TagDurations::new();
    for d in iter {
      out.set(d.kind, &d.name, d.years, d.months);
    }
    out
  }
}

/// One change to apply to the stored skill list.
#[derive(Debug, Clone, PartialEq)]
pub enum SkillChange {
  /// Add a skill that did not exist for this kind.
  Insert(Skill),
  /// Overwrite the experience of an existing skill. `stored_name` is the
  /// name as currently persisted, which may differ from the normalized
  /// `skill.name`.
  Update { stored_name: String, skill: Skill },
}

impl SkillChange {
  pub fn skill(&self) -> &Skill {
    match self {
      SkillChange::Insert(skill) | SkillChange::Update { skill, .. } => skill,
    }
  }

  fn skill_mut(&mut self) -> &mut Skill {
    match self {
      SkillChange::Insert(skill) | SkillChange::Update { skill, .. } => skill,
    }
  }
}

/// Computes the skill changes implied by a project's environment tags.
///
/// - A tag with an explicit duration overwrites (never adds to) the stored
///   experience, or inserts with that duration.
/// - A tag without one leaves an existing skill alone and otherwise inserts
///   at zero.
/// - Repeated tags collapse into one change; the last explicit duration wins.
/// - Skills are never removed.
pub fn aggregate(
  existing: &[Skill],
  tags: &EnvironmentTags,
  durations: &TagDurations,
) -> Vec<SkillChange> {
  let mut changes: Vec<SkillChange> = Vec::new();

  for (kind, names) in tags.iter() {
    for raw in names {
      let name = normalize_tag(raw);
      if name.is_empty() {
        continue;
      }
      let explicit = durations.get(kind, &name);

      if let Some(queued) = changes
        .iter_mut()
        .find(|c| c.skill().kind == kind && c.skill().name == name)
      {
        if let Some(experience) = explicit {
          queued.skill_mut().experience = experience;
        }
        continue;
      }

      let stored = existing.iter().find(|s| s.matches(kind, &name));
      match (stored, explicit) {
        (Some(stored), Some(experience)) => changes.push(SkillChange::Update {
          stored_name: stored.name.clone(),
          skill:       Skill::new(kind, name, experience),
        }),
        (Some(_), None) => {}
        (None, experience) => changes.push(SkillChange::Insert(Skill::new(
          kind,
          name,
          experience.unwrap_or_default(),
        ))),
      }
    }
  }

  changes
}

/// Applies changes to an in-memory skill list the way the store applies
/// them to rows.
pub fn apply(skills: &mut Vec<Skill>, changes: Vec<SkillChange>) {
  for change in changes {
    match change {
      SkillChange::Insert(skill) => skills.push(skill),
      SkillChange::Update { stored_name, skill } => {
        match skills.iter_mut().find(|s| s.kind == skill.kind && s.name == stored_name) {
          Some(slot) => *slot = skill,
          None => skills.push(skill),
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn tags(languages: &[&str]) -> EnvironmentTags {
    EnvironmentTags {
      languages: languages.iter().map(|s| s.to_string()).collect(),
      ..Default::default()
    }
  }

  fn durations(entries: &[(&str, u32, u32)]) -> TagDurations {
    let mut d = TagDurations::new();
    for (name, years, months) in entries {
      d.set(SkillKind::Language, name, *years, *months);
    }
    d
  }

  #[test]
  fn explicit_duration_overwrites_instead_of_adding() {
    let mut skills = Vec::new();
    let changes = aggregate(&skills, &tags(&["Rust"]), &durations(&[("Rust", 1, 0)]));
    apply(&mut skills, changes);
    let changes = aggregate(&skills, &tags(&["'Rust'"]), &durations(&[("Rust", 2, 6)]));
    apply(&mut skills, changes);

    assert_eq!(skills.len(), 1);
    assert_eq!(skills[0].name, "Rust");
    assert_eq!(skills[0].experience.years_months(), (2, 6));
  }

  #[test]
  fn missing_duration_keeps_existing_and_inserts_new_at_zero() {
    let existing = vec![Skill::new(SkillKind::Language, "Go", Experience::from_years(3.0))];
    let changes = aggregate(&existing, &tags(&["Go", "Zig"]), &TagDurations::new());
    assert_eq!(
      changes,
      vec![SkillChange::Insert(Skill::new(SkillKind::Language, "Zig", Experience::ZERO))]
    );
  }

  #[test]
  fn update_carries_stored_name() {
    let existing = vec![Skill::new(SkillKind::Language, " \"Java\" ", Experience::ZERO)];
    let changes = aggregate(&existing, &tags(&["Java"]), &durations(&[("Java", 4, 0)]));
    assert_eq!(changes, vec![SkillChange::Update {
      stored_name: " \"Java\" ".into(),
      skill:       Skill::new(SkillKind::Language, "Java", Experience::from_years(4.0)),
    }]);
  }

  #[test]
  fn duplicate_tags_collapse() {
    let tags = tags(&["Python", " Python", "[Python]"]);
    let changes = aggregate(&[], &tags, &durations(&[("Python", 1, 0)]));
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].skill().experience.years_months(), (1, 0));
  }

  #[test]
  fn later_duration_entry_wins() {
    let d = durations(&[("Rust", 1, 0), (" Rust ", 5, 0)]);
    assert_eq!(d.get(SkillKind::Language, "Rust").unwrap().years_months(), (5, 0));
    assert_eq!(d.iter().count(), 1);
  }

  #[test]
  fn durations_are_per_kind() {
    let mut d = TagDurations::new();
    d.set(SkillKind::Tool, "Docker", 2, 0);
    let changes = aggregate(
      &[],
      &EnvironmentTags { languages: vec!["Docker".into()], tools: vec!["Docker".into()], ..Default::default() },
      &d,
    );
    assert_eq!(changes.len(), 2);
    assert_eq!(changes[0].skill().experience, Experience::ZERO);
    assert_eq!(changes[1].skill().experience.years_months(), (2, 0));
  }

  #[test]
  fn no_cap_on_aggregated_tags() {
    let names: Vec<String> = (0..12).map(|i| format!("lang{i}")).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let changes = aggregate(&[], &tags(&refs), &TagDurations::new());
    assert_eq!(changes.len(), 12);
  }

  #[test]
  fn removed_tags_never_delete_skills() {
    let mut skills = vec![
      Skill::new(SkillKind::Language, "Perl", Experience::from_years(1.0)),
      Skill::new(SkillKind::Language, "Ruby", Experience::from_years(2.0)),
    ];
    let changes = aggregate(&skills, &tags(&["Ruby"]), &TagDurations::new());
    apply(&mut skills, changes);
    assert_eq!(skills.len(), 2);
  }
}
