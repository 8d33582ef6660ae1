//! Whole skill sheets: the form record and the assembled read model.

use serde::{Deserialize, Serialize};

use crate::{
  person::{Person, PersonFields},
  project::{NewProject, Project, sort_newest_first},
  skill::{Skill, normalize_tag},
};

/// What a form submission or `create` call carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSkillSheet {
  pub person:   PersonFields,
  #[serde(default)]
  pub skills:   Vec<Skill>,
  #[serde(default)]
  pub projects: Vec<NewProject>,
}

impl NewSkillSheet {
  /// Applies tag and field normalization. Skills whose name normalizes to
  /// nothing are dropped.
  pub fn normalized(self) -> Self {
    Self {
      person:   self.person.normalized(),
      skills:   self
        .skills
        .into_iter()
        .filter_map(|s| {
          let name = normalize_tag(&s.name);
          (!name.is_empty()).then(|| Skill { name, ..s })
        })
        .collect(),
      projects: self.projects.into_iter().map(NewProject::normalized).collect(),
    }
  }
}

/// A person with every skill and project, as read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillSheet {
  pub person:   Person,
  pub skills:   Vec<Skill>,
  pub projects: Vec<Project>,
}

impl SkillSheet {
  /// Projects in export order.
  pub fn projects_newest_first(&self) -> Vec<Project> {
    let mut projects = self.projects.clone();
    sort_newest_first(&mut projects);
    projects
  }
}
