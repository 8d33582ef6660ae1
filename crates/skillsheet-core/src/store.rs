//! Storage traits and the access scope threaded through them.
//!
//! Backends (e.g. `skillsheet-store-sqlite`) implement these traits. The web
//! layer depends on the traits only.

use std::future::Future;

use crate::{
  AccountId, PersonId, ProjectId,
  account::{Account, AccountUpdate, Credentials, NewAccount},
  aggregate::TagDurations,
  person::{PersonFields, SheetSummary},
  project::NewProject,
  session::ProjectUpdate,
  sheet::{NewSkillSheet, SkillSheet},
};

// ─── Scope and layout ────────────────────────────────────────────────────────

/// Which records a caller may see.
///
/// Records outside the scope behave exactly like missing records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
  Unrestricted,
  Owner(AccountId),
}

impl Scope {
  /// Whether a record owned by `owner` is visible. Ownerless records are
  /// only visible unrestricted.
  pub fn permits(self, owner: Option<AccountId>) -> bool {
    match self {
      Scope::Unrestricted => true,
      Scope::Owner(id) => owner == Some(id),
    }
  }

  pub fn owner(self) -> Option<AccountId> {
    match self {
      Scope::Unrestricted => None,
      Scope::Owner(id) => Some(id),
    }
  }
}

/// Which of the two relational shapes a database uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
  /// `basic_info` plus one table per skill kind. No owners.
  Legacy,
  /// `user_info` / `skills` / `projects`.
  Normalized,
}

// ─── Skill sheets ────────────────────────────────────────────────────────────

/// Abstraction over a skill sheet store backend.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait SkillSheetStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The layout detected when the store was opened.
  fn layout(&self) -> LayoutKind;

  /// Persist a new sheet. `owner` is recorded where the layout supports it.
  /// The sheet is normalized before writing and each project's environment
  /// tags are folded into the skill list.
  fn create(
    &self,
    owner: Option<AccountId>,
    sheet: NewSkillSheet,
  ) -> impl Future<Output = Result<PersonId, Self::Error>> + Send + '_;

  /// Summaries of every visible sheet, newest first.
  fn list(
    &self,
    scope: Scope,
  ) -> impl Future<Output = Result<Vec<SheetSummary>, Self::Error>> + Send + '_;

  fn read(
    &self,
    scope: Scope,
    id: PersonId,
  ) -> impl Future<Output = Result<Option<SkillSheet>, Self::Error>> + Send + '_;

  /// Overwrite every person field. Returns `false` if the id is not visible.
  fn update_person(
    &self,
    scope: Scope,
    id: PersonId,
    fields: PersonFields,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Add a project and fold its tags into the skill list.
  fn append_project(
    &self,
    scope: Scope,
    id: PersonId,
    project: NewProject,
    durations: TagDurations,
  ) -> impl Future<Output = Result<Option<ProjectId>, Self::Error>> + Send + '_;

  /// Rewrite existing projects in place. Updates naming a project that does
  /// not belong to the person are skipped.
  fn update_projects(
    &self,
    scope: Scope,
    id: PersonId,
    updates: Vec<ProjectUpdate>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn delete_project(
    &self,
    scope: Scope,
    id: PersonId,
    project_id: ProjectId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Remove the person with every skill and project row.
  fn delete(
    &self,
    scope: Scope,
    id: PersonId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}

// ─── Accounts ────────────────────────────────────────────────────────────────

pub trait AccountStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Fails with a conflict if `login_id` is taken.
  fn create_account(
    &self,
    account: NewAccount,
  ) -> impl Future<Output = Result<Account, Self::Error>> + Send + '_;

  fn list_accounts(&self) -> impl Future<Output = Result<Vec<Account>, Self::Error>> + Send + '_;

  fn account_by_login(
    &self,
    login_id: String,
  ) -> impl Future<Output = Result<Option<Credentials>, Self::Error>> + Send + '_;

  /// Returns `None` if the id does not exist. Fails with a conflict if the
  /// new `login_id` belongs to another account.
  fn update_account(
    &self,
    id: AccountId,
    update: AccountUpdate,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + '_;

  fn delete_account(
    &self,
    id: AccountId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn owner_scope_hides_other_and_ownerless_records() {
    assert!(Scope::Unrestricted.permits(None));
    assert!(Scope::Unrestricted.permits(Some(3)));
    assert!(Scope::Owner(3).permits(Some(3)));
    assert!(!Scope::Owner(3).permits(Some(4)));
    assert!(!Scope::Owner(3).permits(None));
  }
}
