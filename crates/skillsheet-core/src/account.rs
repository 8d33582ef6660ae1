//! Login accounts.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::AccountId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountRole {
  Admin,
  General,
}

impl AccountRole {
  /// Value stored in `users.role`.
  pub fn label(self) -> &'static str {
    match self {
      AccountRole::Admin => "管理者",
      AccountRole::General => "一般",
    }
  }

  /// Unknown stored roles read as `General`.
  pub fn from_label(label: &str) -> Self {
    match label.trim() {
      "管理者" | "admin" => AccountRole::Admin,
      _ => AccountRole::General,
    }
  }
}

impl fmt::Display for AccountRole {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

/// A stored account, without its password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
  pub id:         AccountId,
  pub login_id:   String,
  pub username:   String,
  pub role:       AccountRole,
  pub created_at: NaiveDateTime,
}

impl Account {
  pub fn is_admin(&self) -> bool { self.role == AccountRole::Admin }
}

/// An account together with its PHC-format password hash, for verification.
#[derive(Debug, Clone)]
pub struct Credentials {
  pub account:       Account,
  pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewAccount {
  pub login_id:      String,
  pub username:      String,
  pub role:          AccountRole,
  pub password_hash: String,
}

/// Full overwrite of an account row. `password_hash: None` keeps the stored
/// hash.
#[derive(Debug, Clone)]
pub struct AccountUpdate {
  pub login_id:      String,
  pub username:      String,
  pub role:          AccountRole,
  pub password_hash: Option<String>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn role_labels_round_trip() {
    for role in [AccountRole::Admin, AccountRole::General] {
      assert_eq!(AccountRole::from_label(role.label()), role);
    }
    assert_eq!(AccountRole::from_label("guest"), AccountRole::General);
  }
}
