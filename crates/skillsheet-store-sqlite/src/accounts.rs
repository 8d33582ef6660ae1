//! [`AccountStore`] for [`SqliteStore`] over the `users` table.

use rusqlite::{OptionalExtension as _, Row, params};
use tracing::info;

use skillsheet_core::{
  AccountId,
  account::{Account, AccountRole, AccountUpdate, Credentials, NewAccount},
  store::AccountStore,
};

use crate::{Result, SqliteStore, encode::decode_timestamp, encode::text};

struct RawAccount {
  id:            AccountId,
  login_id:      String,
  username:      String,
  role:          String,
  created_at:    String,
  password_hash: String,
}

impl RawAccount {
  fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get("id")?,
      login_id:      text(row, "login_id")?,
      username:      text(row, "username")?,
      role:          text(row, "role")?,
      created_at:    text(row, "created_at")?,
      password_hash: text(row, "password_hash")?,
    })
  }

  fn into_credentials(self) -> Result<Credentials> {
    Ok(Credentials {
      account:       Account {
        id:         self.id,
        login_id:   self.login_id,
        username:   self.username,
        role:       AccountRole::from_label(&self.role),
        created_at: decode_timestamp(&self.created_at)?,
      },
      password_hash: self.password_hash,
    })
  }

  fn into_account(self) -> Result<Account> { Ok(self.into_credentials()?.account) }
}

const SELECT_ACCOUNT: &str =
  "SELECT id, login_id, username, role, created_at, password_hash FROM users";

impl AccountStore for SqliteStore {
  type Error = crate::Error;

  async fn create_account(&self, account: NewAccount) -> Result<Account> {
    let raw = self
      .connection()
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (login_id, password_hash, username, role)
           VALUES (?1, ?2, ?3, ?4)",
          params![
            account.login_id.trim(),
            account.password_hash,
            account.username.trim(),
            account.role.label()
          ],
        )?;
        let id = conn.last_insert_rowid();
        Ok(conn.query_row(
          &format!("{SELECT_ACCOUNT} WHERE id = ?1"),
          params![id],
          RawAccount::from_row,
        )?)
      })
      .await?;
    let account = raw.into_account()?;
    info!(id = account.id, login_id = %account.login_id, "created account");
    Ok(account)
  }

  async fn list_accounts(&self) -> Result<Vec<Account>> {
    let raw = self
      .connection()
      .call(|conn| {
        let mut stmt = conn.prepare(&format!("{SELECT_ACCOUNT} ORDER BY id"))?;
        let rows = stmt
          .query_map([], RawAccount::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raw.into_iter().map(RawAccount::into_account).collect()
  }

  async fn account_by_login(&self, login_id: String) -> Result<Option<Credentials>> {
    let raw = self
      .connection()
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("{SELECT_ACCOUNT} WHERE login_id = ?1"),
              params![login_id.trim()],
              RawAccount::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawAccount::into_credentials).transpose()
  }

  async fn update_account(&self, id: AccountId, update: AccountUpdate) -> Result<Option<Account>> {
    let raw = self
      .connection()
      .call(move |conn| {
        let changed = match &update.password_hash {
          Some(hash) => conn.execute(
            "UPDATE users SET login_id = ?2, username = ?3, role = ?4, password_hash = ?5
             WHERE id = ?1",
            params![
              id,
              update.login_id.trim(),
              update.username.trim(),
              update.role.label(),
              hash
            ],
          )?,
          None => conn.execute(
            "UPDATE users SET login_id = ?2, username = ?3, role = ?4 WHERE id = ?1",
            params![id, update.login_id.trim(), update.username.trim(), update.role.label()],
          )?,
        };
        if changed == 0 {
          return Ok(None);
        }
        Ok(Some(conn.query_row(
          &format!("{SELECT_ACCOUNT} WHERE id = ?1"),
          params![id],
          RawAccount::from_row,
        )?))
      })
      .await?;
    raw.map(RawAccount::into_account).transpose()
  }

  async fn delete_account(&self, id: AccountId) -> Result<bool> {
    let deleted = self
      .connection()
      .call(move |conn| Ok(conn.execute("DELETE FROM users WHERE id = ?1", params![id])? > 0))
      .await?;
    if deleted {
      info!(id, "deleted account");
    }
    Ok(deleted)
  }
}
