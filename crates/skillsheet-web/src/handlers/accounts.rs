//! Handlers for `/me` and the admin-only `/accounts` endpoints.
//!
//! | Method   | Path             | Notes |
//! |----------|------------------|-------|
//! | `GET`    | `/me`            | The authenticated account |
//! | `GET`    | `/accounts`      | Admin only |
//! | `POST`   | `/accounts`      | Body: `{"login_id","username","password","role"?}`. 201 |
//! | `PUT`    | `/accounts/{id}` | Blank or absent `password` keeps the stored hash |
//! | `DELETE` | `/accounts/{id}` | An admin cannot delete itself. 204 |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use skillsheet_core::{
  AccountId,
  account::{Account, AccountRole, AccountUpdate, NewAccount},
  store::AccountStore,
  validate::{FieldIssue, ValidationError},
};
use tracing::info;

use crate::{
  AppState, Backend,
  auth::{Admin, Principal, check_password, hash_password},
  error::ApiError,
};

/// `GET /me`
pub async fn me(Principal(account): Principal) -> Json<Account> { Json(account) }

/// `GET /accounts`
pub async fn list<S: Backend>(
  State(state): State<AppState<S>>,
  Admin(_): Admin,
) -> Result<Json<Vec<Account>>, ApiError> {
  let accounts = state.store.list_accounts().await.map_err(ApiError::store)?;
  Ok(Json(accounts))
}

fn check_names(login_id: &str, username: &str) -> Result<(), ValidationError> {
  let mut issues = Vec::new();
  if login_id.trim().is_empty() {
    issues.push(FieldIssue::new("login_id", "must not be blank"));
  }
  if username.trim().is_empty() {
    issues.push(FieldIssue::new("username", "must not be blank"));
  }
  ValidationError::check(issues)
}

fn login_taken(login_id: &str) -> ApiError {
  ApiError::Conflict(format!("login id {login_id:?} is already in use"))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub login_id: String,
  pub username: String,
  pub password: String,
  pub role:     Option<AccountRole>,
}

/// `POST /accounts`
pub async fn create<S: Backend>(
  State(state): State<AppState<S>>,
  Admin(admin): Admin,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let login_id = body.login_id.trim().to_string();
  check_names(&login_id, &body.username)?;
  check_password(&body.password)?;

  let existing = state.store.account_by_login(login_id.clone()).await.map_err(ApiError::store)?;
  if existing.is_some() {
    return Err(login_taken(&login_id));
  }

  let account = state
    .store
    .create_account(NewAccount {
      login_id,
      username: body.username.trim().to_string(),
      role: body.role.unwrap_or(AccountRole::General),
      password_hash: hash_password(&body.password)?,
    })
    .await
    .map_err(ApiError::store)?;
  info!(id = account.id, login_id = %account.login_id, by = %admin.login_id, "created account");
  Ok((StatusCode::CREATED, Json(account)))
}

// ─── Update ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UpdateBody {
  pub login_id: String,
  pub username: String,
  pub role:     AccountRole,
  #[serde(default)]
  pub password: Option<String>,
}

/// `PUT /accounts/{id}`
pub async fn update<S: Backend>(
  State(state): State<AppState<S>>,
  Admin(_): Admin,
  Path(id): Path<AccountId>,
  Json(body): Json<UpdateBody>,
) -> Result<Json<Account>, ApiError> {
  let login_id = body.login_id.trim().to_string();
  check_names(&login_id, &body.username)?;

  let password_hash = match body.password.as_deref().filter(|p| !p.is_empty()) {
    Some(password) => {
      check_password(password)?;
      Some(hash_password(password)?)
    }
    None => None,
  };

  let holder = state.store.account_by_login(login_id.clone()).await.map_err(ApiError::store)?;
  if holder.is_some_and(|c| c.account.id != id) {
    return Err(login_taken(&login_id));
  }

  let update = AccountUpdate {
    login_id,
    username: body.username.trim().to_string(),
    role: body.role,
    password_hash,
  };
  state
    .store
    .update_account(id, update)
    .await
    .map_err(ApiError::store)?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound(format!("account {id}")))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /accounts/{id}`
pub async fn delete<S: Backend>(
  State(state): State<AppState<S>>,
  Admin(admin): Admin,
  Path(id): Path<AccountId>,
) -> Result<StatusCode, ApiError> {
  if id == admin.id {
    return Err(ApiError::Forbidden("an account cannot delete itself".into()));
  }
  let deleted = state.store.delete_account(id).await.map_err(ApiError::store)?;
  if !deleted {
    return Err(ApiError::NotFound(format!("account {id}")));
  }
  info!(id, by = %admin.login_id, "deleted account");
  Ok(StatusCode::NO_CONTENT)
}
