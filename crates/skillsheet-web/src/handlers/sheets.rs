//! Handlers for `/sheets` endpoints.
//!
//! | Method   | Path           | Notes |
//! |----------|----------------|-------|
//! | `GET`    | `/sheets`      | Summaries, newest first |
//! | `POST`   | `/sheets`      | Body: a full sheet. 201 `{"id": …}` |
//! | `GET`    | `/sheets/{id}` | Person, skills and projects |
//! | `PUT`    | `/sheets/{id}` | Body: person fields. 204 |
//! | `DELETE` | `/sheets/{id}` | Removes skills and projects too. 204 |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde_json::json;
use skillsheet_core::{
  PersonId,
  person::{PersonFields, SheetSummary},
  sheet::{NewSkillSheet, SkillSheet},
  store::SkillSheetStore,
};
use tracing::info;

use super::{sheet_not_found, today};
use crate::{AppState, Backend, auth::Principal, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /sheets`
pub async fn list<S: Backend>(
  State(state): State<AppState<S>>,
  Principal(account): Principal,
) -> Result<Json<Vec<SheetSummary>>, ApiError> {
  let sheets = state.store.list(state.scope(&account)).await.map_err(ApiError::store)?;
  Ok(Json(sheets))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /sheets`
pub async fn create<S: Backend>(
  State(state): State<AppState<S>>,
  Principal(account): Principal,
  Json(sheet): Json<NewSkillSheet>,
) -> Result<impl IntoResponse, ApiError> {
  sheet.validate(today())?;
  let id = state.store.create(Some(account.id), sheet).await.map_err(ApiError::store)?;
  info!(id, login_id = %account.login_id, "created skill sheet");
  Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /sheets/{id}`
pub async fn get_one<S: Backend>(
  State(state): State<AppState<S>>,
  Principal(account): Principal,
  Path(id): Path<PersonId>,
) -> Result<Json<SkillSheet>, ApiError> {
  state
    .store
    .read(state.scope(&account), id)
    .await
    .map_err(ApiError::store)?
    .map(Json)
    .ok_or_else(|| sheet_not_found(id))
}

// ─── Update person ────────────────────────────────────────────────────────────

/// `PUT /sheets/{id}`
pub async fn update<S: Backend>(
  State(state): State<AppState<S>>,
  Principal(account): Principal,
  Path(id): Path<PersonId>,
  Json(fields): Json<PersonFields>,
) -> Result<StatusCode, ApiError> {
  fields.validate(today())?;
  let updated = state
    .store
    .update_person(state.scope(&account), id, fields)
    .await
    .map_err(ApiError::store)?;
  if !updated {
    return Err(sheet_not_found(id));
  }
  Ok(StatusCode::NO_CONTENT)
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /sheets/{id}`
pub async fn delete<S: Backend>(
  State(state): State<AppState<S>>,
  Principal(account): Principal,
  Path(id): Path<PersonId>,
) -> Result<StatusCode, ApiError> {
  let deleted = state.store.delete(state.scope(&account), id).await.map_err(ApiError::store)?;
  if !deleted {
    return Err(sheet_not_found(id));
  }
  state.edits.forget_person(id).await;
  info!(id, login_id = %account.login_id, "deleted skill sheet");
  Ok(StatusCode::NO_CONTENT)
}
