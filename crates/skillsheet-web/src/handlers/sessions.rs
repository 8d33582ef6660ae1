//! Handlers for edit sessions.
//!
//! | Method   | Path                             | Notes |
//! |----------|----------------------------------|-------|
//! | `POST`   | `/sheets/{id}/edit`              | Opens a session. 201 with the drafts |
//! | `GET`    | `/edits/{sid}`                   | Current drafts |
//! | `DELETE` | `/edits/{sid}`                   | Discards. 204 |
//! | `PATCH`  | `/edits/{sid}/projects/{index}`  | Body: field-level patch. Returns the draft |
//! | `POST`   | `/edits/{sid}/submit`            | Writes all drafts back. 204 |
//!
//! Sessions are only visible to the account that opened them.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Serialize;
use skillsheet_core::{
  PersonId,
  session::{EditSession, ProjectDraft, ProjectPatch},
  store::SkillSheetStore,
};
use tracing::info;
use uuid::Uuid;

use super::{projects::validate_updates, sheet_not_found};
use crate::{AppState, Backend, auth::Principal, error::ApiError};

#[derive(Debug, Serialize)]
pub struct SessionView {
  pub id:        Uuid,
  pub person_id: PersonId,
  pub drafts:    Vec<ProjectDraft>,
}

impl SessionView {
  fn of(id: Uuid, session: &EditSession) -> Self {
    Self { id, person_id: session.person_id(), drafts: session.drafts().to_vec() }
  }
}

fn session_not_found(id: Uuid) -> ApiError { ApiError::NotFound(format!("edit session {id}")) }

// ─── Open ─────────────────────────────────────────────────────────────────────

/// `POST /sheets/{id}/edit`
pub async fn open<S: Backend>(
  State(state): State<AppState<S>>,
  Principal(account): Principal,
  Path(id): Path<PersonId>,
) -> Result<impl IntoResponse, ApiError> {
  let sheet = state
    .store
    .read(state.scope(&account), id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| sheet_not_found(id))?;

  let session = EditSession::open(&sheet);
  let view_drafts = session.drafts().to_vec();
  let sid = state.edits.open(account.id, session).await;
  Ok((StatusCode::CREATED, Json(SessionView { id: sid, person_id: id, drafts: view_drafts })))
}

// ─── View / discard ───────────────────────────────────────────────────────────

/// `GET /edits/{sid}`
pub async fn get_one<S: Backend>(
  State(state): State<AppState<S>>,
  Principal(account): Principal,
  Path(sid): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
  state
    .edits
    .with(sid, account.id, |session| SessionView::of(sid, session))
    .await
    .map(Json)
    .ok_or_else(|| session_not_found(sid))
}

/// `DELETE /edits/{sid}`
pub async fn discard<S: Backend>(
  State(state): State<AppState<S>>,
  Principal(account): Principal,
  Path(sid): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  let session = state.edits.take(sid, account.id).await.ok_or_else(|| session_not_found(sid))?;
  session.discard();
  Ok(StatusCode::NO_CONTENT)
}

// ─── Patch ────────────────────────────────────────────────────────────────────

/// `PATCH /edits/{sid}/projects/{index}`
pub async fn patch_project<S: Backend>(
  State(state): State<AppState<S>>,
  Principal(account): Principal,
  Path((sid, index)): Path<(Uuid, usize)>,
  Json(patch): Json<ProjectPatch>,
) -> Result<Json<ProjectDraft>, ApiError> {
  state
    .edits
    .with(sid, account.id, |session| session.apply(index, patch).cloned())
    .await
    .ok_or_else(|| session_not_found(sid))?
    .map(Json)
    .map_err(|e| ApiError::NotFound(e.to_string()))
}

// ─── Submit ───────────────────────────────────────────────────────────────────

/// `POST /edits/{sid}/submit`
///
/// A submit that fails validation or storage puts the session back so the
/// caller can correct it. A sheet that has vanished ends the session.
pub async fn submit<S: Backend>(
  State(state): State<AppState<S>>,
  Principal(account): Principal,
  Path(sid): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  let session = state.edits.take(sid, account.id).await.ok_or_else(|| session_not_found(sid))?;
  let backup = session.clone();
  let (person_id, updates) = session.submit();

  if let Err(e) = validate_updates(&updates) {
    state.edits.restore(sid, account.id, backup).await;
    return Err(e.into());
  }

  let count = updates.len();
  match state.store.update_projects(state.scope(&account), person_id, updates).await {
    Ok(true) => {
      info!(%sid, person_id, projects = count, "submitted edit session");
      Ok(StatusCode::NO_CONTENT)
    }
    Ok(false) => Err(sheet_not_found(person_id)),
    Err(e) => {
      state.edits.restore(sid, account.id, backup).await;
      Err(ApiError::store(e))
    }
  }
}
