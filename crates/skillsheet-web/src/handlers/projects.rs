//! Handlers for `/sheets/{id}/projects` endpoints.
//!
//! | Method   | Path                                | Notes |
//! |----------|-------------------------------------|-------|
//! | `POST`   | `/sheets/{id}/projects`             | Body: `{"project": …, "durations": […]}` |
//! | `PUT`    | `/sheets/{id}/projects`             | Body: `[{"id": …, "project": …, "durations": […]}]` |
//! | `DELETE` | `/sheets/{id}/projects/{project_id}`| 204 |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use skillsheet_core::{
  PersonId, ProjectId,
  aggregate::TagDurations,
  project::NewProject,
  session::ProjectUpdate,
  store::SkillSheetStore,
  validate::ValidationError,
};

use super::sheet_not_found;
use crate::{AppState, Backend, auth::Principal, error::ApiError};

// ─── Append ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AppendBody {
  pub project:   NewProject,
  /// Explicit experience per environment tag; missing tags keep or start at
  /// zero.
  #[serde(default)]
  pub durations: TagDurations,
}

/// `POST /sheets/{id}/projects`
pub async fn append<S: Backend>(
  State(state): State<AppState<S>>,
  Principal(account): Principal,
  Path(id): Path<PersonId>,
  Json(body): Json<AppendBody>,
) -> Result<impl IntoResponse, ApiError> {
  body.project.validate()?;
  let project_id = state
    .store
    .append_project(state.scope(&account), id, body.project, body.durations)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| sheet_not_found(id))?;
  Ok((StatusCode::CREATED, Json(json!({ "id": project_id }))))
}

// ─── Update all ───────────────────────────────────────────────────────────────

/// Validate a batch of updates, reporting issues as `[i].project.<field>`.
pub(crate) fn validate_updates(updates: &[ProjectUpdate]) -> Result<(), ValidationError> {
  let mut issues = Vec::new();
  for (i, update) in updates.iter().enumerate() {
    if let Err(e) = update.project.validate() {
      issues.extend(e.issues.into_iter().map(|mut issue| {
        issue.field = format!("[{i}].{}", issue.field);
        issue
      }));
    }
  }
  ValidationError::check(issues)
}

/// `PUT /sheets/{id}/projects`
pub async fn update_all<S: Backend>(
  State(state): State<AppState<S>>,
  Principal(account): Principal,
  Path(id): Path<PersonId>,
  Json(updates): Json<Vec<ProjectUpdate>>,
) -> Result<StatusCode, ApiError> {
  validate_updates(&updates)?;
  let found = state
    .store
    .update_projects(state.scope(&account), id, updates)
    .await
    .map_err(ApiError::store)?;
  if !found {
    return Err(sheet_not_found(id));
  }
  Ok(StatusCode::NO_CONTENT)
}

// ─── Delete one ───────────────────────────────────────────────────────────────

/// `DELETE /sheets/{id}/projects/{project_id}`
pub async fn delete_one<S: Backend>(
  State(state): State<AppState<S>>,
  Principal(account): Principal,
  Path((id, project_id)): Path<(PersonId, ProjectId)>,
) -> Result<StatusCode, ApiError> {
  let deleted = state
    .store
    .delete_project(state.scope(&account), id, project_id)
    .await
    .map_err(ApiError::store)?;
  if !deleted {
    return Err(ApiError::NotFound(format!("project {project_id} of skill sheet {id}")));
  }
  state.edits.forget_project(id, project_id).await;
  Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn update_issues_carry_their_index() {
    let ok = ProjectUpdate { id: 1, project: NewProject::default(), durations: TagDurations::new() };
    let bad = ProjectUpdate {
      id:        2,
      project:   NewProject { period_start: "soon".into(), ..Default::default() },
      durations: TagDurations::new(),
    };
    assert!(validate_updates(std::slice::from_ref(&ok)).is_ok());

    let err = validate_updates(&[ok, bad]).unwrap_err();
    assert_eq!(err.issues.len(), 1);
    assert_eq!(err.issues[0].field, "[1].project.period_start");
  }
}
