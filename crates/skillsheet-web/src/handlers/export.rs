//! `GET /sheets/{id}/export`: the sheet rendered into the configured
//! workbook template.
//!
//! The response carries an `ETag` over the sheet content and export layout;
//! a matching `If-None-Match` short-circuits to `304` without rendering.

use axum::{
  extract::{Path, State},
  http::{HeaderMap, StatusCode, header},
  response::{IntoResponse, Response},
};
use skillsheet_core::{PersonId, store::SkillSheetStore};
use tracing::info;

use super::sheet_not_found;
use crate::{AppState, Backend, auth::Principal, error::ApiError, etag};

pub const XLSX_CONTENT_TYPE: &str =
  "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Fallback name for clients that ignore `filename*`.
const ASCII_FILE_NAME: &str = "skillsheet.xlsx";

pub async fn download<S: Backend>(
  State(state): State<AppState<S>>,
  Principal(account): Principal,
  Path(id): Path<PersonId>,
  headers: HeaderMap,
) -> Result<Response, ApiError> {
  let sheet = state
    .store
    .read(state.scope(&account), id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| sheet_not_found(id))?;

  let etag = etag::export_etag(&sheet, state.renderer.layout())
    .map_err(|e| ApiError::Internal(format!("failed to hash sheet: {e}")))?;
  let fresh = headers
    .get(header::IF_NONE_MATCH)
    .and_then(|v| v.to_str().ok())
    .is_some_and(|v| etag::matches(v, &etag));
  if fresh {
    return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response());
  }

  let renderer = state.renderer.clone();
  let template = state.config.template_path.clone();
  let document = tokio::task::spawn_blocking(move || renderer.render(&sheet, &template))
    .await
    .map_err(|e| ApiError::Internal(format!("export task failed: {e}")))??;

  info!(id, skipped = document.skipped.len(), "exported skill sheet");
  Ok(
    (
      StatusCode::OK,
      [
        (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
        (header::CONTENT_DISPOSITION, content_disposition(&document.file_name)),
        (header::ETAG, etag),
      ],
      document.bytes,
    )
      .into_response(),
  )
}

/// `attachment` disposition with an ASCII fallback and the real name in
/// RFC 5987 form.
fn content_disposition(file_name: &str) -> String {
  format!(
    "attachment; filename=\"{ASCII_FILE_NAME}\"; filename*=UTF-8''{}",
    percent_encode(file_name)
  )
}

fn percent_encode(s: &str) -> String {
  let mut out = String::with_capacity(s.len() * 3);
  for b in s.bytes() {
    if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~') {
      out.push(char::from(b));
    } else {
      out.push_str(&format!("%{b:02X}"));
    }
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn file_names_are_percent_encoded() {
    assert_eq!(percent_encode("a b.xlsx"), "a%20b.xlsx");
    assert_eq!(percent_encode("山"), "%E5%B1%B1");
    let header = content_disposition("山田SkillSheet.xlsx");
    assert_eq!(
      header,
      "attachment; filename=\"skillsheet.xlsx\"; filename*=UTF-8''%E5%B1%B1%E7%94%B0SkillSheet.xlsx"
    );
  }
}
