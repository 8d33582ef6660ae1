//! HTTP Basic-auth extractors backed by the `users` table.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use rand_core::OsRng;
use skillsheet_core::{
  account::Account,
  validate::{FieldIssue, ValidationError},
};
use tracing::debug;

use crate::{AppState, Backend, error::ApiError};

pub const MIN_PASSWORD_LEN: usize = 4;

/// The authenticated account making the request.
pub struct Principal(pub Account);

/// An authenticated account with the admin role.
pub struct Admin(pub Account);

/// Split an `Authorization: Basic …` header into login id and password.
pub fn basic_credentials(headers: &HeaderMap) -> Result<(String, String), ApiError> {
  let encoded = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Basic "))
    .ok_or(ApiError::Unauthorized)?;

  let decoded = B64.decode(encoded.trim()).map_err(|_| ApiError::Unauthorized)?;
  let creds = String::from_utf8(decoded).map_err(|_| ApiError::Unauthorized)?;
  let (login, password) = creds.split_once(':').ok_or(ApiError::Unauthorized)?;
  Ok((login.to_string(), password.to_string()))
}

/// Rejects passwords shorter than [`MIN_PASSWORD_LEN`] characters.
pub fn check_password(password: &str) -> Result<(), ValidationError> {
  if password.chars().count() < MIN_PASSWORD_LEN {
    return Err(ValidationError {
      issues: vec![FieldIssue::new(
        "password",
        format!("must be at least {MIN_PASSWORD_LEN} characters"),
      )],
    });
  }
  Ok(())
}

/// Argon2 PHC string for `password`.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| ApiError::Internal(format!("argon2 error: {e}")))
}

pub fn verify_password(password: &str, phc: &str) -> bool {
  PasswordHash::new(phc)
    .and_then(|hash| Argon2::default().verify_password(password.as_bytes(), &hash))
    .is_ok()
}

impl<S: Backend> FromRequestParts<AppState<S>> for Principal {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let (login, password) = basic_credentials(&parts.headers)?;
    let Some(creds) = state
      .store
      .account_by_login(login.clone())
      .await
      .map_err(ApiError::store)?
    else {
      debug!(login_id = %login, "unknown login");
      return Err(ApiError::Unauthorized);
    };

    if !verify_password(&password, &creds.password_hash) {
      debug!(login_id = %login, "wrong password");
      return Err(ApiError::Unauthorized);
    }
    Ok(Principal(creds.account))
  }
}

impl<S: Backend> FromRequestParts<AppState<S>> for Admin {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let Principal(account) = Principal::from_request_parts(parts, state).await?;
    if !account.is_admin() {
      return Err(ApiError::Forbidden("administrator role required".into()));
    }
    Ok(Admin(account))
  }
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;

  use super::*;

  fn headers(value: &str) -> HeaderMap {
    let mut map = HeaderMap::new();
    map.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    map
  }

  #[test]
  fn decodes_basic_header() {
    let value = format!("Basic {}", B64.encode("admin:pa:ss"));
    let (login, password) = basic_credentials(&headers(&value)).unwrap();
    assert_eq!((login.as_str(), password.as_str()), ("admin", "pa:ss"));
  }

  #[test]
  fn rejects_malformed_headers() {
    let no_colon = format!("Basic {}", B64.encode("nocolon"));
    for value in ["Bearer abc", "Basic !!!not-base64!!!", no_colon.as_str()] {
      assert!(matches!(basic_credentials(&headers(value)), Err(ApiError::Unauthorized)), "{value}");
    }
    assert!(matches!(basic_credentials(&HeaderMap::new()), Err(ApiError::Unauthorized)));
  }

  #[test]
  fn hashes_verify() {
    let hash = hash_password("secret").unwrap();
    assert!(hash.starts_with("$argon2"));
    assert!(verify_password("secret", &hash));
    assert!(!verify_password("wrong", &hash));
    assert!(!verify_password("secret", "not a phc string"));
  }

  #[test]
  fn short_passwords_rejected() {
    assert!(check_password("abc").is_err());
    assert!(check_password("abcd").is_ok());
    // Counted in characters, not bytes.
    assert!(check_password("パスワ").is_err());
  }
}
