//! Error type for `skillsheet-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Validation(#[from] skillsheet_core::validate::ValidationError),

  #[error("database error: {0}")]
  Database(tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored value that does not decode into its domain type.
  #[error("cannot decode {column} value {value:?}")]
  Decode { column: &'static str, value: String },

  /// A uniqueness constraint was violated, e.g. a duplicate login id.
  #[error("conflict: {0}")]
  Conflict(String),
}

impl From<tokio_rusqlite::Error> for Error {
  fn from(e: tokio_rusqlite::Error) -> Self {
    match e {
      tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(failure, message))
        if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
      {
        Error::Conflict(message.unwrap_or_else(|| failure.to_string()))
      }
      other => Error::Database(other),
    }
  }
}

impl From<rusqlite::Error> for Error {
  fn from(e: rusqlite::Error) -> Self { Error::from(tokio_rusqlite::Error::Rusqlite(e)) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
