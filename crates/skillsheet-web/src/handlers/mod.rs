//! Route handlers, one module per resource.

pub mod accounts;
pub mod export;
pub mod projects;
pub mod sessions;
pub mod sheets;

use chrono::{Local, NaiveDate};
use skillsheet_core::PersonId;

use crate::error::ApiError;

pub(crate) fn sheet_not_found(id: PersonId) -> ApiError {
  ApiError::NotFound(format!("skill sheet {id}"))
}

/// Date that birth and graduation dates are checked against.
pub(crate) fn today() -> NaiveDate { Local::now().date_naive() }
