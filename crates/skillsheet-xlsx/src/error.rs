//! Error types for the export pipeline.

use std::{io, path::PathBuf};

use thiserror::Error;

use crate::render::ExportPhase;

/// A whole-export failure. Single-cell failures never surface here; they
/// end up in [`RenderedDocument::skipped`](crate::RenderedDocument::skipped).
#[derive(Debug, Error)]
pub enum ExportError {
  #[error("template not found: {}", path.display())]
  TemplateMissing { path: PathBuf },

  #[error("failed to load template {}: {message}", path.display())]
  Load { path: PathBuf, message: String },

  #[error("template has no worksheet")]
  NoWorksheet,

  #[error("failed to save workbook: {0}")]
  Save(String),

  #[error("failed to write {}: {source}", path.display())]
  Output {
    path:   PathBuf,
    #[source]
    source: io::Error,
  },
}

impl ExportError {
  /// The phase the export was in when it moved to the failed state.
  pub fn phase(&self) -> ExportPhase {
    match self {
      ExportError::TemplateMissing { .. } | ExportError::Load { .. } | ExportError::NoWorksheet => {
        ExportPhase::TemplateLoaded
      }
      ExportError::Save(_) => ExportPhase::FieldsWritten,
      ExportError::Output { .. } => ExportPhase::Saved,
    }
  }
}

pub type Result<T, E = ExportError> = std::result::Result<T, E>;
