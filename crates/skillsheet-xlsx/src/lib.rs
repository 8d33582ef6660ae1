//! Spreadsheet export for skill sheets.
//!
//! [`mapping`] holds the static cell tables that place each field of a
//! [`SkillSheet`](skillsheet_core::sheet::SkillSheet) on the template, and
//! [`render`] copies a template workbook, fills it through a [`CellSink`]
//! and returns the saved bytes. Pure synchronous; callers in async code
//! should run [`Renderer::render`] on a blocking thread.

pub mod cell;
pub mod error;
pub mod mapping;
pub mod render;
pub mod sink;

pub use cell::{CellRange, CellRef};
pub use error::{ExportError, Result};
pub use mapping::ExportLayout;
pub use render::{ExportPhase, RenderedDocument, Renderer};
pub use sink::{CellError, CellSink, GridSink, XlsxSink};
