//! JSON-over-HTTP surface for the skill sheet store.
//!
//! Exposes an axum [`Router`] backed by any store implementing both
//! [`SkillSheetStore`] and [`AccountStore`]. Every route requires HTTP Basic
//! credentials checked against the `users` table; account management
//! additionally requires the admin role.

pub mod auth;
pub mod edits;
pub mod error;
pub mod etag;
pub mod handlers;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, patch, post, put},
};
use serde::Deserialize;
use skillsheet_core::{
  account::Account,
  store::{AccountStore, Scope, SkillSheetStore},
};
use skillsheet_xlsx::{ExportLayout, Renderer};
use tower_http::trace::TraceLayer;

use edits::EditSessions;
use handlers::{accounts, export, projects, sessions, sheets};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `SKILLSHEET_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:          String,
  pub port:          u16,
  pub store_path:    PathBuf,
  /// Workbook every export starts from. Never modified.
  pub template_path: PathBuf,
  /// When set, each export is also saved here under a timestamped name.
  #[serde(default)]
  pub output_dir:    Option<PathBuf>,
  /// Restrict every account to the sheets it created.
  #[serde(default)]
  pub scoping:       bool,
  #[serde(default)]
  pub export:        ExportConfig,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
  /// Three project blocks, tags on the blocks themselves.
  #[default]
  Enhanced,
  /// Ten project blocks plus a `Projects` table sheet.
  Legacy,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ExportConfig {
  #[serde(default)]
  pub layout:            ExportKind,
  pub max_projects:      Option<usize>,
  pub tags_per_category: Option<usize>,
}

impl ExportConfig {
  pub fn layout(&self) -> ExportLayout {
    let mut layout = match self.layout {
      ExportKind::Enhanced => ExportLayout::enhanced(),
      ExportKind::Legacy => ExportLayout::legacy(),
    };
    if let Some(n) = self.max_projects {
      layout.max_projects = n;
    }
    if let Some(n) = self.tags_per_category {
      layout.tags_per_category = n;
    }
    layout
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// A store usable behind the router.
pub trait Backend: SkillSheetStore + AccountStore + Clone + 'static {}

impl<T> Backend for T where T: SkillSheetStore + AccountStore + Clone + 'static {}

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: Backend> {
  pub store:    Arc<S>,
  pub config:   Arc<ServerConfig>,
  pub renderer: Arc<Renderer>,
  pub edits:    Arc<EditSessions>,
}

impl<S: Backend> AppState<S> {
  pub fn new(store: S, config: ServerConfig) -> Self {
    let mut renderer = Renderer::new(config.export.layout());
    if let Some(dir) = &config.output_dir {
      renderer = renderer.with_output_dir(dir);
    }
    Self {
      store:    Arc::new(store),
      config:   Arc::new(config),
      renderer: Arc::new(renderer),
      edits:    Arc::new(EditSessions::new()),
    }
  }

  /// The records `account` may touch.
  pub fn scope(&self, account: &Account) -> Scope {
    if self.config.scoping { Scope::Owner(account.id) } else { Scope::Unrestricted }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router.
pub fn router<S: Backend>(state: AppState<S>) -> Router {
  Router::new()
    .route("/me", get(accounts::me))
    // Sheets
    .route("/sheets", get(sheets::list::<S>).post(sheets::create::<S>))
    .route(
      "/sheets/{id}",
      get(sheets::get_one::<S>).put(sheets::update::<S>).delete(sheets::delete::<S>),
    )
    .route("/sheets/{id}/projects", post(projects::append::<S>).put(projects::update_all::<S>))
    .route("/sheets/{id}/projects/{project_id}", axum::routing::delete(projects::delete_one::<S>))
    .route("/sheets/{id}/export", get(export::download::<S>))
    // Edit sessions
    .route("/sheets/{id}/edit", post(sessions::open::<S>))
    .route("/edits/{sid}", get(sessions::get_one::<S>).delete(sessions::discard::<S>))
    .route("/edits/{sid}/projects/{index}", patch(sessions::patch_project::<S>))
    .route("/edits/{sid}/submit", post(sessions::submit::<S>))
    // Accounts
    .route("/accounts", get(accounts::list::<S>).post(accounts::create::<S>))
    .route("/accounts/{id}", put(accounts::update::<S>).delete(accounts::delete::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────
