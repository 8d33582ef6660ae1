//! skill sheet server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) plus
//! `SKILLSHEET_*` environment variables, opens the SQLite store, and serves
//! the JSON API over HTTP.
//!
//! # Bootstrapping an administrator
//!
//! ```
//! cargo run -p skillsheet-web --bin server -- --create-admin admin
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::Parser;
use skillsheet_core::{
  account::{AccountRole, NewAccount},
  store::AccountStore,
};
use skillsheet_store_sqlite::SqliteStore;
use skillsheet_web::{AppState, ServerConfig, auth};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Skill sheet server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Create an admin account with this login id, reading its password from
  /// stdin, and exit.
  #[arg(long, value_name = "LOGIN_ID")]
  create_admin: Option<String>,

  /// Display name for `--create-admin`. Defaults to the login id.
  #[arg(long, requires = "create_admin")]
  username: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .set_default("host", "127.0.0.1")?
    .set_default("port", 8080)?
    .set_default("store_path", "~/.local/share/skillsheet/skillsheet.db")?
    .set_default("template_path", "template.xlsx")?
    .add_source(config::File::from(cli.config).required(false))
    .add_source(
      config::Environment::with_prefix("SKILLSHEET")
        .prefix_separator("_")
        .separator("__"),
    )
    .build()
    .context("failed to read config file")?;

  let mut server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  server_cfg.store_path = expand_tilde(&server_cfg.store_path);
  server_cfg.template_path = expand_tilde(&server_cfg.template_path);
  server_cfg.output_dir = server_cfg.output_dir.as_deref().map(expand_tilde);

  if let Some(parent) = server_cfg.store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }

  let store = SqliteStore::open(&server_cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", server_cfg.store_path))?;

  if let Some(login_id) = cli.create_admin {
    let password = read_password()?;
    auth::check_password(&password)?;
    let account = store
      .create_account(NewAccount {
        username: cli.username.unwrap_or_else(|| login_id.clone()),
        login_id,
        role: AccountRole::Admin,
        password_hash: auth::hash_password(&password)?,
      })
      .await
      .context("failed to create admin account")?;
    println!("created admin account {} (id {})", account.login_id, account.id);
    return Ok(());
  }

  if !server_cfg.template_path.is_file() {
    tracing::warn!(
      path = %server_cfg.template_path.display(),
      "export template not found; exports will fail until it exists"
    );
  }

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  let app = skillsheet_web::router(AppState::new(store, server_cfg));

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Read a password line from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_string())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
