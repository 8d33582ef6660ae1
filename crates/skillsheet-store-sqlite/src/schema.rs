//! SQL schema for the skill sheet SQLite store.
//!
//! Initialisation is idempotent and additive: tables are created if absent
//! and missing columns are added with `ALTER TABLE`. Nothing is dropped.

use rusqlite::Connection;
use tracing::{debug, info};

use skillsheet_core::store::LayoutKind;

use crate::layout::{detect_layout, table_columns, table_exists};

pub const PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
";

/// Normalized layout DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const NORMALIZED_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS user_info (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    name            TEXT NOT NULL,
    name_kana       TEXT NOT NULL,
    transportation  TEXT,
    nearest_station TEXT,
    access_method   TEXT,
    access_time     TEXT,
    gender          TEXT,
    birth_date      DATE,
    final_education TEXT,
    graduation_date TEXT,
    self_pr         TEXT,
    qualifications  TEXT,            -- JSON array
    created_at      TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    login_user_id   INTEGER          -- users.id of the creating account
);

CREATE TABLE IF NOT EXISTS skills (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    user_info_id     INTEGER REFERENCES user_info(id),
    skill_type       TEXT,           -- 'language' | 'tool' | 'db' | 'machine'
    skill_name       TEXT,
    experience_years TEXT            -- decimal years
);

CREATE TABLE IF NOT EXISTS projects (
    id INTEGER PRIMARY KEY AUTOINCREMENT
);

CREATE INDEX IF NOT EXISTS skills_person_idx ON skills(user_info_id);
";

/// Legacy layout DDL. Only ever run against a database that already has
/// `basic_info`, to fill in any companion table that is missing.
pub const LEGACY_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS basic_info (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    name            TEXT NOT NULL,
    name_kana       TEXT NOT NULL,
    transportation  TEXT,
    nearest_station TEXT,
    access_method   TEXT,
    access_time     TEXT,
    gender          TEXT,
    birth_date      DATE,
    final_education TEXT,
    graduation_date TEXT,
    self_pr         TEXT,
    created_at      TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS qualifications (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    basic_info_id INTEGER,
    qualification TEXT
);

CREATE TABLE IF NOT EXISTS languages (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    basic_info_id    INTEGER,
    language         TEXT,
    experience_years TEXT
);

CREATE TABLE IF NOT EXISTS tools (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    basic_info_id    INTEGER,
    tool             TEXT,
    experience_years TEXT
);

CREATE TABLE IF NOT EXISTS databases (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    basic_info_id    INTEGER,
    \"database\"       TEXT,
    experience_years TEXT
);

CREATE TABLE IF NOT EXISTS machines (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    basic_info_id    INTEGER,
    machine          TEXT,
    experience_years TEXT
);

CREATE TABLE IF NOT EXISTS projects (
    id INTEGER PRIMARY KEY AUTOINCREMENT
);
";

/// Login accounts. Present in both layouts.
pub const USERS_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    login_id      TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,     -- argon2 PHC string
    username      TEXT NOT NULL,
    role          TEXT NOT NULL,     -- '管理者' | '一般'
    created_at    TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);
";

/// `projects` columns after the id, shared by both layouts apart from the
/// owning-person key.
pub const PROJECT_COLUMNS: &[(&str, &str)] = &[
  ("period_start", "TEXT"),
  ("period_end", "TEXT"),
  ("system_name", "TEXT"),
  ("role", "TEXT"),
  ("industry", "TEXT"),
  ("work_content", "TEXT"),
  ("phases", "TEXT"),       // JSON array of checked phase labels
  ("headcount", "TEXT"),
  ("env_langs", "TEXT"),    // JSON array of tags
  ("env_tools", "TEXT"),
  ("env_dbs", "TEXT"),
  ("env_oss", "TEXT"),
];

pub const USER_INFO_COLUMNS: &[(&str, &str)] = &[("login_user_id", "INTEGER")];

/// Person columns added over time; older `basic_info` tables may lack them.
pub const BASIC_INFO_COLUMNS: &[(&str, &str)] = &[
  ("transportation", "TEXT"),
  ("graduation_date", "TEXT"),
  ("self_pr", "TEXT"),
];

/// Prepare the database and report the layout it is in.
///
/// A database holding `basic_info` without `user_info` stays in the legacy
/// layout; missing companion tables and columns are added around it.
/// Anything else gets the normalized tables.
pub fn init(conn: &Connection) -> rusqlite::Result<LayoutKind> {
  conn.execute_batch(PRAGMAS)?;

  let legacy = table_exists(conn, "basic_info")? && !table_exists(conn, "user_info")?;
  if legacy {
    info!("legacy layout found; leaving tables in place");
    conn.execute_batch(LEGACY_SCHEMA)?;
    add_missing_columns(conn, "basic_info", BASIC_INFO_COLUMNS)?;
    add_missing_columns(conn, "projects", &[("basic_info_id", "INTEGER")])?;
    add_missing_columns(conn, "projects", PROJECT_COLUMNS)?;
  } else {
    conn.execute_batch(NORMALIZED_SCHEMA)?;
    add_missing_columns(conn, "user_info", USER_INFO_COLUMNS)?;
    add_missing_columns(conn, "projects", &[("user_info_id", "INTEGER")])?;
    add_missing_columns(conn, "projects", PROJECT_COLUMNS)?;
  }
  conn.execute_batch(USERS_SCHEMA)?;

  detect_layout(conn)
}

fn add_missing_columns(
  conn: &Connection,
  table: &str,
  columns: &[(&str, &str)],
) -> rusqlite::Result<()> {
  let existing = table_columns(conn, table)?;
  for (name, ty) in columns {
    if !existing.iter().any(|c| c == name) {
      debug!(table, column = name, "adding column");
      conn.execute_batch(&format!("ALTER TABLE {table} ADD COLUMN {name} {ty}"))?;
    }
  }
  Ok(())
}
