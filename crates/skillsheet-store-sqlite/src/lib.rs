//! SQLite backend for the skill sheet store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Both historical table layouts are
//! supported; see [`layout`].

mod accounts;
mod encode;
mod legacy;
mod normalized;
mod schema;
mod store;

pub mod error;
pub mod layout;

pub use error::{Error, Result};
pub use store::SqliteStore;
