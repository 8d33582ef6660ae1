//! Core types and trait definitions for the skill sheet store.
//!
//! No HTTP, database or spreadsheet dependencies. Every other crate in the
//! workspace builds on this one.

// Store impls use native `async fn` against the `impl Future + Send` trait
// signatures.
#![allow(async_fn_in_trait)]

pub mod account;
pub mod aggregate;
pub mod error;
pub mod person;
pub mod project;
pub mod session;
pub mod sheet;
pub mod skill;
pub mod store;
pub mod validate;

pub use error::{Error, Result};

/// Row id of a person (`user_info.id` / `basic_info.id`).
pub type PersonId = i64;
/// Row id of a project.
pub type ProjectId = i64;
/// Row id of a login account in `users`.
pub type AccountId = i64;
