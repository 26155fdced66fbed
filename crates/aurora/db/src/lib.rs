//! PostgreSQL administration adapter.
//!
//! Implements the engine's `DatabaseAdmin` port over sqlx: idempotent role
//! provisioning in one transaction, and the post-restore verification
//! probes (version query, user schema and table enumeration).

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod admin;
mod quoting;

pub use admin::PostgresAdmin;
