//! Persistence for the PR retro pipeline.
//!
//! Four tables: raw webhook envelopes, per-PR review feedback keyed by
//! `(github_repo_id, pr_number)`, per-commit feedback keyed by `sha`, and
//! employees with their GitHub credentials.

pub mod error;
pub mod models;
pub mod schema;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use models::*;
pub use store::FeedbackStore;
