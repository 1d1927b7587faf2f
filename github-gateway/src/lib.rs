//! GitHub REST access for the review pipeline and the read API.
//!
//! One [`GitHubClient`] per process; every call takes the token to act with,
//! so per-employee credentials never leak into shared state.

pub mod errors;
pub mod github;
pub mod types;

pub use errors::{GitHubError, GitHubResult};
pub use github::{GitHubClient, GitHubConfig, split_owner_repo};
pub use types::*;
