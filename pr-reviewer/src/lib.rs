//! Pull request review pipeline and webhook event handling.
//!
//! 1) **Events** (`events`): every webhook is recorded as a pending envelope,
//!    dispatched by type, then marked done.
//! 2) **Review** (`review`): for `pull_request` events, changed files are
//!    parsed (`diff`), turned into prompts (`prompt`), sent to the model and
//!    decoded (`normalize`), then summarized and persisted.
//!
//! External services are reached through the traits in `capabilities`, so
//! the pipeline has no `async-trait` and no `Box<dyn ...>`.

pub mod capabilities;
pub mod diff;
pub mod errors;
pub mod events;
pub mod normalize;
pub mod payload;
pub mod prompt;
pub mod review;

#[cfg(test)]
mod test_support;

pub use capabilities::{PullRequestFiles, ReviewModel};
pub use errors::{DispatchError, EventError, ReviewError, ReviewStage};
pub use events::{DispatchOutcome, EventDispatcher, EventReceipt, PULL_REQUEST_EVENT, PUSH_EVENT};
pub use review::{
    FileReview, PullRequestRef, ReviewConfig, ReviewPipeline, ReviewReport, SkipReason,
};
