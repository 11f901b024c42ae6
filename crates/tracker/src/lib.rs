//! Decision and reward tracking for the rankwerk SDK.
//!
//! Consumes a ranked variant list, decides probabilistically what to report
//! back to the training pipeline, generates KSUID ids, validates payloads,
//! and posts them fire-and-forget. Transport failures never reach the
//! scoring/decision caller; they are logged and swallowed here.

pub mod context;
pub mod decision;
pub mod store;
pub mod tracker;

pub use context::SdkContext;
pub use decision::Decision;
pub use store::DecisionStore;
pub use tracker::{should_track_runners_up, top_runners_up, DecisionTracker, DEFAULT_MAX_RUNNERS_UP};
