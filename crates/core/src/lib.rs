//! Core types for the rankwerk decision SDK.
//!
//! This crate holds everything the encoding, scoring, and tracking crates
//! share: the JSON-like [`Value`] universe, the common error type, model
//! metadata, KSUID id generation, and tracker configuration.

pub mod config;
pub mod error;
pub mod ksuid;
pub mod meta;
pub mod value;

pub use error::{RankwerkError, Result};
pub use meta::ModelMetadata;
pub use value::Value;
