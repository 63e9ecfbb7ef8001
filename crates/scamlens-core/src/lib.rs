//! ScamLens Core
//!
//! Core types, traits, and utilities shared across ScamLens components.
//!
//! This crate provides:
//! - The raw comment and feature record data model
//! - Error types and result handling
//! - Encodings for list-valued output columns
//! - The acquisition boundary trait

pub mod encoding;
pub mod error;
pub mod source;
pub mod types;

pub use encoding::{decode_embedding, encode_embedding, join_domains, split_domains};
pub use error::{Error, ErrorKind, Result};
pub use source::CommentSource;
pub use types::{BatchSummary, FeatureRecord, RawComment, RecordFailure, RecordState, VideoMetadata};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, ErrorKind, Result};
    pub use crate::source::CommentSource;
    pub use crate::types::{BatchSummary, FeatureRecord, RawComment, RecordFailure, RecordState};
}
