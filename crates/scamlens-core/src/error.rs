//! Error types for ScamLens

use serde::{Deserialize, Serialize};

/// Result type alias using ScamLens' Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for ScamLens operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Language identification failed (empty, ambiguous, or detector error)
    #[error("language detection failed: {0}")]
    LanguageDetection(String),

    /// An input row is not usable as text
    #[error("input format error: {0}")]
    InputFormat(String),

    /// Word segmentation failed
    #[error("segmentation error: {0}")]
    Segmentation(String),

    /// Encoder loading or inference failed
    #[error("embedding error: {0}")]
    Embedding(String),

    /// Output artifact could not be written
    #[error("persistence error: {0}")]
    Persistence(String),

    /// A required input column is absent
    #[error("missing required column '{0}'")]
    MissingColumn(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Network/IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

/// Discriminant of [`Error`], carried by per-record failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    LanguageDetection,
    InputFormat,
    Segmentation,
    Embedding,
    Persistence,
    MissingColumn,
    Config,
    Io,
    Serialization,
    Internal,
}

impl Error {
    /// Create a new language detection error
    pub fn language_detection(msg: impl Into<String>) -> Self {
        Self::LanguageDetection(msg.into())
    }

    /// Create a new input format error
    pub fn input_format(msg: impl Into<String>) -> Self {
        Self::InputFormat(msg.into())
    }

    /// Create a new segmentation error
    pub fn segmentation(msg: impl Into<String>) -> Self {
        Self::Segmentation(msg.into())
    }

    /// Create a new embedding error
    pub fn embedding(msg: impl Into<String>) -> Self {
        Self::Embedding(msg.into())
    }

    /// Create a new persistence error
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Create a new missing column error
    pub fn missing_column(column: impl Into<String>) -> Self {
        Self::MissingColumn(column.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Which failure kind this error belongs to
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::LanguageDetection(_) => ErrorKind::LanguageDetection,
            Self::InputFormat(_) => ErrorKind::InputFormat,
            Self::Segmentation(_) => ErrorKind::Segmentation,
            Self::Embedding(_) => ErrorKind::Embedding,
            Self::Persistence(_) => ErrorKind::Persistence,
            Self::MissingColumn(_) => ErrorKind::MissingColumn,
            Self::Config(_) => ErrorKind::Config,
            Self::Io(_) => ErrorKind::Io,
            Self::Serialization(_) => ErrorKind::Serialization,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(Error::segmentation("x").kind(), ErrorKind::Segmentation);
        assert_eq!(Error::embedding("x").kind(), ErrorKind::Embedding);
        assert_eq!(Error::missing_column("text").kind(), ErrorKind::MissingColumn);

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert_eq!(Error::from(io).kind(), ErrorKind::Io);
    }

    #[test]
    fn test_display() {
        let err = Error::missing_column("video_id");
        assert_eq!(err.to_string(), "missing required column 'video_id'");
    }
}
