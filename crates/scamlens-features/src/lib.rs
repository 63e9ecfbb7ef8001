//! ScamLens Features
//!
//! Turns raw Vietnamese comments into feature rows for scam detection:
//!
//! - **Language gate**: keep only target-language comments
//! - **Normalization**: strip markup and symbols, lowercase
//! - **Segmentation**: join multi-syllable words (`miễn phí` -> `miễn_phí`)
//! - **Heuristics**: URLs and domains from raw text, scam keyword presence
//! - **Embedding**: PhoBERT `<s>` hidden state on Candle
//!
//! The [`Orchestrator`] wires the stages together and isolates failures per
//! record.

pub mod config;
pub mod embedding;
pub mod heuristics;
pub mod language;
pub mod model;
pub mod normalizer;
pub mod pipeline;
pub mod segmenter;
pub mod table;

pub use config::{DeviceSpec, EncoderConfig, ModelSourceSpec, PipelineConfig, SegmenterConfig};
pub use embedding::{TextEncoder, DEFAULT_MAX_LENGTH};
#[cfg(feature = "ml-models")]
pub use embedding::{EncoderOptions, PhobertEncoder};
pub use heuristics::{
    HeuristicFeatureExtractor, KeywordScorer, UrlExtractor, UrlFeatures, DEFAULT_SCAM_KEYWORDS,
};
pub use language::{LanguageDetector, LanguageFilter, LanguageVerdict, WhatlangDetector};
pub use model::{DeviceType, ModelSource};
pub use normalizer::TextNormalizer;
pub use pipeline::{BatchResult, Orchestrator, OrchestratorBuilder, RecordOutcome};
pub use segmenter::{Lexicon, LexiconSegmenter, WordSegmenter};
pub use table::{read_comments, read_features, write_features, FeatureRow, OUTPUT_COLUMNS};

/// Prelude for binaries and tests
pub mod prelude {
    pub use crate::config::PipelineConfig;
    pub use crate::embedding::TextEncoder;
    pub use crate::language::LanguageDetector;
    pub use crate::pipeline::{BatchResult, Orchestrator, RecordOutcome};
    pub use crate::segmenter::WordSegmenter;
    pub use scamlens_core::prelude::*;
}
