//! Pipeline configuration

use crate::embedding::DEFAULT_MAX_LENGTH;
use crate::heuristics::DEFAULT_SCAM_KEYWORDS;
use crate::model::{DeviceType, ModelSource};
use crate::normalizer::TextNormalizer;
use crate::segmenter::{DEFAULT_JOINER, DEFAULT_MAX_WORD_SYLLABLES};
use scamlens_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for a feature extraction run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Language tag records must be detected as
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Records processed concurrently
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Scam lexicon
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,

    /// Word segmentation settings
    #[serde(default)]
    pub segmenter: SegmenterConfig,

    /// Encoder settings
    #[serde(default)]
    pub encoder: EncoderConfig,
}

/// Word segmentation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmenterConfig {
    /// Lexicon file; the built-in lexicon is used when absent
    #[serde(default)]
    pub lexicon: Option<PathBuf>,

    /// Character joining syllables of one word
    #[serde(default = "default_joiner")]
    pub joiner: char,

    /// Longest word, in syllables, the matcher will try
    #[serde(default = "default_max_word_syllables")]
    pub max_word_syllables: usize,
}

/// Encoder settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Model source
    #[serde(default)]
    pub source: ModelSourceSpec,

    /// Explicit tokenizer file
    #[serde(default)]
    pub tokenizer: Option<PathBuf>,

    /// Inference device
    #[serde(default)]
    pub device: DeviceSpec,

    /// Maximum sub-word sequence length, boundary markers included
    #[serde(default = "default_max_length")]
    pub max_length: usize,
}

/// Model source specification (for config files)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModelSourceSpec {
    /// Local model directory
    Local { path: PathBuf },

    /// Hugging Face Hub
    HuggingFace {
        repo_id: String,
        #[serde(default = "default_revision")]
        revision: String,
    },
}

/// Device specification (for config files)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceSpec {
    #[default]
    Cpu,
    Cuda { index: Option<usize> },
    Metal { index: Option<usize> },
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_language: default_target_language(),
            workers: default_workers(),
            keywords: default_keywords(),
            segmenter: SegmenterConfig::default(),
            encoder: EncoderConfig::default(),
        }
    }
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            lexicon: None,
            joiner: default_joiner(),
            max_word_syllables: default_max_word_syllables(),
        }
    }
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            source: ModelSourceSpec::default(),
            tokenizer: None,
            device: DeviceSpec::Cpu,
            max_length: default_max_length(),
        }
    }
}

impl Default for ModelSourceSpec {
    fn default() -> Self {
        Self::HuggingFace {
            repo_id: "vinai/phobert-base-v2".to_string(),
            revision: default_revision(),
        }
    }
}

impl PipelineConfig {
    /// Load from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("Invalid pipeline config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from file, or defaults when the file does not exist
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    /// Reject values no run can work with
    pub fn validate(&self) -> Result<()> {
        if self.target_language.trim().is_empty() {
            return Err(Error::config("target_language must not be empty"));
        }
        if self.workers == 0 {
            return Err(Error::config("workers must be at least 1"));
        }
        if self.segmenter.joiner.is_whitespace() {
            return Err(Error::config("segmenter.joiner must not be whitespace"));
        }
        // Cleaned text must never contain the joiner.
        if !TextNormalizer::new()?
            .clean(&self.segmenter.joiner.to_string())
            .is_empty()
        {
            return Err(Error::config(format!(
                "segmenter.joiner '{}' survives text cleaning",
                self.segmenter.joiner
            )));
        }
        if self.segmenter.max_word_syllables == 0 {
            return Err(Error::config("segmenter.max_word_syllables must be at least 1"));
        }
        // Room for <s> and </s>.
        if self.encoder.max_length < 2 {
            return Err(Error::config("encoder.max_length must be at least 2"));
        }
        Ok(())
    }
}

impl ModelSourceSpec {
    /// Convert to a runtime model source
    pub fn to_model_source(&self) -> ModelSource {
        match self {
            Self::Local { path } => ModelSource::LocalDir(path.clone()),
            Self::HuggingFace { repo_id, revision } => ModelSource::HuggingFace {
                repo_id: repo_id.clone(),
                revision: revision.clone(),
            },
        }
    }
}

impl DeviceSpec {
    /// Convert to DeviceType
    pub fn to_device_type(&self) -> DeviceType {
        match self {
            DeviceSpec::Cpu => DeviceType::Cpu,
            DeviceSpec::Cuda { index } => DeviceType::Cuda(index.unwrap_or(0)),
            DeviceSpec::Metal { index } => DeviceType::Metal(index.unwrap_or(0)),
        }
    }
}

#[cfg(feature = "ml-models")]
impl EncoderConfig {
    /// Options for loading the encoder
    pub fn to_options(&self) -> crate::embedding::EncoderOptions {
        crate::embedding::EncoderOptions {
            source: self.source.to_model_source(),
            tokenizer_path: self.tokenizer.clone(),
            device: self.device.to_device_type(),
            max_length: self.max_length,
        }
    }
}

fn default_target_language() -> String {
    "vi".to_string()
}

fn default_workers() -> usize {
    num_cpus::get().max(1)
}

fn default_keywords() -> Vec<String> {
    DEFAULT_SCAM_KEYWORDS.iter().map(|k| k.to_string()).collect()
}

fn default_joiner() -> char {
    DEFAULT_JOINER
}

fn default_max_word_syllables() -> usize {
    DEFAULT_MAX_WORD_SYLLABLES
}

fn default_max_length() -> usize {
    DEFAULT_MAX_LENGTH
}

fn default_revision() -> String {
    "main".to_string()
}
