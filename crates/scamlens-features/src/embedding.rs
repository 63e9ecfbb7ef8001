//! Sentence embeddings from a pretrained RoBERTa-family encoder
//!
//! The default model is PhoBERT (`vinai/phobert-base-v2`), which expects
//! word-segmented Vietnamese. The embedding of a text is the final-layer
//! hidden state of the leading `<s>` token. Inputs longer than the configured
//! maximum are truncated, never rejected.

use scamlens_core::Result;

#[cfg(feature = "ml-models")]
use crate::model::{self, DeviceType, ModelSource};
#[cfg(feature = "ml-models")]
use candle_core::{DType, Device, IndexOp, Tensor};
#[cfg(feature = "ml-models")]
use candle_nn::VarBuilder;
#[cfg(feature = "ml-models")]
use candle_transformers::models::xlm_roberta::{Config as RobertaConfig, XLMRobertaModel};
#[cfg(feature = "ml-models")]
use scamlens_core::Error;
#[cfg(feature = "ml-models")]
use std::path::PathBuf;
#[cfg(feature = "ml-models")]
use tokenizers::Tokenizer;
#[cfg(feature = "ml-models")]
use tracing::info;

/// Default maximum sub-word sequence length, boundary markers included
pub const DEFAULT_MAX_LENGTH: usize = 128;

/// Dense text encoder
pub trait TextEncoder: Send + Sync {
    /// Embed segmented text into a vector of length [`TextEncoder::dimension`]
    fn embed(&self, segmented: &str) -> Result<Vec<f32>>;

    /// Hidden dimension of the produced vectors
    fn dimension(&self) -> usize;

    /// Get the encoder name
    fn name(&self) -> &str;
}

/// Options for loading a [`PhobertEncoder`]
#[cfg(feature = "ml-models")]
#[derive(Debug, Clone)]
pub struct EncoderOptions {
    /// Where the model lives
    pub source: ModelSource,

    /// Explicit `tokenizer.json`; defaults to the one in the model directory
    pub tokenizer_path: Option<PathBuf>,

    /// Device to run inference on
    pub device: DeviceType,

    /// Maximum sequence length in sub-word tokens
    pub max_length: usize,
}

/// Dimensions read from the model's `config.json`
#[cfg(feature = "ml-models")]
#[derive(Debug, serde::Deserialize)]
struct EncoderDims {
    hidden_size: usize,
    max_position_embeddings: usize,
    #[serde(default = "default_pad_token_id")]
    pad_token_id: usize,
}

#[cfg(feature = "ml-models")]
fn default_pad_token_id() -> usize {
    1
}

/// PhoBERT (RoBERTa architecture) encoder running on Candle
#[cfg(feature = "ml-models")]
pub struct PhobertEncoder {
    name: String,
    tokenizer: Tokenizer,
    model: XLMRobertaModel,
    device: Device,
    hidden_size: usize,
}

#[cfg(feature = "ml-models")]
impl PhobertEncoder {
    /// Load tokenizer and weights. Expensive; do it once per process.
    pub fn load(options: &EncoderOptions) -> Result<Self> {
        let model_dir = model::resolve_model_dir(&options.source)?;

        let config_path = model_dir.join("config.json");
        let dims: EncoderDims = model::parse_json_config(&config_path)?;
        let roberta_config: RobertaConfig = model::parse_json_config(&config_path)?;

        // RoBERTa positions start after the padding index.
        let max_positions = dims.max_position_embeddings.saturating_sub(dims.pad_token_id + 1);
        if options.max_length > max_positions {
            return Err(Error::config(format!(
                "max_length {} exceeds the model's {} usable positions",
                options.max_length, max_positions
            )));
        }

        let tokenizer_path = options
            .tokenizer_path
            .clone()
            .unwrap_or_else(|| model_dir.join("tokenizer.json"));
        let tokenizer = model::load_tokenizer(&tokenizer_path, options.max_length)?;

        let device = options.device.create()?;
        let vb = model::load_var_builder(&model_dir, &device)?;
        let model = load_roberta_backbone(&vb, &roberta_config)?;

        let name = match &options.source {
            ModelSource::HuggingFace { repo_id, .. } => repo_id.clone(),
            ModelSource::LocalDir(path) => path.display().to_string(),
        };

        info!(
            "Loaded encoder '{}' (hidden size {}, max length {})",
            name, dims.hidden_size, options.max_length
        );

        Ok(Self {
            name,
            tokenizer,
            model,
            device,
            hidden_size: dims.hidden_size,
        })
    }

    fn forward_cls(&self, segmented: &str) -> candle_core::Result<Vec<f32>> {
        let encoding = self
            .tokenizer
            .encode(segmented, true)
            .map_err(|e| candle_core::Error::Msg(format!("Tokenization failed: {}", e)))?;

        let input_ids = Tensor::new(encoding.get_ids(), &self.device)?.unsqueeze(0)?;
        let token_type_ids = input_ids.zeros_like()?;
        let attention_mask = input_ids.ones_like()?;

        let hidden_states = self.model.forward(
            &input_ids,
            &attention_mask,
            &token_type_ids,
            None,
            None,
            None,
        )?;

        hidden_states.i((0, 0))?.to_dtype(DType::F32)?.to_vec1::<f32>()
    }
}

#[cfg(feature = "ml-models")]
impl TextEncoder for PhobertEncoder {
    fn embed(&self, segmented: &str) -> Result<Vec<f32>> {
        let embedding = self
            .forward_cls(segmented)
            .map_err(|e| Error::embedding(format!("Encoder forward pass failed: {}", e)))?;

        if embedding.len() != self.hidden_size {
            return Err(Error::embedding(format!(
                "expected {} components, got {}",
                self.hidden_size,
                embedding.len()
            )));
        }
        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.hidden_size
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(feature = "ml-models")]
fn load_roberta_backbone(vb: &VarBuilder, config: &RobertaConfig) -> Result<XLMRobertaModel> {
    let mut errors = Vec::new();

    for prefix in ["roberta", ""] {
        let vb_prefix = if prefix.is_empty() {
            vb.clone()
        } else {
            vb.pp(prefix)
        };

        match XLMRobertaModel::new(config, vb_prefix) {
            Ok(model) => {
                let effective_prefix = if prefix.is_empty() { "<root>" } else { prefix };
                info!("Loaded RoBERTa backbone from '{}'", effective_prefix);
                return Ok(model);
            }
            Err(e) => {
                errors.push(format!(
                    "{}: {}",
                    if prefix.is_empty() { "<root>" } else { prefix },
                    e
                ));
            }
        }
    }

    Err(Error::embedding(format!(
        "Failed to load RoBERTa backbone with tried prefixes [{}]",
        errors.join(" | ")
    )))
}

#[cfg(all(test, feature = "ml-models"))]
mod tests {
    use super::*;

    fn phobert_options() -> EncoderOptions {
        EncoderOptions {
            source: ModelSource::HuggingFace {
                repo_id: "vinai/phobert-base-v2".to_string(),
                revision: "main".to_string(),
            },
            tokenizer_path: None,
            device: DeviceType::Cpu,
            max_length: DEFAULT_MAX_LENGTH,
        }
    }

    #[test]
    fn test_missing_model_dir() {
        let options = EncoderOptions {
            source: ModelSource::LocalDir(PathBuf::from("/no/such/phobert")),
            ..phobert_options()
        };
        assert!(PhobertEncoder::load(&options).is_err());
    }

    /// One-layer encoder with zero weights over the test tokenizer
    fn tiny_encoder(dir: &std::path::Path, max_length: usize) -> PhobertEncoder {
        let config: RobertaConfig = serde_json::from_str(
            r#"{
                "hidden_size": 16,
                "layer_norm_eps": 1e-5,
                "attention_probs_dropout_prob": 0.1,
                "hidden_dropout_prob": 0.1,
                "num_attention_heads": 2,
                "position_embedding_type": "absolute",
                "intermediate_size": 32,
                "hidden_act": "gelu",
                "num_hidden_layers": 1,
                "vocab_size": 16,
                "max_position_embeddings": 16,
                "type_vocab_size": 1,
                "pad_token_id": 1
            }"#,
        )
        .unwrap();

        let device = Device::Cpu;
        let vb = VarBuilder::zeros(DType::F32, &device);
        let tokenizer_path = model::write_test_tokenizer(dir);

        PhobertEncoder {
            name: "tiny".to_string(),
            tokenizer: model::load_tokenizer(&tokenizer_path, max_length).unwrap(),
            model: load_roberta_backbone(&vb, &config).unwrap(),
            device,
            hidden_size: config.hidden_size,
        }
    }

    #[test]
    fn test_overlong_input_is_truncated_not_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let encoder = tiny_encoder(dir.path(), 8);

        // 50 words into an 8-token window and a 16-position table.
        let long = vec!["nhận quà miễn_phí liên_hệ zalo"; 10].join(" ");
        let embedding = encoder.embed(&long).unwrap();
        assert_eq!(embedding.len(), 16);
        assert_eq!(encoder.dimension(), embedding.len());

        let short = encoder.embed("xin chào").unwrap();
        assert_eq!(short.len(), 16);
    }

    #[test]
    #[ignore = "downloads PhoBERT weights"]
    fn test_phobert_cls_embedding() {
        let encoder = PhobertEncoder::load(&phobert_options()).unwrap();
        assert_eq!(encoder.dimension(), 768);

        let short = encoder.embed("nhận quà miễn_phí").unwrap();
        assert_eq!(short.len(), 768);

        // Far past 128 sub-words; truncated, not rejected.
        let long = vec!["liên_hệ zalo"; 400].join(" ");
        let embedding = encoder.embed(&long).unwrap();
        assert_eq!(embedding.len(), 768);

        let again = encoder.embed("nhận quà miễn_phí").unwrap();
        assert_eq!(short, again);
    }
}
