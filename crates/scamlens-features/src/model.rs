//! Model file resolution and loading helpers for Candle-backed encoders

use candle_core::{DType, Device};
use candle_nn::VarBuilder;
use hf_hub::{api::sync::Api, Repo, RepoType};
use scamlens_core::{Error, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info};

/// Source location for model files
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    /// Directory on the local file system
    LocalDir(PathBuf),

    /// Download from Hugging Face Hub
    HuggingFace { repo_id: String, revision: String },
}

/// Device type for inference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    /// CPU inference (always available)
    Cpu,
    /// CUDA GPU inference (if available)
    Cuda(usize), // GPU index
    /// Metal (Apple Silicon)
    Metal(usize),
}

impl DeviceType {
    /// Create the Candle device
    pub fn create(self) -> Result<Device> {
        match self {
            Self::Cpu => Ok(Device::Cpu),
            Self::Cuda(idx) => Device::new_cuda(idx)
                .map_err(|e| Error::embedding(format!("Failed to create CUDA device: {}", e))),
            Self::Metal(idx) => Device::new_metal(idx)
                .map_err(|e| Error::embedding(format!("Failed to create Metal device: {}", e))),
        }
    }
}

/// Weight files tried in order
const WEIGHT_FILES: [&str; 2] = ["model.safetensors", "pytorch_model.bin"];

/// Resolve a directory holding `config.json`, tokenizer and weights
pub fn resolve_model_dir(source: &ModelSource) -> Result<PathBuf> {
    match source {
        ModelSource::LocalDir(path) => {
            if !path.is_dir() {
                return Err(Error::config(format!(
                    "Model directory not found: {}",
                    path.display()
                )));
            }
            Ok(path.clone())
        }
        ModelSource::HuggingFace { repo_id, revision } => {
            download_from_huggingface(repo_id, revision)
        }
    }
}

fn download_from_huggingface(repo_id: &str, revision: &str) -> Result<PathBuf> {
    info!("Downloading model from HuggingFace: {} @ {}", repo_id, revision);

    let api = Api::new()
        .map_err(|e| Error::embedding(format!("Failed to initialize HF API: {}", e)))?;
    let repo = api.repo(Repo::with_revision(
        repo_id.to_string(),
        RepoType::Model,
        revision.to_string(),
    ));

    let config_path = repo
        .get("config.json")
        .map_err(|e| Error::embedding(format!("Failed to download config.json: {}", e)))?;

    let found_weights = WEIGHT_FILES.iter().any(|file| match repo.get(file) {
        Ok(_) => {
            debug!("Found weight file: {}", file);
            true
        }
        Err(_) => false,
    });
    if !found_weights {
        return Err(Error::embedding(format!(
            "No model weights found in {} (tried {})",
            repo_id,
            WEIGHT_FILES.join(", ")
        )));
    }

    if let Err(e) = repo.get("tokenizer.json") {
        debug!("tokenizer.json not available from hub: {}", e);
    }

    let model_dir = config_path
        .parent()
        .ok_or_else(|| Error::embedding("Invalid cache path"))?;

    info!("Model available at: {}", model_dir.display());
    Ok(model_dir.to_path_buf())
}

/// Read and parse a JSON config file
pub fn parse_json_config<T: DeserializeOwned>(config_path: &Path) -> Result<T> {
    let config_str = std::fs::read_to_string(config_path).map_err(|e| {
        Error::embedding(format!(
            "Failed to read config {}: {}",
            config_path.display(),
            e
        ))
    })?;

    serde_json::from_str(&config_str).map_err(|e| {
        Error::embedding(format!(
            "Failed to parse config {}: {}",
            config_path.display(),
            e
        ))
    })
}

/// Memory-map safetensors weights, or fall back to a PyTorch checkpoint
pub fn load_var_builder(model_dir: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    let safetensors = model_dir.join(WEIGHT_FILES[0]);
    if safetensors.exists() {
        // SAFETY: the file is not modified while mapped.
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[safetensors], DType::F32, device)
                .map_err(|e| Error::embedding(format!("Failed to load SafeTensors: {}", e)))?
        };
        return Ok(vb);
    }

    let pth = model_dir.join(WEIGHT_FILES[1]);
    if pth.exists() {
        return VarBuilder::from_pth(&pth, DType::F32, device)
            .map_err(|e| Error::embedding(format!("Failed to load PyTorch weights: {}", e)));
    }

    Err(Error::embedding(format!(
        "No weights in {} (expected {})",
        model_dir.display(),
        WEIGHT_FILES.join(" or ")
    )))
}

/// Load `tokenizer.json` and truncate encodings to `max_length` tokens,
/// boundary markers included
pub fn load_tokenizer(path: &Path, max_length: usize) -> Result<Tokenizer> {
    let mut tokenizer = Tokenizer::from_file(path).map_err(|e| {
        Error::embedding(format!("Failed to load tokenizer {}: {}", path.display(), e))
    })?;

    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length,
            ..Default::default()
        }))
        .map_err(|e| Error::embedding(format!("Failed to configure truncation: {}", e)))?;
    tokenizer.with_padding(None);

    Ok(tokenizer)
}

/// Write a whitespace word-level `tokenizer.json` with RoBERTa `<s>`/`</s>`
/// markers into `dir`
#[cfg(test)]
pub(crate) fn write_test_tokenizer(dir: &Path) -> PathBuf {
    let json = r#"{
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [],
        "normalizer": null,
        "pre_tokenizer": {"type": "WhitespaceSplit"},
        "post_processor": {
            "type": "RobertaProcessing",
            "sep": ["</s>", 2],
            "cls": ["<s>", 0],
            "trim_offsets": true,
            "add_prefix_space": false
        },
        "decoder": null,
        "model": {
            "type": "WordLevel",
            "vocab": {
                "<s>": 0, "<pad>": 1, "</s>": 2, "<unk>": 3,
                "xin": 4, "chào": 5, "liên_hệ": 6, "zalo": 7,
                "nhận": 8, "quà": 9, "miễn_phí": 10
            },
            "unk_token": "<unk>"
        }
    }"#;

    let path = dir.join("tokenizer.json");
    std::fs::write(&path, json).unwrap();
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_dir_must_exist() {
        let err = resolve_model_dir(&ModelSource::LocalDir(PathBuf::from(
            "/definitely/not/a/model/dir",
        )))
        .unwrap_err();
        assert_eq!(err.kind(), scamlens_core::ErrorKind::Config);
    }

    #[test]
    fn test_local_dir_resolves() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = resolve_model_dir(&ModelSource::LocalDir(dir.path().to_path_buf())).unwrap();
        assert_eq!(resolved, dir.path());
    }

    #[test]
    fn test_missing_weights() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_var_builder(dir.path(), &Device::Cpu).err().unwrap();
        assert_eq!(err.kind(), scamlens_core::ErrorKind::Embedding);
    }

    #[test]
    fn test_parse_json_config() {
        #[derive(serde::Deserialize)]
        struct Dims {
            hidden_size: usize,
        }

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"hidden_size": 768, "model_type": "roberta"}"#).unwrap();

        let dims: Dims = parse_json_config(&path).unwrap();
        assert_eq!(dims.hidden_size, 768);

        let missing = parse_json_config::<Dims>(&dir.path().join("nope.json"));
        assert!(missing.is_err());
    }

    #[test]
    fn test_tokenizer_truncates_with_markers() {
        let dir = tempfile::tempdir().unwrap();
        let tokenizer = load_tokenizer(&write_test_tokenizer(dir.path()), 8).unwrap();

        let long = vec!["nhận quà miễn_phí liên_hệ zalo"; 10].join(" ");
        let encoding = tokenizer.encode(long.as_str(), true).unwrap();
        let ids = encoding.get_ids();
        assert_eq!(ids.len(), 8);
        assert_eq!(ids[0], 0);
        assert_eq!(ids[7], 2);
        assert_eq!(&ids[1..7], &[8, 9, 10, 6, 7, 8]);

        let short = tokenizer.encode("xin chào", true).unwrap();
        assert_eq!(short.get_ids(), &[0, 4, 5, 2]);
    }

    #[test]
    fn test_missing_tokenizer_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_tokenizer(&dir.path().join("tokenizer.json"), 8).unwrap_err();
        assert_eq!(err.kind(), scamlens_core::ErrorKind::Embedding);
    }

    #[test]
    fn test_cpu_device() {
        assert!(matches!(DeviceType::Cpu.create().unwrap(), Device::Cpu));
    }
}
