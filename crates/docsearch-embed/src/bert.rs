//! Sentence embeddings from a local BERT checkpoint (e.g. `all-MiniLM-L6-v2`).
//!
//! The model directory must contain `config.json`, `tokenizer.json` and either
//! `model.safetensors` or `pytorch_model.bin`. Output vectors are mean-pooled
//! over real tokens and L2-normalized.

use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use docsearch_core::error::{Error, Result as CoreResult};
use docsearch_core::traits::Embedder;

use crate::device::select_device;
use crate::pool::masked_mean_l2;
use crate::tokenize::tokenize_batch;

pub const DEFAULT_MAX_LEN: usize = 256;

pub struct BertEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    pad_id: u32,
    max_len: usize,
    dim: usize,
    id: String,
}

impl BertEmbedder {
    pub fn load(model_dir: &Path, max_len: usize) -> Result<Self> {
        let device = select_device();
        info!(dir = %model_dir.display(), "loading sentence embedding model");

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;
        let pad_id = tokenizer.token_to_id("[PAD]").unwrap_or(0);

        let config_path = model_dir.join("config.json");
        let config: BertConfig = serde_json::from_str(&std::fs::read_to_string(&config_path).with_context(|| format!("reading {}", config_path.display()))?)?;
        let dim = config.hidden_size;
        let max_len = max_len.min(config.max_position_embeddings);

        let weights = load_weights(model_dir, &device)?;
        let vb = VarBuilder::from_tensors(weights, DType::F32, &device);
        let model = BertModel::load(vb, &config)?;

        let name = model_dir.file_name().map(|s| s.to_string_lossy().to_string()).unwrap_or_else(|| "bert".to_string());
        let id = format!("bert:{}:d{}", name, dim);
        info!(model = %id, max_len, "model loaded");
        Ok(Self { model, tokenizer, device, pad_id, max_len, dim, id })
    }

    fn forward_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let start = Instant::now();
        let (input_ids, attention_mask) = tokenize_batch(&self.tokenizer, texts, self.max_len, self.pad_id, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self.model.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        let vectors: Vec<Vec<f32>> = pooled.to_device(&Device::Cpu)?.to_dtype(DType::F32)?.to_vec2()?;
        let elapsed = start.elapsed();
        debug!(batch = texts.len(), ms = elapsed.as_millis() as u64, "embedded batch");
        if elapsed.as_millis() > 100 * texts.len() as u128 { warn!(batch = texts.len(), ms = elapsed.as_millis() as u64, "slow embedding"); }
        Ok(vectors)
    }
}

impl Embedder for BertEmbedder {
    fn model_id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }

    fn embed(&self, texts: &[String]) -> CoreResult<Vec<Vec<f32>>> {
        if texts.is_empty() { return Ok(Vec::new()); }
        self.forward_batch(texts).map_err(Error::embedding)
    }
}

fn load_weights(model_dir: &Path, device: &Device) -> Result<HashMap<String, Tensor>> {
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.exists() {
        debug!(path = %safetensors.display(), "reading safetensors weights");
        return Ok(candle_core::safetensors::load(&safetensors, device)?);
    }
    let pickle = model_dir.join("pytorch_model.bin");
    if pickle.exists() {
        debug!(path = %pickle.display(), "reading pytorch weights");
        let weights = candle_core::pickle::read_all(&pickle)?;
        return weights.into_iter().map(|(k, t)| Ok((k, t.to_device(device)?))).collect();
    }
    Err(anyhow!("No model.safetensors or pytorch_model.bin in {}", model_dir.display()))
}

/// Locate the model directory: `APP_MODEL_DIR`, then `MODEL_DIR`, then the configured path.
pub fn resolve_model_dir(configured: &str) -> Result<PathBuf> {
    for var in ["APP_MODEL_DIR", "MODEL_DIR"] {
        if let Ok(dir) = std::env::var(var) {
            let p = docsearch_core::config::expand_path(&dir);
            if p.exists() { info!(var, dir = %p.display(), "using model dir from environment"); return Ok(p); }
        }
    }
    let p = docsearch_core::config::expand_path(configured);
    if p.exists() { return Ok(p); }
    Err(anyhow!("Could not locate embedding model directory (tried APP_MODEL_DIR, MODEL_DIR, {})", p.display()))
}
