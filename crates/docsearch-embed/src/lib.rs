//! docsearch-embed
//!
//! Embedder adapters behind `docsearch_core::traits::Embedder`: a candle BERT
//! sentence model, a deterministic hashing embedder for tests/offline use, and
//! a content-hash cache that wraps either.

use anyhow::Result;
use tracing::info;

use docsearch_core::config::EmbeddingSettings;
use docsearch_core::traits::Embedder;

pub mod bert;
pub mod cache;
pub mod device;
pub mod hash;
pub mod pool;
pub mod tokenize;

pub use bert::BertEmbedder;
pub use cache::CachedEmbedder;
pub use hash::HashEmbedder;
pub use pool::masked_mean_l2;

fn fake_requested() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false)
}

/// Build the embedder described by `settings`.
///
/// `APP_USE_FAKE_EMBEDDINGS=1` forces the hashing embedder regardless of settings.
pub fn default_embedder(settings: &EmbeddingSettings) -> Result<Box<dyn Embedder>> {
    let inner: Box<dyn Embedder> = if settings.use_fake || fake_requested() {
        info!(dim = settings.fake_dim, "using hashing embedder");
        Box::new(HashEmbedder::new(settings.fake_dim))
    } else {
        let dir = bert::resolve_model_dir(&settings.model_dir)?;
        Box::new(BertEmbedder::load(&dir, settings.max_len)?)
    };
    if settings.cache { Ok(Box::new(CachedEmbedder::new(inner))) } else { Ok(inner) }
}
