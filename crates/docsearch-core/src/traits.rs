use crate::error::Result;
use crate::types::{IndexEntry, QueryResult};

/// Text → vector capability.
///
/// Implementations must return one vector per input, in input order, all of
/// length `dim()` for the lifetime of the instance.
pub trait Embedder: Send + Sync {
    /// Stable identifier for the model configuration (e.g. `bert:all-MiniLM-L6-v2:d384`).
    fn model_id(&self) -> &str;
    fn dim(&self) -> usize;
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(&[text.to_string()])?
            .pop()
            .ok_or_else(|| crate::error::Error::Embedding("embedder returned no vector".to_string()))
    }
}

impl<E: Embedder + ?Sized> Embedder for Box<E> {
    fn model_id(&self) -> &str { (**self).model_id() }
    fn dim(&self) -> usize { (**self).dim() }
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> { (**self).embed(texts) }
    fn embed_one(&self, text: &str) -> Result<Vec<f32>> { (**self).embed_one(text) }
}

/// Storage + similarity search over embedded chunks.
pub trait VectorStore: Send + Sync {
    fn add(&self, entries: Vec<IndexEntry>) -> Result<()>;
    fn count(&self) -> usize;
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<QueryResult>>;
}
