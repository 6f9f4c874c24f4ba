//! Write-through embedding cache keyed by content hash.
//!
//! Re-indexing a source whose text has not changed is served from memory;
//! only unseen texts reach the wrapped model, in one batch per call.
//! Single-text lookups (`embed_one`, used for queries) read the cache but never
//! add to it, so an interactive session does not grow the map.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use tracing::debug;

use docsearch_core::error::{Error, Result};
use docsearch_core::traits::Embedder;

fn hash_content(s: &str) -> String { blake3::hash(s.as_bytes()).to_hex().to_string() }

pub struct CachedEmbedder<E> {
    inner: E,
    entries: Mutex<HashMap<String, Vec<f32>>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl<E: Embedder> CachedEmbedder<E> {
    pub fn new(inner: E) -> Self {
        Self { inner, entries: Mutex::new(HashMap::new()), hits: AtomicUsize::new(0), misses: AtomicUsize::new(0) }
    }

    pub fn inner(&self) -> &E { &self.inner }
    pub fn len(&self) -> usize { self.entries.lock().unwrap_or_else(|e| e.into_inner()).len() }
    pub fn is_empty(&self) -> bool { self.len() == 0 }
    pub fn hits(&self) -> usize { self.hits.load(Ordering::Relaxed) }
    pub fn misses(&self) -> usize { self.misses.load(Ordering::Relaxed) }
}

impl<E: Embedder> Embedder for CachedEmbedder<E> {
    fn model_id(&self) -> &str { self.inner.model_id() }
    fn dim(&self) -> usize { self.inner.dim() }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() { return Ok(Vec::new()); }
        let hashes: Vec<String> = texts.iter().map(|t| hash_content(t)).collect();

        let mut miss_texts = Vec::new();
        let mut miss_hashes = Vec::new();
        {
            let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            for (text, h) in texts.iter().zip(&hashes) {
                if !entries.contains_key(h) && !miss_hashes.contains(h) {
                    miss_texts.push(text.clone());
                    miss_hashes.push(h.clone());
                }
            }
        }
        self.hits.fetch_add(texts.len() - miss_texts.len(), Ordering::Relaxed);
        self.misses.fetch_add(miss_texts.len(), Ordering::Relaxed);

        // model call happens outside the lock
        let fresh = if miss_texts.is_empty() { Vec::new() } else { self.inner.embed(&miss_texts)? };
        if fresh.len() != miss_texts.len() {
            return Err(Error::Embedding(format!("embedder returned {} vectors for {} texts", fresh.len(), miss_texts.len())));
        }
        debug!(requested = texts.len(), computed = fresh.len(), "embedding cache lookup");

        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        for (h, v) in miss_hashes.into_iter().zip(fresh) { entries.insert(h, v); }
        hashes
            .iter()
            .map(|h| entries.get(h).cloned().ok_or_else(|| Error::Embedding("cache entry vanished".to_string())))
            .collect()
    }

    fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let cached = self.entries.lock().unwrap_or_else(|e| e.into_inner()).get(&hash_content(text)).cloned();
        match cached {
            Some(v) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Ok(v)
            }
            None => self.inner.embed_one(text),
        }
    }
}
