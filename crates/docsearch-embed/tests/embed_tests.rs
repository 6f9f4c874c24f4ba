use std::sync::atomic::{AtomicUsize, Ordering};

use docsearch_core::config::EmbeddingSettings;
use docsearch_core::error::Result;
use docsearch_core::traits::Embedder;
use docsearch_embed::{default_embedder, CachedEmbedder, HashEmbedder};

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    dot / (na * nb)
}

#[test]
fn hash_embedder_shapes_and_determinism() {
    let embedder = HashEmbedder::new(384);
    let texts = vec!["hello world".to_string(), "hello world".to_string(), "another text".to_string()];
    let embs = embedder.embed(&texts).expect("embed");

    assert_eq!(embs.len(), 3);
    assert!(embs.iter().all(|v| v.len() == 384), "embedding dim is 384");

    let norm: f32 = embs[0].iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    for (a, b) in embs[0].iter().zip(embs[1].iter()) { assert!((a - b).abs() <= 1e-6); }
}

#[test]
fn empty_batch_returns_empty() {
    let embedder = HashEmbedder::new(16);
    assert!(embedder.embed(&[]).unwrap().is_empty());
}

#[test]
fn embed_one_returns_a_single_vector() {
    let embedder = HashEmbedder::new(32);
    let v = embedder.embed_one("test query").unwrap();
    assert_eq!(v.len(), 32);
    assert_eq!(v, embedder.embed(&["test query".to_string()]).unwrap()[0]);
}

#[test]
fn related_texts_are_closer_than_unrelated() {
    let embedder = HashEmbedder::new(384);
    let e1 = embedder.embed_one("Python programming").unwrap();
    let e2 = embedder.embed_one("coding in Python").unwrap();
    let e3 = embedder.embed_one("eating pizza").unwrap();
    assert!(cosine(&e1, &e2) > cosine(&e1, &e3));
}

#[test]
fn default_embedder_honours_fake_setting() {
    let settings = EmbeddingSettings { use_fake: true, fake_dim: 64, cache: false, ..EmbeddingSettings::default() };
    let embedder = default_embedder(&settings).expect("embedder");
    assert_eq!(embedder.dim(), 64);
    assert_eq!(embedder.model_id(), "hash:xxh64:d64");
}

struct CountingEmbedder { calls: AtomicUsize, texts: AtomicUsize }

impl Embedder for CountingEmbedder {
    fn model_id(&self) -> &str { "counting" }
    fn dim(&self) -> usize { 2 }
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.texts.fetch_add(texts.len(), Ordering::SeqCst);
        Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
    }
}

#[test]
fn cache_only_embeds_unseen_text() {
    let cached = CachedEmbedder::new(CountingEmbedder { calls: AtomicUsize::new(0), texts: AtomicUsize::new(0) });
    let first = cached.embed(&["a".to_string(), "bb".to_string(), "a".to_string()]).unwrap();
    assert_eq!(first, vec![vec![1.0, 1.0], vec![2.0, 1.0], vec![1.0, 1.0]]);
    assert_eq!(cached.inner().texts.load(Ordering::SeqCst), 2, "duplicates in one batch are embedded once");

    let second = cached.embed(&["bb".to_string(), "ccc".to_string()]).unwrap();
    assert_eq!(second, vec![vec![2.0, 1.0], vec![3.0, 1.0]]);
    assert_eq!(cached.inner().texts.load(Ordering::SeqCst), 3);

    cached.embed(&["a".to_string()]).unwrap();
    assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 2, "full hit does not call the model");
    assert_eq!(cached.len(), 3);
    assert_eq!(cached.misses(), 3);
}

#[test]
fn single_text_lookups_do_not_grow_the_cache() {
    let cached = CachedEmbedder::new(CountingEmbedder { calls: AtomicUsize::new(0), texts: AtomicUsize::new(0) });
    cached.embed(&["indexed".to_string()]).unwrap();

    for q in ["first query", "second query", "third query"] {
        assert_eq!(cached.embed_one(q).unwrap(), vec![q.len() as f32, 1.0]);
    }
    assert_eq!(cached.len(), 1);
    assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 4);

    assert_eq!(cached.embed_one("indexed").unwrap(), vec![7.0, 1.0]);
    assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 4, "known text is served from the cache");
    assert_eq!(cached.hits(), 1);
}

/// Requires a local `all-MiniLM-L6-v2` checkout; run with
/// `APP_MODEL_DIR=/path/to/all-MiniLM-L6-v2 cargo test -p docsearch-embed -- --ignored`
#[ignore]
#[test]
fn bert_model_similarity() {
    let settings = EmbeddingSettings { cache: false, ..EmbeddingSettings::default() };
    let embedder = default_embedder(&settings).expect("model");
    assert_eq!(embedder.dim(), 384);
    let embs = embedder
        .embed(&["Python programming".to_string(), "coding in Python".to_string(), "eating pizza".to_string()])
        .unwrap();
    assert!(embs.iter().all(|v| v.len() == 384));
    assert!(cosine(&embs[0], &embs[1]) > cosine(&embs[0], &embs[2]));
}
