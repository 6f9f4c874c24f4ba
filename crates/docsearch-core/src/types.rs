//! Domain types shared by the chunker, loader, index and retriever.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type ChunkId = String;
pub type Meta = HashMap<String, String>;

/// Metadata key holding the parent document id.
pub const META_DOC_ID: &str = "doc_id";
/// Metadata key holding the chunk's position within its document.
pub const META_CHUNK_INDEX: &str = "chunk_index";

/// A source document as produced by the loader.
///
/// Lives only for the duration of an ingestion run; only its chunks are stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub text: String,
    pub metadata: Meta,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into(), metadata: Meta::new() }
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A word-window of a document that is embedded and indexed on its own.
///
/// - `id`: `"{doc_id}_{chunk_index}"`, unique within the document
/// - `metadata`: always carries `doc_id` and `chunk_index`, plus any source fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub doc_id: String,
    pub chunk_index: usize,
    pub text: String,
    pub metadata: Meta,
}

impl Chunk {
    pub fn new(doc_id: &str, chunk_index: usize, text: String, source: &Meta) -> Self {
        let mut metadata = source.clone();
        metadata.insert(META_DOC_ID.to_string(), doc_id.to_string());
        metadata.insert(META_CHUNK_INDEX.to_string(), chunk_index.to_string());
        Self { id: chunk_id(doc_id, chunk_index), doc_id: doc_id.to_string(), chunk_index, text, metadata }
    }
}

pub fn chunk_id(doc_id: &str, chunk_index: usize) -> ChunkId { format!("{}_{}", doc_id, chunk_index) }

/// A stored, embedded chunk. Owned by the vector index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: ChunkId,
    pub vector: Vec<f32>,
    pub text: String,
    pub metadata: Meta,
}

impl IndexEntry {
    pub fn new(id: impl Into<String>, vector: Vec<f32>, text: impl Into<String>, metadata: Meta) -> Self {
        Self { id: id.into(), vector, text: text.into(), metadata }
    }

    pub fn from_chunk(chunk: Chunk, vector: Vec<f32>) -> Self {
        Self { id: chunk.id, vector, text: chunk.text, metadata: chunk.metadata }
    }
}

/// One ranked search hit.
///
/// `distance` is cosine distance (`1 - cosine similarity`); lower is better and
/// result lists are always sorted ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub id: ChunkId,
    pub text: String,
    pub metadata: Meta,
    pub distance: f32,
}

impl QueryResult {
    pub fn similarity(&self) -> f32 { 1.0 - self.distance }
}
