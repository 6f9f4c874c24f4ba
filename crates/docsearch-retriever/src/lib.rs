//! docsearch-retriever
//!
//! Ties loader, chunker, embedder and vector store together. Ingestion runs
//! load → chunk → embed (batched) → one atomic `add`; search embeds the query
//! and delegates to the store.

use std::path::Path;
use std::sync::RwLock;

use tracing::{debug, info};

use docsearch_core::config::Settings;
use docsearch_core::error::{Error, Result};
use docsearch_core::traits::{Embedder, VectorStore};
use docsearch_core::types::{Chunk, Document, IndexEntry, QueryResult};
use docsearch_core::{DocumentChunker, DocumentLoader};
use docsearch_vector::VectorIndex;

pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Ingestion state owned by one retriever. `indexed` flips once and stays set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetrieverState {
    pub indexed: bool,
    pub entries_indexed: usize,
    pub documents_seen: usize,
}

pub struct Retriever<S: VectorStore = VectorIndex> {
    loader: DocumentLoader,
    chunker: Option<DocumentChunker>,
    embedder: Box<dyn Embedder>,
    store: S,
    batch_size: usize,
    state: RwLock<RetrieverState>,
}

impl Retriever<VectorIndex> {
    pub fn new(embedder: Box<dyn Embedder>) -> Self { Self::with_store(VectorIndex::new(), embedder) }

    pub fn from_settings(settings: &Settings, embedder: Box<dyn Embedder>) -> Result<Self> {
        settings.validate()?;
        Ok(Self::new(embedder)
            .with_loader(DocumentLoader::with_extensions(settings.data.extensions.iter().cloned()))
            .with_chunker(settings.chunker()?)
            .with_batch_size(settings.embedding.batch_size))
    }
}

impl<S: VectorStore> Retriever<S> {
    pub fn with_store(store: S, embedder: Box<dyn Embedder>) -> Self {
        Self {
            loader: DocumentLoader::default(),
            chunker: Some(DocumentChunker::default()),
            embedder,
            store,
            batch_size: DEFAULT_BATCH_SIZE,
            state: RwLock::new(RetrieverState::default()),
        }
    }

    pub fn with_loader(mut self, loader: DocumentLoader) -> Self { self.loader = loader; self }
    /// `None` indexes every document as a single chunk.
    pub fn with_chunker(mut self, chunker: Option<DocumentChunker>) -> Self { self.chunker = chunker; self }
    pub fn with_batch_size(mut self, batch_size: usize) -> Self { self.batch_size = batch_size.max(1); self }

    pub fn store(&self) -> &S { &self.store }
    pub fn embedder(&self) -> &dyn Embedder { self.embedder.as_ref() }
    pub fn state(&self) -> RetrieverState { *self.state.read().unwrap_or_else(|e| e.into_inner()) }
    pub fn is_indexed(&self) -> bool { self.state().indexed }

    /// Load every document under `source` and index it. Returns the number of
    /// entries that did not exist before (re-indexing unchanged text returns 0).
    pub fn index_documents(&self, source: &Path) -> Result<usize> {
        let report = self.loader.load(source)?;
        info!(source = %source.display(), documents = report.documents.len(), skipped = report.skipped.len(), "loaded documents");
        self.index_loaded(&report.documents)
    }

    pub fn index_loaded(&self, documents: &[Document]) -> Result<usize> {
        let chunks: Vec<Chunk> = documents.iter().flat_map(|doc| self.split(doc)).collect();
        debug!(documents = documents.len(), chunks = chunks.len(), "chunked documents");
        let added = self.index_chunks(chunks)?;
        self.state.write().unwrap_or_else(|e| e.into_inner()).documents_seen += documents.len();
        Ok(added)
    }

    /// Embed and store pre-chunked records.
    pub fn index_chunks(&self, chunks: Vec<Chunk>) -> Result<usize> {
        let before = self.store.count();
        let mut entries = Vec::with_capacity(chunks.len());
        for (n, batch) in chunks.chunks(self.batch_size).enumerate() {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let vectors = self.embedder.embed(&texts)?;
            if vectors.len() != batch.len() {
                return Err(Error::Embedding(format!("embedder returned {} vectors for {} texts", vectors.len(), batch.len())));
            }
            debug!(batch = n, size = batch.len(), "embedded batch");
            entries.extend(batch.iter().cloned().zip(vectors).map(|(c, v)| IndexEntry::from_chunk(c, v)));
        }
        self.store.add(entries)?;
        let added = self.store.count().saturating_sub(before);

        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        state.indexed = true;
        state.entries_indexed += added;
        info!(added, total = self.store.count(), model = self.embedder.model_id(), "indexing complete");
        Ok(added)
    }

    pub fn search(&self, query: &str, n_results: usize) -> Result<Vec<QueryResult>> {
        if !self.is_indexed() { return Err(Error::NotIndexed); }
        let q_vec = self.embedder.embed_one(query)?;
        let results = self.store.search(&q_vec, n_results)?;
        debug!(query, n_results, hits = results.len(), "search");
        Ok(results)
    }

    pub fn document_count(&self) -> usize { self.store.count() }

    fn split(&self, doc: &Document) -> Vec<Chunk> {
        match &self.chunker {
            Some(chunker) => chunker.chunk_document(doc).collect(),
            None => vec![Chunk::new(&doc.id, 0, doc.text.clone(), &doc.metadata)],
        }
    }
}
