//! Word-window chunking with overlap.
//!
//! Text is split on whitespace; windows of `chunk_size` words advance by
//! `chunk_size - overlap` words, so consecutive windows share exactly `overlap`
//! words. Window text is rejoined with single spaces. A text that already fits
//! in one window is returned verbatim as chunk 0.

use crate::error::{Error, Result};
use crate::types::{Chunk, Document, Meta};

pub const DEFAULT_CHUNK_SIZE: usize = 300;
pub const DEFAULT_OVERLAP: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentChunker {
    chunk_size: usize,
    overlap: usize,
}

impl Default for DocumentChunker {
    fn default() -> Self { Self { chunk_size: DEFAULT_CHUNK_SIZE, overlap: DEFAULT_OVERLAP } }
}

impl DocumentChunker {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::Configuration("chunk_size must be > 0".to_string()));
        }
        if overlap >= chunk_size {
            return Err(Error::Configuration(format!("overlap ({}) must be < chunk_size ({})", overlap, chunk_size)));
        }
        Ok(Self { chunk_size, overlap })
    }

    pub fn chunk_size(&self) -> usize { self.chunk_size }
    pub fn overlap(&self) -> usize { self.overlap }
    fn stride(&self) -> usize { self.chunk_size - self.overlap }

    /// Number of chunks produced for a text of `word_count` words.
    pub fn expected_chunks(&self, word_count: usize) -> usize {
        if word_count <= self.chunk_size { 1 } else { (word_count - self.chunk_size).div_ceil(self.stride()) + 1 }
    }

    pub fn chunk<'a>(&self, text: &'a str, doc_id: &'a str) -> Chunks<'a> { self.chunk_with_meta(text, doc_id, None) }

    /// Chunk a loaded document, copying its metadata onto every chunk.
    pub fn chunk_document<'a>(&self, doc: &'a Document) -> Chunks<'a> { self.chunk_with_meta(&doc.text, &doc.id, Some(&doc.metadata)) }

    pub fn chunk_with_meta<'a>(&self, text: &'a str, doc_id: &'a str, source: Option<&'a Meta>) -> Chunks<'a> {
        let words: Vec<&'a str> = text.split_whitespace().collect();
        let total = self.expected_chunks(words.len());
        Chunks { text, words, doc_id, source, chunk_size: self.chunk_size, stride: self.stride(), next: 0, total }
    }

    pub fn chunk_all(&self, text: &str, doc_id: &str) -> Vec<Chunk> { self.chunk(text, doc_id).collect() }
}

/// Lazy sequence of chunks for one document. Clone it to restart from the same position.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    text: &'a str,
    words: Vec<&'a str>,
    doc_id: &'a str,
    source: Option<&'a Meta>,
    chunk_size: usize,
    stride: usize,
    next: usize,
    total: usize,
}

impl Chunks<'_> {
    pub fn word_count(&self) -> usize { self.words.len() }
}

impl Iterator for Chunks<'_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if self.next >= self.total { return None; }
        let index = self.next;
        self.next += 1;
        let text = if self.words.len() <= self.chunk_size {
            self.text.to_string()
        } else {
            let start = index * self.stride;
            let end = (start + self.chunk_size).min(self.words.len());
            self.words[start..end].join(" ")
        };
        let empty = Meta::new();
        Some(Chunk::new(self.doc_id, index, text, self.source.unwrap_or(&empty)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.total - self.next;
        (left, Some(left))
    }
}

impl ExactSizeIterator for Chunks<'_> {}
