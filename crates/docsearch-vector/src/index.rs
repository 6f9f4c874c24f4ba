//! In-memory exact vector index.
//!
//! Entries live in insertion order; an upsert overwrites the existing slot so
//! the entry keeps its original rank for tie-breaking. The embedding dimension
//! is fixed by the first non-empty `add` and never changes afterwards.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use docsearch_core::error::{Error, Result};
use docsearch_core::types::IndexEntry;

use crate::distance::norm;

#[derive(Debug, Default)]
pub(crate) struct Inner {
    pub(crate) dim: Option<usize>,
    pub(crate) entries: Vec<IndexEntry>,
    pub(crate) norms: Vec<f32>,
    positions: HashMap<String, usize>,
}

#[derive(Debug, Default)]
pub struct VectorIndex {
    inner: RwLock<Inner>,
}

impl VectorIndex {
    pub fn new() -> Self { Self::default() }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, Inner> { self.inner.read().unwrap_or_else(|e| e.into_inner()) }
    fn write(&self) -> RwLockWriteGuard<'_, Inner> { self.inner.write().unwrap_or_else(|e| e.into_inner()) }

    /// Insert or overwrite `entries`. All-or-nothing: if any vector has the
    /// wrong length nothing is stored.
    pub fn add(&self, entries: Vec<IndexEntry>) -> Result<()> {
        if entries.is_empty() { return Ok(()); }
        let mut inner = self.write();
        let expected = inner.dim.unwrap_or(entries[0].vector.len());
        if let Some(bad) = entries.iter().find(|e| e.vector.len() != expected) {
            return Err(Error::DimensionMismatch { expected, actual: bad.vector.len() });
        }

        let (mut inserted, mut updated) = (0usize, 0usize);
        for entry in entries {
            let entry_norm = norm(&entry.vector);
            match inner.positions.get(&entry.id).copied() {
                Some(pos) => {
                    inner.entries[pos] = entry;
                    inner.norms[pos] = entry_norm;
                    updated += 1;
                }
                None => {
                    let pos = inner.entries.len();
                    inner.positions.insert(entry.id.clone(), pos);
                    inner.entries.push(entry);
                    inner.norms.push(entry_norm);
                    inserted += 1;
                }
            }
        }
        inner.dim = Some(expected);
        debug!(inserted, updated, total = inner.entries.len(), dim = expected, "vector index updated");
        Ok(())
    }

    pub fn count(&self) -> usize { self.read().entries.len() }
    pub fn is_empty(&self) -> bool { self.count() == 0 }

    /// Established dimensionality, `None` until the first entry is stored.
    pub fn dim(&self) -> Option<usize> { self.read().dim }

    pub fn contains(&self, id: &str) -> bool { self.read().positions.contains_key(id) }

    pub fn get(&self, id: &str) -> Option<IndexEntry> {
        let inner = self.read();
        inner.positions.get(id).map(|&pos| inner.entries[pos].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsearch_core::types::Meta;

    fn entry(id: &str, vector: Vec<f32>) -> IndexEntry { IndexEntry::new(id, vector, format!("text of {id}"), Meta::new()) }

    #[test]
    fn empty_index_has_no_dimension() {
        let index = VectorIndex::new();
        assert_eq!(index.count(), 0);
        assert_eq!(index.dim(), None);
        index.add(Vec::new()).unwrap();
        assert_eq!(index.dim(), None);
    }

    #[test]
    fn first_insert_fixes_dimension() {
        let index = VectorIndex::new();
        index.add(vec![entry("a", vec![1.0, 0.0, 0.0])]).unwrap();
        assert_eq!(index.dim(), Some(3));
        let err = index.add(vec![entry("b", vec![1.0, 0.0])]).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { expected: 3, actual: 2 }));
    }

    #[test]
    fn mismatched_batch_is_rejected_atomically() {
        let index = VectorIndex::new();
        index.add(vec![entry("a", vec![1.0, 0.0])]).unwrap();
        let batch = vec![entry("a", vec![0.0, 1.0]), entry("b", vec![1.0, 1.0]), entry("c", vec![1.0])];
        assert!(index.add(batch).is_err());
        assert_eq!(index.count(), 1);
        assert_eq!(index.get("a").map(|e| e.vector), Some(vec![1.0, 0.0]), "existing entry untouched");
        assert!(!index.contains("b"));
    }

    #[test]
    fn inconsistent_first_batch_leaves_index_unfixed() {
        let index = VectorIndex::new();
        assert!(index.add(vec![entry("a", vec![1.0, 0.0]), entry("b", vec![1.0])]).is_err());
        assert_eq!(index.dim(), None);
        index.add(vec![entry("c", vec![1.0])]).unwrap();
        assert_eq!(index.dim(), Some(1));
    }

    #[test]
    fn upsert_overwrites_in_place() {
        let index = VectorIndex::new();
        index.add(vec![entry("a", vec![1.0, 0.0]), entry("b", vec![0.0, 1.0])]).unwrap();
        let mut meta = Meta::new();
        meta.insert("k".to_string(), "v".to_string());
        index.add(vec![IndexEntry::new("a", vec![0.5, 0.5], "new text", meta.clone())]).unwrap();

        assert_eq!(index.count(), 2);
        let a = index.get("a").unwrap();
        assert_eq!(a.vector, vec![0.5, 0.5]);
        assert_eq!(a.text, "new text");
        assert_eq!(a.metadata, meta);
    }

    #[test]
    fn duplicate_ids_in_one_batch_keep_last() {
        let index = VectorIndex::new();
        index.add(vec![entry("a", vec![1.0]), entry("a", vec![2.0])]).unwrap();
        assert_eq!(index.count(), 1);
        assert_eq!(index.get("a").unwrap().vector, vec![2.0]);
    }
}
