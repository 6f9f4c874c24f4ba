use std::cmp::Ordering;

use docsearch_core::error::{Error, Result};
use docsearch_core::traits::VectorStore;
use docsearch_core::types::{IndexEntry, QueryResult};

use crate::distance::{cosine_distance_with_norms, norm};
use crate::index::VectorIndex;

/// Ascending distance, then insertion position.
fn rank(a: &(usize, f32), b: &(usize, f32)) -> Ordering { a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)) }

impl VectorIndex {
    /// Exact top-`k` by cosine distance, best first. Scans every entry.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<QueryResult>> {
        let inner = self.read();
        let Some(dim) = inner.dim else { return Ok(Vec::new()) };
        if query.len() != dim { return Err(Error::DimensionMismatch { expected: dim, actual: query.len() }); }
        if k == 0 { return Ok(Vec::new()); }

        let q_norm = norm(query);
        let mut scored: Vec<(usize, f32)> = inner
            .entries
            .iter()
            .zip(&inner.norms)
            .enumerate()
            .map(|(pos, (e, &n))| (pos, cosine_distance_with_norms(query, q_norm, &e.vector, n)))
            .collect();
        if k < scored.len() {
            scored.select_nth_unstable_by(k, rank);
            scored.truncate(k);
        }
        scored.sort_by(rank);

        Ok(scored
            .into_iter()
            .map(|(pos, distance)| {
                let e = &inner.entries[pos];
                QueryResult { id: e.id.clone(), text: e.text.clone(), metadata: e.metadata.clone(), distance }
            })
            .collect())
    }
}

impl VectorStore for VectorIndex {
    fn add(&self, entries: Vec<IndexEntry>) -> Result<()> { VectorIndex::add(self, entries) }
    fn count(&self) -> usize { VectorIndex::count(self) }
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<QueryResult>> { VectorIndex::search(self, query, k) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsearch_core::types::Meta;

    fn entry(id: &str, vector: Vec<f32>) -> IndexEntry { IndexEntry::new(id, vector, id.to_uppercase(), Meta::new()) }

    fn ids(results: &[QueryResult]) -> Vec<&str> { results.iter().map(|r| r.id.as_str()).collect() }

    #[test]
    fn empty_index_returns_nothing() {
        let index = VectorIndex::new();
        assert!(index.search(&[1.0, 2.0], 5).unwrap().is_empty());
    }

    #[test]
    fn ranks_by_cosine_distance() {
        let index = VectorIndex::new();
        index.add(vec![entry("x", vec![1.0, 0.0]), entry("y", vec![0.0, 1.0]), entry("xy", vec![1.0, 1.0])]).unwrap();
        let results = index.search(&[2.0, 0.1], 3).unwrap();
        assert_eq!(ids(&results), vec!["x", "xy", "y"]);
        assert!(results.windows(2).all(|w| w[0].distance <= w[1].distance));
        assert_eq!(results[0].text, "X");
    }

    #[test]
    fn k_larger_than_count_returns_all() {
        let index = VectorIndex::new();
        index.add(vec![entry("a", vec![1.0, 0.0]), entry("b", vec![0.0, 1.0])]).unwrap();
        let results = index.search(&[0.0, 1.0], 10).unwrap();
        assert_eq!(ids(&results), vec!["b", "a"]);
    }

    #[test]
    fn k_zero_returns_nothing() {
        let index = VectorIndex::new();
        index.add(vec![entry("a", vec![1.0])]).unwrap();
        assert!(index.search(&[1.0], 0).unwrap().is_empty());
    }

    #[test]
    fn query_dimension_is_checked() {
        let index = VectorIndex::new();
        index.add(vec![entry("a", vec![1.0, 0.0])]).unwrap();
        assert!(matches!(index.search(&[1.0, 0.0, 0.0], 1), Err(Error::DimensionMismatch { expected: 2, actual: 3 })));
    }

    #[test]
    fn ties_break_by_insertion_order() {
        let index = VectorIndex::new();
        let batch: Vec<IndexEntry> = ["e0", "e1", "e2", "e3", "e4", "e5"].iter().map(|id| entry(id, vec![1.0, 1.0])).collect();
        index.add(batch).unwrap();
        assert_eq!(ids(&index.search(&[3.0, 3.0], 6).unwrap()), vec!["e0", "e1", "e2", "e3", "e4", "e5"]);
        assert_eq!(ids(&index.search(&[3.0, 3.0], 2).unwrap()), vec!["e0", "e1"]);
    }

    #[test]
    fn upserted_entry_keeps_its_rank_slot() {
        let index = VectorIndex::new();
        index.add(vec![entry("a", vec![1.0, 0.0]), entry("b", vec![1.0, 0.0])]).unwrap();
        index.add(vec![entry("a", vec![2.0, 0.0])]).unwrap();
        assert_eq!(ids(&index.search(&[1.0, 0.0], 2).unwrap()), vec!["a", "b"]);
    }

    #[test]
    fn top_k_matches_full_sort() {
        let index = VectorIndex::new();
        let batch: Vec<IndexEntry> = (0..50)
            .map(|i| {
                let angle = i as f32 * 0.37;
                entry(&format!("p{i}"), vec![angle.cos(), angle.sin(), (i % 7) as f32 * 0.1])
            })
            .collect();
        index.add(batch).unwrap();
        let query = [0.3, -0.8, 0.2];
        let all = index.search(&query, 50).unwrap();
        let top = index.search(&query, 7).unwrap();
        assert_eq!(ids(&top), ids(&all[..7]));
    }
}
