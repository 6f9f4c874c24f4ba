//! docsearch-vector
//!
//! Exact (brute-force) cosine-distance index over embedded chunks. Mutations
//! take a write lock; searches share a read lock.

pub mod distance;
pub mod index;
pub mod search;

pub use index::VectorIndex;
