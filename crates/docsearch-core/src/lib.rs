pub mod chunker;
pub mod config;
pub mod error;
pub mod loader;
pub mod logging;
pub mod traits;
pub mod types;

pub use chunker::{Chunks, DocumentChunker};
pub use error::{Error, Result};
pub use loader::{DocumentLoader, LoadReport};
pub use traits::{Embedder, VectorStore};
pub use types::{Chunk, Document, IndexEntry, Meta, QueryResult};
