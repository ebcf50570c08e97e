//! Chunking, embedding and nearest-neighbour retrieval over a local corpus.

mod chunker;
mod embedder;
mod error;
mod index;
mod loader;
mod retriever;
mod traits;
mod transform;

pub use chunker::*;
pub use embedder::*;
pub use error::*;
pub use index::*;
pub use loader::*;
pub use retriever::*;
pub use traits::*;
pub use transform::*;
