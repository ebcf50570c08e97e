#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Vector has {actual} dimensions but the index holds {expected}-dimensional vectors")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Received {vectors} vectors for {chunks} chunks")]
    LengthMismatch { chunks: usize, vectors: usize },

    #[error("Embedding service returned no vector for the query")]
    EmptyEmbedding,
}
