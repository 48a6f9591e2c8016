//! Embedding domain - vectors, the embedding collaborator, and the query log

mod provider;
mod similarity;
mod store;

pub use provider::Embedder;
pub use similarity::cosine_similarity;
pub use store::{EmbeddingRecord, EmbeddingStore};

#[cfg(test)]
pub use provider::mock::HashEmbedder;
