//! Embedding collaborator trait

/// Maps a query onto a fixed-length vector.
///
/// The cache never looks inside the vectors; it only compares them. Any
/// `Fn(&Q) -> Vec<f32>` is an embedder, which keeps model-backed
/// implementations and deterministic test stubs interchangeable.
pub trait Embedder<Q: ?Sized> {
    /// Produce the embedding for `query`
    fn embed(&self, query: &Q) -> Vec<f32>;
}

impl<Q, F> Embedder<Q> for F
where
    Q: ?Sized,
    F: Fn(&Q) -> Vec<f32>,
{
    fn embed(&self, query: &Q) -> Vec<f32> {
        self(query)
    }
}
