use std::io;

/// Errors surfaced by this crate.
///
/// Everything else that can go wrong (wrong buffer sizes, bad matrix
/// shapes, bad salt lengths) is a caller contract violation and panics.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The caller-supplied random source ended before the matrix was fully
    /// drawn. The underlying I/O error is kept as the source.
    #[error("random source ended before the matrix was filled")]
    ShortRandomSource(#[source] io::Error),
}
