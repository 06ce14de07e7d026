use retailmap_supabase::SupabaseError;
use thiserror::Error;

/// Failure reported by a [`crate::BoundarySource`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// The query was abandoned. Never surfaced as a failure.
    #[error("boundary query cancelled")]
    Cancelled,

    #[error("{0}")]
    Backend(String),
}

impl From<SupabaseError> for SourceError {
    fn from(err: SupabaseError) -> Self {
        SourceError::Backend(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum LoaderError {
    #[error("viewport loader has shut down")]
    Closed,

    #[error("zoom threshold must be a finite number, got {0}")]
    InvalidZoom(f64),
}
