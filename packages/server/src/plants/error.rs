use common::storage::StorageError;
use thiserror::Error;

use super::generator::GenerationError;
use super::store::StoreError;

/// Failures of the cache and suggestion services.
#[derive(Debug, Error)]
pub enum PlantError {
    /// Missing or empty required input. Never retried.
    #[error("{0}")]
    InvalidArgument(String),

    /// The content generator was unreachable, refused, or returned nothing.
    /// Safe to retry: the lookup-or-generate sequence is idempotent.
    #[error("content generation failed: {0}")]
    UpstreamGeneration(#[from] GenerationError),

    /// The generator answered, but not with the structured data asked for.
    #[error("could not produce suggestions: {0}")]
    MalformedSuggestion(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("image storage failed: {0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Internal(String),
}
