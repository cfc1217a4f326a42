use async_trait::async_trait;

use super::error::StorageError;
use super::hash::ContentHash;

/// Content-addressed blob storage for images.
///
/// Writing the same bytes twice yields the same hash and stores them once.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes and return their content hash.
    async fn put(&self, data: &[u8]) -> Result<ContentHash, StorageError>;

    /// Read a blob back. Missing blobs yield [`StorageError::NotFound`].
    async fn get(&self, hash: &ContentHash) -> Result<Vec<u8>, StorageError>;

    async fn exists(&self, hash: &ContentHash) -> Result<bool, StorageError>;

    /// Short backend identifier for diagnostics ("filesystem", "s3").
    fn backend_name(&self) -> &'static str;
}
