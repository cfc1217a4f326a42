use async_trait::async_trait;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::{Bucket, Region};
use tracing::debug;

use super::error::StorageError;
use super::hash::ContentHash;
use super::traits::BlobStore;

/// Connection settings for an S3-compatible bucket.
#[derive(Debug, Clone)]
pub struct S3Settings {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint (MinIO, R2, ...). `None` uses the AWS endpoint for `region`.
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub path_style: bool,
}

/// Blob store backed by an S3-compatible bucket, keyed by [`ContentHash::object_key`].
pub struct S3BlobStore {
    bucket: Box<Bucket>,
    max_size: u64,
}

impl S3BlobStore {
    pub fn new(settings: &S3Settings, max_size: u64) -> Result<Self, StorageError> {
        let region = match &settings.endpoint {
            Some(endpoint) => Region::Custom {
                region: settings.region.clone(),
                endpoint: endpoint.clone(),
            },
            None => settings
                .region
                .parse()
                .map_err(|e| StorageError::Backend(format!("invalid region: {e}")))?,
        };

        let credentials = Credentials::new(
            settings.access_key.as_deref(),
            settings.secret_key.as_deref(),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::Backend(format!("invalid credentials: {e}")))?;

        let mut bucket = Bucket::new(&settings.bucket, region, credentials).map_err(backend)?;
        if settings.path_style {
            bucket = bucket.with_path_style();
        }

        Ok(Self { bucket, max_size })
    }
}

fn backend(err: S3Error) -> StorageError {
    StorageError::Backend(err.to_string())
}

fn check_status(status: u16, hash: &ContentHash) -> Result<(), StorageError> {
    match status {
        200..=299 => Ok(()),
        404 => Err(StorageError::NotFound(hash.to_hex())),
        other => Err(StorageError::Backend(format!(
            "unexpected status {other} for {hash}"
        ))),
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(&self, data: &[u8]) -> Result<ContentHash, StorageError> {
        let size = data.len() as u64;
        if size > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: size,
                limit: self.max_size,
            });
        }

        let hash = ContentHash::compute(data);
        if self.exists(&hash).await? {
            debug!(%hash, "blob already present in bucket");
            return Ok(hash);
        }

        let response = self
            .bucket
            .put_object(hash.object_key(), data)
            .await
            .map_err(backend)?;
        check_status(response.status_code(), &hash)?;

        Ok(hash)
    }

    async fn get(&self, hash: &ContentHash) -> Result<Vec<u8>, StorageError> {
        let response = self
            .bucket
            .get_object(hash.object_key())
            .await
            .map_err(backend)?;
        check_status(response.status_code(), hash)?;
        Ok(response.bytes().to_vec())
    }

    async fn exists(&self, hash: &ContentHash) -> Result<bool, StorageError> {
        let (_, status) = self
            .bucket
            .head_object(hash.object_key())
            .await
            .map_err(backend)?;
        match check_status(status, hash) {
            Ok(()) => Ok(true),
            Err(StorageError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn backend_name(&self) -> &'static str {
        "s3"
    }
}
