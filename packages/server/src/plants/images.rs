use std::sync::Arc;

use common::storage::{BlobStore, ContentHash, StorageError};

/// Content types accepted for stored plant images, with their file extension.
const IMAGE_TYPES: &[(&str, &str)] = &[
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/webp", "webp"),
    ("image/gif", "gif"),
];

pub fn extension_for(content_type: &str) -> Option<&'static str> {
    let essence = content_type.split(';').next().unwrap_or("").trim();
    IMAGE_TYPES
        .iter()
        .find(|(mime, _)| mime.eq_ignore_ascii_case(essence))
        .map(|(_, ext)| *ext)
}

/// A blob read back for serving.
pub struct StoredImage {
    pub hash: ContentHash,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Persists image bytes in blob storage and hands out stable public URLs of
/// the form `{public_url}/uploads/{sha256}.{ext}`.
#[derive(Clone)]
pub struct ImageStore {
    blobs: Arc<dyn BlobStore>,
    public_url: String,
}

impl ImageStore {
    pub fn new(blobs: Arc<dyn BlobStore>, public_url: impl Into<String>) -> Self {
        Self {
            blobs,
            public_url: public_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.blobs.backend_name()
    }

    /// Store `data` and return its public URL. Unknown content types are
    /// stored as PNG, which is what the generator produces.
    pub async fn save(&self, data: &[u8], content_type: &str) -> Result<String, StorageError> {
        let hash = self.blobs.put(data).await?;
        let ext = extension_for(content_type).unwrap_or("png");
        Ok(format!("{}/uploads/{hash}.{ext}", self.public_url))
    }

    /// Load the image behind an `/uploads/{file}` path segment.
    pub async fn load(&self, file_name: &str) -> Result<StoredImage, StorageError> {
        let (stem, ext) = file_name
            .rsplit_once('.')
            .ok_or_else(|| StorageError::InvalidHash(file_name.to_string()))?;
        let hash = ContentHash::from_hex(stem)?;
        let content_type = IMAGE_TYPES
            .iter()
            .find(|(_, e)| e.eq_ignore_ascii_case(ext))
            .map(|(mime, _)| mime.to_string())
            .ok_or_else(|| StorageError::NotFound(file_name.to_string()))?;

        let data = self.blobs.get(&hash).await?;
        Ok(StoredImage {
            hash,
            content_type,
            data,
        })
    }
}
