use std::sync::Arc;

use serde::Serialize;
use tracing::{Instrument, debug, info, instrument, warn};
use utoipa::ToSchema;

use super::error::PlantError;
use super::generator::{ContentGenerator, GeneratedImage, GenerationError};
use super::images::ImageStore;
use super::locks::KeyedLocks;
use super::prompt;
use super::store::{NewPlant, PlantStore, StoreError};
use crate::entity::plant;

/// Where the returned image came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ImageSource {
    /// An existing record already had an image; the generator was not called.
    Cache,
    /// The image was generated and persisted by this call.
    Generated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlantImage {
    pub name: String,
    pub image_url: String,
    pub source: ImageSource,
}

impl PlantImage {
    fn cached(name: String, image_url: String) -> Self {
        Self {
            name,
            image_url,
            source: ImageSource::Cache,
        }
    }

    fn generated(name: String, image_url: String) -> Self {
        Self {
            name,
            image_url,
            source: ImageSource::Generated,
        }
    }
}

const INSERT_ATTEMPTS: usize = 3;

/// Trim and lower-case a plant name. `None` when nothing is left.
pub fn normalize_name(name: &str) -> Option<String> {
    let trimmed = name.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_lowercase())
}

fn cached_image(record: &plant::Model) -> Option<String> {
    record
        .image_url
        .as_deref()
        .filter(|url| !url.is_empty())
        .map(str::to_string)
}

/// Lookup-or-generate for plant images.
///
/// Misses for the same name are serialized through an in-process lock table
/// and, across processes, through the store's unique name constraint: a
/// writer that loses the insert adopts the winner's record instead of adding
/// a second row.
#[derive(Clone)]
pub struct PlantCacheService {
    store: Arc<dyn PlantStore>,
    generator: Arc<dyn ContentGenerator>,
    images: ImageStore,
    locks: Arc<KeyedLocks>,
}

impl PlantCacheService {
    pub fn new(
        store: Arc<dyn PlantStore>,
        generator: Arc<dyn ContentGenerator>,
        images: ImageStore,
    ) -> Self {
        Self {
            store,
            generator,
            images,
            locks: Arc::new(KeyedLocks::new()),
        }
    }

    /// Return the image for `name`, generating and persisting one on a miss.
    ///
    /// The slow path runs on its own task, so a caller that goes away does not
    /// abort a generation other callers will benefit from.
    #[instrument(skip(self), fields(key = tracing::field::Empty))]
    pub async fn get_or_create_image(&self, name: &str) -> Result<PlantImage, PlantError> {
        let key = normalize_name(name)
            .ok_or_else(|| PlantError::InvalidArgument("plant name is required".into()))?;
        tracing::Span::current().record("key", key.as_str());

        if let Some(record) = self.store.find_by_name(&key).await?
            && let Some(url) = cached_image(&record)
        {
            debug!("Cache hit");
            return Ok(PlantImage::cached(key, url));
        }

        let service = self.clone();
        tokio::spawn(async move { service.fill(key).await }.in_current_span())
            .await
            .map_err(|e| PlantError::Internal(format!("image generation task failed: {e}")))?
    }

    async fn fill(&self, key: String) -> Result<PlantImage, PlantError> {
        let _guard = self.locks.lock(&key).await;

        // Another caller may have filled the record while we waited.
        let existing = self.store.find_by_name(&key).await?;
        if let Some(url) = existing.as_ref().and_then(cached_image) {
            debug!("Filled by a concurrent request");
            return Ok(PlantImage::cached(key, url));
        }

        let image_url = self.generate(&key).await?;

        if let Some(record) = existing {
            if self.store.fill_image_url(record.id, &image_url).await? {
                info!(id = record.id, "Attached generated image to existing record");
                return Ok(PlantImage::generated(key, image_url));
            }
            // Filled or deleted by another writer while we generated.
            debug!(id = record.id, "Record changed during generation");
        }
        self.insert_or_adopt(key, image_url).await
    }

    async fn generate(&self, key: &str) -> Result<String, PlantError> {
        let prompt = prompt::image_prompt(key);
        let image = self.generator.generate_image(&prompt).await.inspect_err(|e| {
            warn!(error = %e, "Image generation failed");
        })?;

        match image {
            GeneratedImage::Bytes { data, .. } if data.is_empty() => {
                Err(GenerationError::EmptyPayload.into())
            }
            GeneratedImage::Bytes { data, content_type } => {
                Ok(self.images.save(&data, &content_type).await?)
            }
            GeneratedImage::Url(url) if url.trim().is_empty() => {
                Err(GenerationError::EmptyPayload.into())
            }
            GeneratedImage::Url(url) => Ok(url),
        }
    }

    /// Insert a record for `key`, or settle on whatever another writer stored.
    ///
    /// The row for `key` can be inserted or deleted by other processes between
    /// any two store calls, so the insert is retried a bounded number of times.
    async fn insert_or_adopt(
        &self,
        key: String,
        image_url: String,
    ) -> Result<PlantImage, PlantError> {
        for _ in 0..INSERT_ATTEMPTS {
            match self
                .store
                .insert(NewPlant::with_image(key.clone(), image_url.clone()))
                .await
            {
                Ok(record) => {
                    info!(id = record.id, "Stored new plant with generated image");
                    return Ok(PlantImage::generated(key, image_url));
                }
                Err(StoreError::DuplicateName(_)) => {}
                Err(e) => return Err(e.into()),
            }

            // Lost the insert to another writer.
            let Some(winner) = self.store.find_by_name(&key).await? else {
                debug!("Conflicting record vanished, retrying insert");
                continue;
            };
            if let Some(url) = cached_image(&winner) {
                debug!(id = winner.id, "Adopted image from concurrent insert");
                return Ok(PlantImage::cached(key, url));
            }
            if self.store.fill_image_url(winner.id, &image_url).await? {
                info!(id = winner.id, "Attached generated image to concurrent insert");
                return Ok(PlantImage::generated(key, image_url));
            }
        }

        Err(PlantError::Internal(format!(
            "record for '{key}' kept changing while storing its image"
        )))
    }
}
