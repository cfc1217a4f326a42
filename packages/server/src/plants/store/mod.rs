mod database;
mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::entity::plant;

pub use database::SeaOrmPlantStore;
pub use memory::MemoryPlantStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The unique constraint on `name` rejected the write.
    #[error("a plant named '{0}' already exists")]
    DuplicateName(String),

    #[error("plant {0} not found")]
    NotFound(i32),

    #[error("{operation} failed for {key}: {message}")]
    Backend {
        operation: &'static str,
        key: String,
        message: String,
    },
}

/// Free-form descriptive fields of a record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlantDetails {
    pub scientific_name: Option<String>,
    pub plant_type: Option<String>,
    pub sunlight: Option<String>,
    pub watering: Option<String>,
    pub soil: Option<String>,
    pub fertilizer: Option<String>,
    pub seasonality: Option<String>,
    pub seasonal_months: Vec<String>,
    pub uses_notes: Option<String>,
}

/// A record to insert. `name` must already be normalized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewPlant {
    pub name: String,
    pub details: PlantDetails,
    pub image_url: Option<String>,
    pub qr_code: Option<String>,
}

impl NewPlant {
    pub fn with_image(name: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image_url: Some(image_url.into()),
            ..Default::default()
        }
    }
}

/// Partial update. `None` leaves a field untouched; there is deliberately no
/// way to clear `image_url`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlantChanges {
    pub name: Option<String>,
    pub scientific_name: Option<String>,
    pub plant_type: Option<String>,
    pub sunlight: Option<String>,
    pub watering: Option<String>,
    pub soil: Option<String>,
    pub fertilizer: Option<String>,
    pub seasonality: Option<String>,
    pub seasonal_months: Option<Vec<String>>,
    pub uses_notes: Option<String>,
    pub image_url: Option<String>,
    pub qr_code: Option<String>,
}

impl PlantChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Durable table of plant records with a unique normalized name.
///
/// Implementations must reject a second record with the same name with
/// [`StoreError::DuplicateName`]; the cache relies on it to detect races
/// between processes.
#[async_trait]
pub trait PlantStore: Send + Sync {
    async fn find_by_name(&self, name: &str) -> Result<Option<plant::Model>, StoreError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<plant::Model>, StoreError>;

    /// All records, newest first.
    async fn list(&self) -> Result<Vec<plant::Model>, StoreError>;

    async fn insert(&self, plant: NewPlant) -> Result<plant::Model, StoreError>;

    /// Attach `image_url` to record `id` only if it has no image yet.
    ///
    /// The check and the write are one atomic step. Returns `false` when the
    /// record is gone or already carries an image, leaving it untouched.
    async fn fill_image_url(&self, id: i32, image_url: &str) -> Result<bool, StoreError>;

    async fn update(&self, id: i32, changes: PlantChanges) -> Result<plant::Model, StoreError>;

    /// Returns `false` when there was no such record.
    async fn delete(&self, id: i32) -> Result<bool, StoreError>;

    /// Release the underlying connections. Called once on shutdown.
    async fn close(&self) -> Result<(), StoreError>;
}
