use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use super::{NewPlant, PlantChanges, PlantStore, StoreError};
use crate::entity::plant;

/// In-process [`PlantStore`] with the same uniqueness rules as the database.
///
/// Backs `database.url = "memory"` and the test suites.
#[derive(Default)]
pub struct MemoryPlantStore {
    state: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    last_id: i32,
    rows: BTreeMap<i32, plant::Model>,
}

impl MemoryState {
    fn name_taken(&self, name: &str, except: Option<i32>) -> bool {
        self.rows
            .values()
            .any(|p| p.name == name && Some(p.id) != except)
    }
}

impl MemoryPlantStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.state.lock().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn apply_changes(model: &mut plant::Model, changes: PlantChanges) {
    fn set(field: &mut Option<String>, value: Option<String>) {
        if value.is_some() {
            *field = value;
        }
    }

    if let Some(name) = changes.name {
        model.name = name;
    }
    set(&mut model.scientific_name, changes.scientific_name);
    set(&mut model.plant_type, changes.plant_type);
    set(&mut model.sunlight, changes.sunlight);
    set(&mut model.watering, changes.watering);
    set(&mut model.soil, changes.soil);
    set(&mut model.fertilizer, changes.fertilizer);
    set(&mut model.seasonality, changes.seasonality);
    if let Some(months) = changes.seasonal_months {
        model.seasonal_months = serde_json::json!(months);
    }
    set(&mut model.uses_notes, changes.uses_notes);
    set(&mut model.image_url, changes.image_url);
    set(&mut model.qr_code, changes.qr_code);
    model.updated_at = Utc::now();
}

#[async_trait]
impl PlantStore for MemoryPlantStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<plant::Model>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.rows.values().find(|p| p.name == name).cloned())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<plant::Model>, StoreError> {
        Ok(self.state.lock().await.rows.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<plant::Model>, StoreError> {
        let state = self.state.lock().await;
        let mut plants: Vec<_> = state.rows.values().cloned().collect();
        plants.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(plants)
    }

    async fn insert(&self, plant: NewPlant) -> Result<plant::Model, StoreError> {
        let mut state = self.state.lock().await;
        if state.name_taken(&plant.name, None) {
            return Err(StoreError::DuplicateName(plant.name));
        }

        state.last_id += 1;
        let now = Utc::now();
        let details = plant.details;
        let model = plant::Model {
            id: state.last_id,
            name: plant.name,
            scientific_name: details.scientific_name,
            plant_type: details.plant_type,
            sunlight: details.sunlight,
            watering: details.watering,
            soil: details.soil,
            fertilizer: details.fertilizer,
            seasonality: details.seasonality,
            seasonal_months: serde_json::json!(details.seasonal_months),
            uses_notes: details.uses_notes,
            image_url: plant.image_url,
            qr_code: plant.qr_code,
            created_at: now,
            updated_at: now,
        };
        state.rows.insert(model.id, model.clone());

        Ok(model)
    }

    async fn fill_image_url(&self, id: i32, image_url: &str) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        let Some(model) = state.rows.get_mut(&id) else {
            return Ok(false);
        };
        if model.image_url.as_deref().is_some_and(|url| !url.is_empty()) {
            return Ok(false);
        }
        model.image_url = Some(image_url.to_string());
        model.updated_at = Utc::now();
        Ok(true)
    }

    async fn update(&self, id: i32, changes: PlantChanges) -> Result<plant::Model, StoreError> {
        let mut state = self.state.lock().await;
        if let Some(name) = &changes.name
            && state.name_taken(name, Some(id))
        {
            return Err(StoreError::DuplicateName(name.clone()));
        }

        let model = state.rows.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        apply_changes(model, changes);
        Ok(model.clone())
    }

    async fn delete(&self, id: i32) -> Result<bool, StoreError> {
        Ok(self.state.lock().await.rows.remove(&id).is_some())
    }

    async fn close(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
