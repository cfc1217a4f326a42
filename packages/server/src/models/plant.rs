use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::entity::plant;
use crate::error::AppError;
use crate::plants::{
    ImageSource, NewPlant, PlantChanges, PlantDetails, PlantImage, normalize_name,
};

#[derive(Deserialize, IntoParams)]
pub struct PlantImageQuery {
    /// Plant name; trimmed and lower-cased before lookup.
    #[param(example = "Banana")]
    pub name: Option<String>,
}

/// Image lookup result.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlantImageResponse {
    /// Normalized name the image is stored under.
    #[schema(example = "banana")]
    pub name: String,
    #[schema(example = "https://plants.example.com/uploads/3f1c...9a.png")]
    pub image_url: String,
    pub source: ImageSource,
}

impl From<PlantImage> for PlantImageResponse {
    fn from(image: PlantImage) -> Self {
        Self {
            name: image.name,
            image_url: image.image_url,
            source: image.source,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct CreatePlantRequest {
    #[serde(default)]
    #[schema(example = "Monstera")]
    pub name: String,
    #[serde(default, alias = "scientificName")]
    pub scientific_name: Option<String>,
    #[serde(default, alias = "plantType", alias = "type")]
    pub plant_type: Option<String>,
    #[serde(default)]
    pub sunlight: Option<String>,
    #[serde(default)]
    pub watering: Option<String>,
    #[serde(default)]
    pub soil: Option<String>,
    #[serde(default)]
    pub fertilizer: Option<String>,
    #[serde(default)]
    pub seasonality: Option<String>,
    #[serde(default, alias = "seasonalMonths")]
    pub seasonal_months: Vec<String>,
    #[serde(default, alias = "usesNotes")]
    pub uses_notes: Option<String>,
    #[serde(default, alias = "imageUrl")]
    pub image_url: Option<String>,
    /// Encoded scannable code for the record, stored as given.
    #[serde(default, alias = "qrCode")]
    pub qr_code: Option<String>,
}

#[derive(Deserialize, Default, PartialEq, ToSchema)]
pub struct UpdatePlantRequest {
    pub name: Option<String>,
    #[serde(alias = "scientificName")]
    pub scientific_name: Option<String>,
    #[serde(alias = "plantType", alias = "type")]
    pub plant_type: Option<String>,
    pub sunlight: Option<String>,
    pub watering: Option<String>,
    pub soil: Option<String>,
    pub fertilizer: Option<String>,
    pub seasonality: Option<String>,
    #[serde(alias = "seasonalMonths")]
    pub seasonal_months: Option<Vec<String>>,
    #[serde(alias = "usesNotes")]
    pub uses_notes: Option<String>,
    /// Replacement image. Cannot be empty; an image is never removed.
    #[serde(alias = "imageUrl")]
    pub image_url: Option<String>,
    #[serde(alias = "qrCode")]
    pub qr_code: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct PlantResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "monstera")]
    pub name: String,
    pub scientific_name: Option<String>,
    pub plant_type: Option<String>,
    pub sunlight: Option<String>,
    pub watering: Option<String>,
    pub soil: Option<String>,
    pub fertilizer: Option<String>,
    pub seasonality: Option<String>,
    #[schema(example = json!(["march", "april"]))]
    pub seasonal_months: Vec<String>,
    pub uses_notes: Option<String>,
    pub image_url: Option<String>,
    pub qr_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<plant::Model> for PlantResponse {
    fn from(model: plant::Model) -> Self {
        Self {
            seasonal_months: model.months(),
            id: model.id,
            name: model.name,
            scientific_name: model.scientific_name,
            plant_type: model.plant_type,
            sunlight: model.sunlight,
            watering: model.watering,
            soil: model.soil,
            fertilizer: model.fertilizer,
            seasonality: model.seasonality,
            uses_notes: model.uses_notes,
            image_url: model.image_url,
            qr_code: model.qr_code,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// All records, newest first.
#[derive(Serialize, ToSchema)]
pub struct PlantListResponse {
    pub plants: Vec<PlantResponse>,
}

#[derive(Serialize, ToSchema)]
pub struct CreatedResponse {
    pub success: bool,
    #[schema(example = 1)]
    pub id: i32,
}

#[derive(Serialize, ToSchema)]
pub struct DeletedResponse {
    pub success: bool,
}

/// Blank strings count as absent.
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn required_name(name: &str) -> Result<String, AppError> {
    normalize_name(name).ok_or_else(|| AppError::Validation("name is required".into()))
}

impl CreatePlantRequest {
    pub fn into_new_plant(self) -> Result<NewPlant, AppError> {
        Ok(NewPlant {
            name: required_name(&self.name)?,
            details: PlantDetails {
                scientific_name: self.scientific_name,
                plant_type: self.plant_type,
                sunlight: self.sunlight,
                watering: self.watering,
                soil: self.soil,
                fertilizer: self.fertilizer,
                seasonality: self.seasonality,
                seasonal_months: self.seasonal_months,
                uses_notes: self.uses_notes,
            },
            image_url: non_blank(self.image_url),
            qr_code: non_blank(self.qr_code),
        })
    }
}

impl UpdatePlantRequest {
    pub fn into_changes(self) -> Result<PlantChanges, AppError> {
        let name = self.name.as_deref().map(required_name).transpose()?;
        if let Some(url) = &self.image_url
            && url.trim().is_empty()
        {
            return Err(AppError::Validation(
                "image_url cannot be cleared, only replaced".into(),
            ));
        }

        Ok(PlantChanges {
            name,
            scientific_name: self.scientific_name,
            plant_type: self.plant_type,
            sunlight: self.sunlight,
            watering: self.watering,
            soil: self.soil,
            fertilizer: self.fertilizer,
            seasonality: self.seasonality,
            seasonal_months: self.seasonal_months,
            uses_notes: self.uses_notes,
            image_url: self.image_url.map(|url| url.trim().to_string()),
            qr_code: self.qr_code,
        })
    }
}
