use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A plant-care record, keyed by its normalized common name.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "plant")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Trimmed, lower-cased common name. At most one row per name.
    #[sea_orm(unique)]
    pub name: String,

    pub scientific_name: Option<String>,

    pub plant_type: Option<String>,

    pub sunlight: Option<String>,

    pub watering: Option<String>,

    pub soil: Option<String>,

    pub fertilizer: Option<String>,

    pub seasonality: Option<String>,

    /// JSON array of month names, e.g. `["march", "april"]`.
    #[sea_orm(column_type = "JsonBinary")]
    pub seasonal_months: Json,

    #[sea_orm(column_type = "Text")]
    pub uses_notes: Option<String>,

    /// Set on first successful generation or upload; never cleared afterwards.
    #[sea_orm(column_type = "Text")]
    pub image_url: Option<String>,

    #[sea_orm(column_type = "Text")]
    pub qr_code: Option<String>,

    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,
}

impl Model {
    /// Months as stored, ignoring anything that is not a JSON array of strings.
    pub fn months(&self) -> Vec<String> {
        serde_json::from_value(self.seasonal_months.clone()).unwrap_or_default()
    }
}

impl ActiveModelBehavior for ActiveModel {}
