use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::plants::PlantSuggestion;

#[derive(Deserialize, ToSchema)]
pub struct SuggestRequest {
    #[serde(rename = "plantName", default)]
    #[schema(example = "Monstera")]
    pub plant_name: String,
}

#[derive(Serialize, ToSchema)]
pub struct SuggestResponse {
    pub suggestions: PlantSuggestion,
}
