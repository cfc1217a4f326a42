use axum::{Json, extract::State};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::suggest::{SuggestRequest, SuggestResponse};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/suggest",
    tag = "Suggestions",
    operation_id = "suggestPlant",
    summary = "Propose care data for a plant",
    description = "Asks the text generator for descriptive fields and an image reference. \
        Nothing is stored. An image from a disallowed host or in a vector/icon format is \
        replaced with a placeholder; an unparsable answer fails the request.",
    request_body = SuggestRequest,
    responses(
        (status = 200, description = "Suggested fields", body = SuggestResponse),
        (status = 400, description = "Missing plantName (VALIDATION_ERROR)", body = ErrorBody),
        (status = 500, description = "Generator failure (UPSTREAM_GENERATION_ERROR, MALFORMED_SUGGESTION)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(plant_name = %payload.plant_name))]
pub async fn suggest(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SuggestRequest>,
) -> Result<Json<SuggestResponse>, AppError> {
    let suggestions = state.suggestions.suggest(&payload.plant_name).await?;
    Ok(Json(SuggestResponse { suggestions }))
}
