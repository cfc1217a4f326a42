use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{info, instrument};

use crate::error::{AppError, ErrorBody};
use crate::extractors::json::{AppJson, AppPath};
use crate::models::plant::{
    CreatePlantRequest, CreatedResponse, DeletedResponse, PlantImageQuery, PlantImageResponse,
    PlantListResponse, PlantResponse, UpdatePlantRequest,
};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/plant",
    tag = "Plants",
    operation_id = "getPlantImage",
    summary = "Look up or generate a plant image",
    description = "Returns the stored image for the normalized name (`source: cache`). On a miss \
        an image is generated, stored, and recorded before returning (`source: generated`). \
        Concurrent misses for the same name converge on one record. Generation failures are \
        safe to retry.",
    params(PlantImageQuery),
    responses(
        (status = 200, description = "Plant image", body = PlantImageResponse),
        (status = 400, description = "Missing or empty name (VALIDATION_ERROR)", body = ErrorBody),
        (status = 500, description = "Generation or storage failure (UPSTREAM_GENERATION_ERROR, INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn get_or_create_image(
    State(state): State<AppState>,
    Query(query): Query<PlantImageQuery>,
) -> Result<Json<PlantImageResponse>, AppError> {
    let name = query
        .name
        .ok_or_else(|| AppError::Validation("name query is required".into()))?;

    let image = state.plants.get_or_create_image(&name).await?;
    Ok(Json(image.into()))
}

#[utoipa::path(
    get,
    path = "/plants",
    tag = "Plants",
    operation_id = "listPlants",
    summary = "List plant records",
    description = "Returns every record, newest first.",
    responses(
        (status = 200, description = "All plants", body = PlantListResponse),
    ),
)]
#[instrument(skip(state))]
pub async fn list_plants(
    State(state): State<AppState>,
) -> Result<Json<PlantListResponse>, AppError> {
    let plants = state.store.list().await?;
    Ok(Json(PlantListResponse {
        plants: plants.into_iter().map(PlantResponse::from).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/plants",
    tag = "Plants",
    operation_id = "createPlant",
    summary = "Create a plant record",
    description = "Creates a record. `name` is required and stored normalized; a second record \
        with the same normalized name is rejected.",
    request_body = CreatePlantRequest,
    responses(
        (status = 201, description = "Plant created", body = CreatedResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Name already taken (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(name = %payload.name))]
pub async fn create_plant(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreatePlantRequest>,
) -> Result<impl IntoResponse, AppError> {
    let plant = payload.into_new_plant()?;
    let model = state.store.insert(plant).await?;
    info!(id = model.id, "Plant created");

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            success: true,
            id: model.id,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/plant/{id}",
    tag = "Plants",
    operation_id = "getPlant",
    summary = "Get a plant record by ID",
    params(("id" = i32, Path, description = "Plant ID")),
    responses(
        (status = 200, description = "Plant record", body = PlantResponse),
        (status = 400, description = "Malformed ID (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Plant not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_plant(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<Json<PlantResponse>, AppError> {
    let model = state
        .store
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Plant not found".into()))?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    patch,
    path = "/plant/{id}",
    tag = "Plants",
    operation_id = "updatePlant",
    summary = "Update a plant record",
    description = "Partially updates a record; only provided fields change. `image_url` may be \
        replaced but never cleared. A rename is normalized and must not collide with another \
        record. An empty payload returns the record unchanged.",
    params(("id" = i32, Path, description = "Plant ID")),
    request_body = UpdatePlantRequest,
    responses(
        (status = 200, description = "Plant updated", body = PlantResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Plant not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Name already taken (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn update_plant(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<UpdatePlantRequest>,
) -> Result<Json<PlantResponse>, AppError> {
    let changes = payload.into_changes()?;

    let model = if changes.is_empty() {
        state
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Plant not found".into()))?
    } else {
        state.store.update(id, changes).await?
    };

    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/plant/{id}",
    tag = "Plants",
    operation_id = "deletePlant",
    summary = "Delete a plant record",
    description = "Deletes the record. Succeeds whether or not it existed.",
    params(("id" = i32, Path, description = "Plant ID")),
    responses(
        (status = 200, description = "Deleted or already absent", body = DeletedResponse),
        (status = 400, description = "Malformed ID (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn delete_plant(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<Json<DeletedResponse>, AppError> {
    if state.store.delete(id).await? {
        info!("Plant deleted");
    }
    Ok(Json(DeletedResponse { success: true }))
}
