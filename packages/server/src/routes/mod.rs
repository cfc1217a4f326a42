use utoipa_axum::{router::OpenApiRouter, routes};

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

/// Routes under `/api`.
pub fn api_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let uploads = OpenApiRouter::new()
        .routes(routes!(handlers::upload::upload_image))
        .layer(handlers::upload::upload_body_limit(
            config.storage.max_blob_size,
        ));

    OpenApiRouter::new()
        .routes(routes!(handlers::plant::get_or_create_image))
        .routes(routes!(
            handlers::plant::list_plants,
            handlers::plant::create_plant
        ))
        .routes(routes!(
            handlers::plant::get_plant,
            handlers::plant::update_plant,
            handlers::plant::delete_plant
        ))
        .merge(uploads)
}

/// Routes served at the root: suggestions, stored images and health.
pub fn root_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::suggest::suggest))
        .routes(routes!(handlers::upload::serve_image))
        .routes(routes!(handlers::health::health))
}
