use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub ok: bool,
    /// Whether the content generator has credentials.
    pub generator_configured: bool,
    #[schema(example = "filesystem")]
    pub storage_backend: String,
}
