use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct UploadResponse {
    /// Public URL of the stored image.
    #[schema(example = "https://plants.example.com/uploads/3f1c...9a.jpg")]
    pub url: String,
}
