use async_trait::async_trait;
use thiserror::Error;

/// What an image generation call produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratedImage {
    /// Raw image bytes that still need a home in object storage.
    Bytes { data: Vec<u8>, content_type: String },
    /// A URL the generator already hosts.
    Url(String),
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("content generator is not configured: {0}")]
    NotConfigured(String),

    #[error("request to content generator failed: {0}")]
    Transport(String),

    #[error("content generator returned status {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("content generator returned an empty payload")]
    EmptyPayload,

    #[error("content generator returned an unreadable payload: {0}")]
    InvalidPayload(String),
}

/// External text and image generation capability.
///
/// Treated as slow and unreliable. Implementations do not retry; callers
/// decide.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage, GenerationError>;

    /// Single-turn text completion.
    async fn complete(&self, prompt: &str) -> Result<String, GenerationError>;

    /// Whether credentials are present. Reported by the health endpoint.
    fn is_configured(&self) -> bool {
        true
    }
}
