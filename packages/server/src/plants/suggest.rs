use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use url::Url;
use utoipa::ToSchema;

use super::cache::normalize_name;
use super::error::PlantError;
use super::generator::ContentGenerator;
use super::prompt;
use crate::config::SuggestConfig;

/// Vector and icon formats that are never accepted as a plant photo.
const REJECTED_EXTENSIONS: &[&str] = &["svg", "svgz", "ico", "eps", "ai"];

/// Descriptive fields proposed for a plant, plus a sanitized image URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PlantSuggestion {
    /// The name as queried, not normalized.
    pub plant_name: String,
    pub scientific_name: String,
    pub sunlight: String,
    pub watering: String,
    pub soil: String,
    pub seasonality: String,
    pub uses_notes: String,
    /// Always a usable image URL; the placeholder when the proposed one was not.
    pub image: String,
}

#[derive(Debug, Deserialize)]
struct RawSuggestion {
    scientific_name: String,
    sunlight: String,
    watering: String,
    soil: String,
    seasonality: String,
    uses_notes: String,
    #[serde(default)]
    image: Option<String>,
}

/// Remove a surrounding markdown code fence (```json ... ```), if any.
pub fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.trim_end();
    let body = rest.strip_suffix("```").unwrap_or(rest).trim_start();
    // Drop an info string ("json") before the payload.
    body.trim_start_matches(|c: char| c.is_ascii_alphanumeric()).trim()
}

fn decode(text: &str) -> Result<RawSuggestion, PlantError> {
    serde_json::from_str(strip_code_fences(text))
        .map_err(|e| PlantError::MalformedSuggestion(e.to_string()))
}

/// Which image references a suggestion may carry.
#[derive(Debug, Clone)]
pub struct ImagePolicy {
    allowed_hosts: Vec<String>,
    placeholder: String,
}

impl ImagePolicy {
    pub fn new(allowed_hosts: Vec<String>, placeholder: impl Into<String>) -> Self {
        Self {
            allowed_hosts: allowed_hosts
                .into_iter()
                .map(|h| h.trim().to_ascii_lowercase())
                .filter(|h| !h.is_empty())
                .collect(),
            placeholder: placeholder.into(),
        }
    }

    pub fn from_config(config: &SuggestConfig) -> Self {
        Self::new(
            config.allowed_image_hosts.clone(),
            config.placeholder_image_url.clone(),
        )
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    fn host_allowed(&self, host: &str) -> bool {
        self.allowed_hosts.iter().any(|allowed| {
            host == allowed
                || host
                    .strip_suffix(allowed.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }

    /// `Ok(())` when `candidate` is an http(s) URL on an allowed host that
    /// does not point at a vector or icon file.
    pub fn check(&self, candidate: &str) -> Result<(), String> {
        let url = Url::parse(candidate.trim()).map_err(|e| format!("not a URL: {e}"))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(format!("scheme '{}' not allowed", url.scheme()));
        }
        let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
        if !self.host_allowed(&host) {
            return Err(format!("host '{host}' not allowed"));
        }
        let extension = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .and_then(|file| file.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase());
        if let Some(ext) = extension
            && REJECTED_EXTENSIONS.contains(&ext.as_str())
        {
            return Err(format!("'.{ext}' images are not accepted"));
        }
        Ok(())
    }

    /// The candidate when it passes [`check`](Self::check), else the placeholder.
    pub fn accept(&self, candidate: Option<&str>) -> String {
        let Some(candidate) = candidate.filter(|c| !c.trim().is_empty()) else {
            return self.placeholder.clone();
        };
        match self.check(candidate) {
            Ok(()) => candidate.trim().to_string(),
            Err(reason) => {
                debug!(candidate, %reason, "Replacing suggested image with placeholder");
                self.placeholder.clone()
            }
        }
    }
}

/// Asks the text generator for care data. Nothing is persisted.
pub struct SuggestionService {
    generator: Arc<dyn ContentGenerator>,
    policy: ImagePolicy,
}

impl SuggestionService {
    pub fn new(generator: Arc<dyn ContentGenerator>, policy: ImagePolicy) -> Self {
        Self { generator, policy }
    }

    #[instrument(skip(self))]
    pub async fn suggest(&self, plant_name: &str) -> Result<PlantSuggestion, PlantError> {
        if normalize_name(plant_name).is_none() {
            return Err(PlantError::InvalidArgument("plantName is required".into()));
        }
        let query = plant_name.trim();

        let text = self
            .generator
            .complete(&prompt::suggestion_prompt(query))
            .await?;
        let raw = decode(&text).inspect_err(|e| warn!(error = %e, "Unusable suggestion"))?;

        Ok(PlantSuggestion {
            plant_name: query.to_string(),
            image: self.policy.accept(raw.image.as_deref()),
            scientific_name: raw.scientific_name,
            sunlight: raw.sunlight,
            watering: raw.watering,
            soil: raw.soil,
            seasonality: raw.seasonality,
            uses_notes: raw.uses_notes,
        })
    }
}
