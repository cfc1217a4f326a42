//! Prompt builders. Pure functions of the plant name.

/// Prompt for a botanical photograph of the plant behind `name`.
pub fn image_prompt(name: &str) -> String {
    format!(
        "High-quality, realistic botanical photograph of the plant that produces \"{name}\".\n\
         Full plant visible (leaves and stem), white background, centered, natural light, \
         DSLR look. No text, no watermark."
    )
}

/// Prompt asking for care data as a strict JSON object.
///
/// The keys here must match what [`super::suggest`] decodes.
pub fn suggestion_prompt(name: &str) -> String {
    format!(
        r#"Return plant care data for "{name}" in this exact JSON format:
{{
  "scientific_name": "",
  "sunlight": "",
  "watering": "",
  "soil": "",
  "seasonality": "",
  "uses_notes": "",
  "image": "<direct JPG or PNG URL from Wikimedia Commons of the WHOLE PLANT>"
}}
Return only JSON, with no commentary."#
    )
}
