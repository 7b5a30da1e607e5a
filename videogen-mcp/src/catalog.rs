//! Model catalog for the `get-models` tool.
//!
//! Derives tiers, cost and parameter hints from the static registry and
//! renders a filtered, sorted report.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use videogen_mcp_common::models::{ModelMode, VIDEO_MODELS, VideoModel};

use crate::handler::{VALID_MODEL_TYPES, VALID_RESOLUTIONS, ValidationError};

/// Valid values for `sort_by`.
pub const VALID_SORT_KEYS: &[&str] = &["name", "max_duration", "quality", "speed"];

/// Catalog query parameters.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct GetModelsParams {
    /// Filter models by name (partial match, case-insensitive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_filter: Option<String>,

    /// Filter by model type: "text-to-video", "image-to-video" or "both".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_filter: Option<String>,

    /// Filter by supported resolution: "480p", "540p", "720p", "768p", "1080p", "1280p", "4K".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution_filter: Option<String>,

    /// Keep only models that do (true) or do not (false) generate audio.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_audio: Option<bool>,

    /// Sort order: "name" (default), "max_duration", "quality" or "speed".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
}

impl GetModelsParams {
    /// Validate the parameters.
    ///
    /// # Returns
    /// - `Ok(())` if all parameters are valid
    /// - `Err(Vec<ValidationError>)` with all validation errors
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Some(ref mode) = self.type_filter {
            if !VALID_MODEL_TYPES.contains(&mode.as_str()) {
                errors.push(ValidationError {
                    field: "type_filter".to_string(),
                    message: format!("Invalid type '{}'. Valid options: {}", mode, VALID_MODEL_TYPES.join(", ")),
                });
            }
        }

        if let Some(ref resolution) = self.resolution_filter {
            if !VALID_RESOLUTIONS.contains(&resolution.as_str()) {
                errors.push(ValidationError {
                    field: "resolution_filter".to_string(),
                    message: format!(
                        "Invalid resolution '{}'. Valid options: {}",
                        resolution,
                        VALID_RESOLUTIONS.join(", ")
                    ),
                });
            }
        }

        if let Some(ref key) = self.sort_by {
            if !VALID_SORT_KEYS.contains(&key.as_str()) {
                errors.push(ValidationError {
                    field: "sort_by".to_string(),
                    message: format!("Invalid sort key '{}'. Valid options: {}", key, VALID_SORT_KEYS.join(", ")),
                });
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum QualityTier {
    Standard,
    Medium,
    High,
    Premium,
}

impl QualityTier {
    pub fn for_model(id: &str) -> Self {
        if id.contains("veo-3") || id.contains("veo-2") {
            QualityTier::Premium
        } else if id.contains("kling") && id.contains("master") {
            QualityTier::Premium
        } else if ["hailuo-2", "hunyuan", "seedance-pro", "kling", "ray"]
            .iter()
            .any(|k| id.contains(k))
        {
            QualityTier::High
        } else if ["pixverse", "wan", "lite"].iter().any(|k| id.contains(k)) {
            QualityTier::Medium
        } else {
            QualityTier::Standard
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityTier::Premium => "Premium",
            QualityTier::High => "High",
            QualityTier::Medium => "Medium",
            QualityTier::Standard => "Standard",
        }
    }

    fn base_cost(&self) -> f64 {
        match self {
            QualityTier::Premium => 4.0,
            QualityTier::High => 2.5,
            QualityTier::Medium => 1.5,
            QualityTier::Standard => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SpeedEstimate {
    Slow,
    Medium,
    Fast,
    VeryFast,
}

impl SpeedEstimate {
    pub fn for_model(id: &str) -> Self {
        if id.contains("fast") || id.contains("flash") || id.contains("ltx") {
            SpeedEstimate::VeryFast
        } else if id.contains("lite") || (id.contains("wan") && id.contains("480p")) {
            SpeedEstimate::Fast
        } else if id.contains("mochi") || id.contains("veo-3") || id.contains("hunyuan") {
            SpeedEstimate::Slow
        } else {
            SpeedEstimate::Medium
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SpeedEstimate::VeryFast => "Very Fast",
            SpeedEstimate::Fast => "Fast",
            SpeedEstimate::Medium => "Medium",
            SpeedEstimate::Slow => "Slow",
        }
    }
}

/// Numeric part of the highest listed resolution ("4K" counts as 4).
fn max_resolution(model: &VideoModel) -> u32 {
    model
        .resolutions
        .iter()
        .filter_map(|r| {
            let digits: String = r.chars().filter(char::is_ascii_digit).collect();
            digits.parse::<u32>().ok()
        })
        .max()
        .unwrap_or(0)
}

pub fn cost_estimate(model: &VideoModel) -> &'static str {
    let mut cost = QualityTier::for_model(model.id).base_cost();
    if model.supports_audio {
        cost *= 1.3;
    }
    let max_res = max_resolution(model);
    if max_res >= 1080 {
        cost *= 1.5;
    }
    if max_res >= 2160 {
        cost *= 2.0;
    }

    if cost >= 4.0 {
        "Very High"
    } else if cost >= 2.5 {
        "High"
    } else if cost >= 1.5 {
        "Medium"
    } else {
        "Low"
    }
}

/// Request parameters a model understands, in display order.
pub fn supported_parameters(model: &VideoModel) -> Vec<&'static str> {
    let mut params = vec!["prompt", "duration"];
    if model.mode.accepts_image() {
        params.push("image");
    }

    let id = model.id;
    if id.contains("veo") {
        params.extend(["aspect_ratio", "enhance_prompt", "generate_audio", "negative_prompt"]);
    }
    if id.contains("kling") {
        params.extend(["motion_intensity", "resolution"]);
    }
    if id.contains("minimax-director") {
        params.push("camera_movement");
    }
    if id.contains("wan") {
        params.extend(["fps", "guidance_scale"]);
    }
    if id.contains("seedance") {
        params.push("resolution");
    }

    for always in ["seed", "negative_prompt"] {
        if !params.contains(&always) {
            params.push(always);
        }
    }
    params
}

pub fn catalog_features(model: &VideoModel) -> Vec<&'static str> {
    let mut features = vec![model.mode.label()];
    if model.supports_audio {
        features.push("Audio Generation");
    }
    if model.max_duration_seconds >= 10.0 {
        features.push("Long Duration");
    }
    if model.supports_resolution("1080p") || model.supports_resolution("4K") {
        features.push("High Resolution");
    }
    features
}

/// A registry model with derived catalog attributes.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub model: &'static VideoModel,
    pub quality: QualityTier,
    pub speed: SpeedEstimate,
    pub cost: &'static str,
    pub features: Vec<&'static str>,
    pub parameters: Vec<&'static str>,
}

impl CatalogEntry {
    pub fn new(model: &'static VideoModel) -> Self {
        Self {
            model,
            quality: QualityTier::for_model(model.id),
            speed: SpeedEstimate::for_model(model.id),
            cost: cost_estimate(model),
            features: catalog_features(model),
            parameters: supported_parameters(model),
        }
    }
}

/// Filtered and sorted catalog entries. Ties keep registry order.
pub fn query(params: &GetModelsParams) -> Vec<CatalogEntry> {
    let needle = params.model_filter.as_deref().map(str::to_lowercase);
    let mode = params.type_filter.as_deref().and_then(ModelMode::parse);

    let mut entries: Vec<CatalogEntry> = VIDEO_MODELS
        .iter()
        .filter(|m| needle.as_deref().is_none_or(|n| m.id.to_lowercase().contains(n)))
        .filter(|m| mode.is_none_or(|mode| m.mode == mode))
        .filter(|m| {
            params
                .resolution_filter
                .as_deref()
                .is_none_or(|r| m.supports_resolution(r))
        })
        .filter(|m| params.has_audio.is_none_or(|audio| m.supports_audio == audio))
        .map(CatalogEntry::new)
        .collect();

    match params.sort_by.as_deref().unwrap_or("name") {
        "max_duration" => entries.sort_by(|a, b| {
            b.model
                .max_duration_seconds
                .total_cmp(&a.model.max_duration_seconds)
        }),
        "quality" => entries.sort_by(|a, b| b.quality.cmp(&a.quality)),
        "speed" => entries.sort_by(|a, b| b.speed.cmp(&a.speed)),
        _ => entries.sort_by(|a, b| a.model.id.cmp(b.model.id)),
    }
    entries
}

/// Companies in order of first appearance, with model counts.
pub fn company_counts<'a>(models: impl IntoIterator<Item = &'a VideoModel>) -> Vec<(&'static str, usize)> {
    let mut counts: Vec<(&'static str, usize)> = Vec::new();
    for model in models {
        let company = model.company();
        match counts.iter_mut().find(|(name, _)| *name == company) {
            Some((_, count)) => *count += 1,
            None => counts.push((company, 1)),
        }
    }
    counts
}

/// Full `get-models` report.
pub fn render(entries: &[CatalogEntry]) -> String {
    let companies = company_counts(entries.iter().map(|e| e.model));
    let count_quality = |tier: QualityTier| entries.iter().filter(|e| e.quality == tier).count();
    let count_mode = |mode: ModelMode| entries.iter().filter(|e| e.model.mode == mode).count();

    let mut lines = vec![
        "🎬 **Video Generation Models Database**".to_string(),
        String::new(),
        "📊 **Summary Statistics:**".to_string(),
        format!("- Total Models: {}", entries.len()),
        format!(
            "- Companies: {} ({})",
            companies.len(),
            companies
                .iter()
                .map(|(name, count)| format!("{}: {}", name, count))
                .collect::<Vec<_>>()
                .join(", ")
        ),
        format!(
            "- With Audio: {}",
            entries.iter().filter(|e| e.model.supports_audio).count()
        ),
        format!(
            "- Quality Distribution: Premium ({}), High ({}), Medium ({}), Standard ({})",
            count_quality(QualityTier::Premium),
            count_quality(QualityTier::High),
            count_quality(QualityTier::Medium),
            count_quality(QualityTier::Standard)
        ),
        format!(
            "- Type Distribution: Text-to-Video ({}), Image-to-Video ({}), Both ({})",
            count_mode(ModelMode::TextToVideo),
            count_mode(ModelMode::ImageToVideo),
            count_mode(ModelMode::Both)
        ),
        String::new(),
    ];

    if entries.is_empty() {
        lines.push("❌ No models match your filters.".to_string());
        return lines.join("\n");
    }

    lines.push("📋 **Model Details:**".to_string());
    for entry in entries {
        let model = entry.model;
        let defaults = model
            .default_params
            .iter()
            .map(|(key, value)| match value.to_value() {
                serde_json::Value::String(s) => format!("{}={}", key, s),
                other => format!("{}={}", key, other),
            })
            .collect::<Vec<_>>()
            .join(", ");
        lines.extend([
            String::new(),
            format!("**{}** ({})", model.id, model.company()),
            format!("- Version: {}", model.version),
            format!("- Type: {}", model.mode),
            format!(
                "- Quality: {} | Speed: {} | Cost: {}",
                entry.quality.as_str(),
                entry.speed.as_str(),
                entry.cost
            ),
            format!("- Max Duration: {}s", model.max_duration_seconds),
            format!("- Resolutions: {}", model.resolutions.join(", ")),
            format!("- Audio: {}", if model.supports_audio { "Yes" } else { "No" }),
            format!("- Features: {}", entry.features.join(", ")),
            format!("- Parameters: {}", entry.parameters.join(", ")),
            format!("- Default Settings: {}", defaults),
        ]);
    }

    format!("{}\n{}", lines.join("\n"), LEGEND)
}

const LEGEND: &str = "
🎯 **Quality Tiers:**
- **Premium**: Latest flagship models with best quality and features
- **High**: Excellent quality with good feature support
- **Medium**: Good quality for most use cases
- **Standard**: Basic quality, suitable for testing

⚡ **Speed Estimates:**
- **Very Fast**: < 30 seconds for 5s video
- **Fast**: 30-60 seconds for 5s video
- **Medium**: 1-3 minutes for 5s video
- **Slow**: 3+ minutes for 5s video

💰 **Cost Estimates:**
- **Very High**: Premium models with audio/4K
- **High**: Premium models or high-res generation
- **Medium**: Standard models with good features
- **Low**: Basic models or lower resolutions

🔧 **Common Parameters:**
- **prompt**: Text description (required)
- **duration**: Video length in seconds
- **image**: Input image for image-to-video models
- **resolution**: Output resolution (480p, 720p, 1080p, 4K)
- **fps**: Frames per second
- **aspect_ratio**: Video aspect ratio (16:9, 9:16, 1:1)
- **guidance_scale**: Generation quality control
- **seed**: Random seed for reproducibility
- **negative_prompt**: What to avoid in generation";
