//! Video generation handler for the video generation MCP server.
//!
//! This module provides the `VideoGenHandler` struct and parameter types for
//! generating videos through Replicate predictions.

use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use videogen_mcp_common::config::Config;
use videogen_mcp_common::error::Error;
use videogen_mcp_common::models::{ModelRegistry, VideoModel};
use videogen_mcp_common::storage::{SupabaseStorage, is_local_path};

use crate::catalog::{self, GetModelsParams};
use crate::generation::adapter::{GenerationRequest, check_image_mode};
use crate::generation::fanout::{AggregateResult, run_all};
use crate::generation::summary::{render_terse, render_verbose};
use crate::generation::{PollSettings, ReplicateClient};

/// Resolutions accepted by `resolution` and `resolution_filter`.
pub const VALID_RESOLUTIONS: &[&str] = &["480p", "540p", "720p", "768p", "1080p", "1280p", "4K"];

/// Valid aspect ratios for video generation.
pub const VALID_ASPECT_RATIOS: &[&str] = &["16:9", "9:16", "1:1"];

/// Camera movements understood by director models.
pub const VALID_CAMERA_MOVEMENTS: &[&str] = &["static", "pan", "tilt", "zoom", "dolly"];

/// Model types accepted by `type_filter`.
pub const VALID_MODEL_TYPES: &[&str] = &["text-to-video", "image-to-video", "both"];

/// Motion intensity range (inclusive).
pub const MIN_MOTION_INTENSITY: f64 = 1.0;
pub const MAX_MOTION_INTENSITY: f64 = 10.0;

/// One prompt or several prompts generated in parallel.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(untagged)]
pub enum PromptInput {
    /// Single text prompt describing the video content.
    Single(String),
    /// Array of text prompts for parallel video generation.
    Many(Vec<String>),
}

impl PromptInput {
    pub fn prompts(&self) -> Vec<String> {
        match self {
            PromptInput::Single(prompt) => vec![prompt.clone()],
            PromptInput::Many(prompts) => prompts.clone(),
        }
    }
}

/// Video generation parameters.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct VideoGenerateParams {
    /// The video generation model to use (for example "veo-3", "kling-v2.1-master", "wan-i2v-480p").
    pub model: String,

    /// Text prompt(s) describing the video content. An array runs one generation per prompt.
    pub prompt: PromptInput,

    /// Image URL or local file path for image-to-video models.
    /// Local files are uploaded to object storage first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Video duration in seconds. Clamped to the model's maximum.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,

    /// Video resolution: "480p", "540p", "720p", "768p", "1080p", "1280p", "4K".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,

    /// Frames per second.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fps: Option<f64>,

    /// Guidance scale for generation quality.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guidance_scale: Option<f64>,

    /// Random seed for reproducible results. Offset by the prompt index for prompt arrays.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,

    /// Video aspect ratio: "16:9", "9:16", "1:1".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,

    /// Negative prompt to avoid certain content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,

    /// Whether to enhance the prompt (Veo models).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enhance_prompt: Option<bool>,

    /// Whether to generate audio (Veo models).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generate_audio: Option<bool>,

    /// Camera movement for director models: "static", "pan", "tilt", "zoom", "dolly".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_movement: Option<String>,

    /// Motion intensity level (1-10).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motion_intensity: Option<f64>,

    /// Directory to save videos in (default: "videos").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save_path: Option<String>,

    /// Enable the detailed report (default: false).
    #[serde(default)]
    pub verbose: bool,
}

/// Validation error details for tool parameters.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The field that failed validation.
    pub field: String,
    /// Description of the validation failure.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn check_option(
    errors: &mut Vec<ValidationError>,
    field: &str,
    value: Option<&str>,
    valid: &[&str],
) {
    if let Some(value) = value {
        if !valid.contains(&value) {
            errors.push(ValidationError {
                field: field.to_string(),
                message: format!("Invalid value '{}'. Valid options: {}", value, valid.join(", ")),
            });
        }
    }
}

fn check_positive(errors: &mut Vec<ValidationError>, field: &str, value: Option<f64>) {
    if let Some(value) = value {
        if !(value.is_finite() && value > 0.0) {
            errors.push(ValidationError {
                field: field.to_string(),
                message: format!("{} must be a positive number, got {}", field, value),
            });
        }
    }
}

impl VideoGenerateParams {
    /// Validate the parameters.
    ///
    /// Model existence is not checked here; an unknown model surfaces as
    /// `Error::UnknownModel` from [`VideoGenHandler::generate_video`].
    ///
    /// # Returns
    /// - `Ok(())` if all parameters are valid
    /// - `Err(Vec<ValidationError>)` with all validation errors
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        let prompts = self.prompt.prompts();
        if prompts.is_empty() {
            errors.push(ValidationError {
                field: "prompt".to_string(),
                message: "At least one prompt is required".to_string(),
            });
        }
        for (index, prompt) in prompts.iter().enumerate() {
            if prompt.trim().is_empty() {
                errors.push(ValidationError {
                    field: if prompts.len() > 1 {
                        format!("prompt[{}]", index)
                    } else {
                        "prompt".to_string()
                    },
                    message: "Prompt cannot be empty".to_string(),
                });
            }
        }

        if let Some(ref image) = self.image {
            if image.trim().is_empty() {
                errors.push(ValidationError {
                    field: "image".to_string(),
                    message: "Image cannot be empty when provided".to_string(),
                });
            }
        }

        check_positive(&mut errors, "duration", self.duration);
        check_positive(&mut errors, "fps", self.fps);
        check_positive(&mut errors, "guidance_scale", self.guidance_scale);
        check_option(&mut errors, "resolution", self.resolution.as_deref(), VALID_RESOLUTIONS);
        check_option(&mut errors, "aspect_ratio", self.aspect_ratio.as_deref(), VALID_ASPECT_RATIOS);
        check_option(
            &mut errors,
            "camera_movement",
            self.camera_movement.as_deref(),
            VALID_CAMERA_MOVEMENTS,
        );

        if let Some(intensity) = self.motion_intensity {
            if !(MIN_MOTION_INTENSITY..=MAX_MOTION_INTENSITY).contains(&intensity) {
                errors.push(ValidationError {
                    field: "motion_intensity".to_string(),
                    message: format!(
                        "motion_intensity must be between {} and {}, got {}",
                        MIN_MOTION_INTENSITY, MAX_MOTION_INTENSITY, intensity
                    ),
                });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Get the resolved model definition.
    pub fn get_model(&self) -> Option<&'static VideoModel> {
        ModelRegistry::resolve(&self.model)
    }

    /// Base request shared by every prompt, with the image already resolved to a URL.
    pub fn to_request(&self, image_url: Option<String>) -> GenerationRequest {
        GenerationRequest {
            prompt: String::new(),
            image: image_url,
            duration: self.duration,
            resolution: self.resolution.clone(),
            fps: self.fps,
            guidance_scale: self.guidance_scale,
            seed: self.seed,
            aspect_ratio: self.aspect_ratio.clone(),
            negative_prompt: self.negative_prompt.clone(),
            enhance_prompt: self.enhance_prompt,
            generate_audio: self.generate_audio,
            camera_movement: self.camera_movement.clone(),
            motion_intensity: self.motion_intensity,
        }
    }
}

/// Result of a `generate-video` call.
#[derive(Debug)]
pub struct VideoGenerateResult {
    pub aggregate: AggregateResult,
    /// Image URL sent to the provider, after any upload
    pub image_url: Option<String>,
}

impl VideoGenerateResult {
    pub fn render(&self, verbose: bool) -> String {
        if verbose {
            render_verbose(&self.aggregate, self.image_url.as_deref())
        } else {
            render_terse(&self.aggregate)
        }
    }
}

/// Video generation handler.
///
/// Handles generation requests against the Replicate predictions API.
pub struct VideoGenHandler {
    /// Application configuration.
    pub config: Config,
    /// HTTP client for API requests.
    pub http: reqwest::Client,
}

impl VideoGenHandler {
    /// Create a new VideoGenHandler with the given configuration.
    pub fn new(config: Config) -> Self {
        debug!("Initializing VideoGenHandler");
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Create a new VideoGenHandler with a provided HTTP client.
    pub fn with_http(config: Config, http: reqwest::Client) -> Self {
        Self { config, http }
    }

    fn save_dir(&self, params: &VideoGenerateParams) -> PathBuf {
        params
            .save_path
            .as_deref()
            .map(PathBuf::from)
            .unwrap_or_else(|| self.config.save_dir.clone())
    }

    /// Resolve the image input to a URL, uploading local files.
    async fn resolve_image(&self, image: Option<&str>) -> Result<Option<String>, Error> {
        let Some(image) = image else {
            return Ok(None);
        };
        if !is_local_path(image) {
            return Ok(Some(image.to_string()));
        }

        let storage = SupabaseStorage::from_config(&self.config)?;
        info!(path = image, bucket = storage.bucket(), "Uploading local image");
        let url = storage.upload_image(Path::new(image)).await?;
        Ok(Some(url))
    }

    /// Generate one video per prompt and save them locally.
    ///
    /// Every precondition (parameters, model, image/mode pairing, API token,
    /// image upload) is checked before the first prediction is submitted.
    ///
    /// # Errors
    /// - `Error::Validation` for invalid parameters
    /// - `Error::UnknownModel` if the model is not registered
    /// - `Error::MissingImageInput` / `Error::UnsupportedImageInput` on a mode mismatch
    /// - `Error::MissingCredential` if `REPLICATE_API_TOKEN` (or storage config for local images) is unset
    /// - `Error::Storage` if a local image cannot be uploaded
    #[instrument(level = "info", name = "generate_video", skip(self, params), fields(model = %params.model))]
    pub async fn generate_video(&self, params: &VideoGenerateParams) -> Result<VideoGenerateResult, Error> {
        params.validate().map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            Error::validation(messages.join("; "))
        })?;

        let model = params
            .get_model()
            .ok_or_else(|| Error::UnknownModel(params.model.clone()))?;
        check_image_mode(model, params.image.is_some())?;

        let client = ReplicateClient::from_config(self.http.clone(), &self.config)?;
        let image_url = self.resolve_image(params.image.as_deref()).await?;

        let prompts = params.prompt.prompts();
        info!(model = model.id, version = model.version, prompts = prompts.len(), "Generating video");

        let aggregate = run_all(
            &client,
            model,
            &params.to_request(image_url.clone()),
            &prompts,
            PollSettings::from_config(&self.config),
            &self.save_dir(params),
        )
        .await?;

        Ok(VideoGenerateResult { aggregate, image_url })
    }

    /// Filtered, sorted model catalog report.
    ///
    /// # Errors
    /// Returns `Error::Validation` for unknown filter or sort values.
    #[instrument(level = "info", name = "get_models", skip(self, params))]
    pub fn get_models(&self, params: &GetModelsParams) -> Result<String, Error> {
        params.validate().map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            Error::validation(messages.join("; "))
        })?;

        let entries = catalog::query(params);
        debug!(matches = entries.len(), "Catalog query");
        Ok(catalog::render(&entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(model: &str, prompt: PromptInput) -> VideoGenerateParams {
        VideoGenerateParams {
            model: model.to_string(),
            prompt,
            image: None,
            duration: None,
            resolution: None,
            fps: None,
            guidance_scale: None,
            seed: None,
            aspect_ratio: None,
            negative_prompt: None,
            enhance_prompt: None,
            generate_audio: None,
            camera_movement: None,
            motion_intensity: None,
            save_path: None,
            verbose: false,
        }
    }

    #[test]
    fn test_deserialize_single_and_many_prompts() {
        let single: VideoGenerateParams =
            serde_json::from_value(json!({"model": "veo-3", "prompt": "a cat"})).unwrap();
        assert_eq!(single.prompt.prompts(), vec!["a cat"]);
        assert!(!single.verbose);

        let many: VideoGenerateParams = serde_json::from_value(json!({
            "model": "veo-3",
            "prompt": ["a", "b"],
            "verbose": true,
            "seed": 10
        }))
        .unwrap();
        assert_eq!(many.prompt, PromptInput::Many(vec!["a".into(), "b".into()]));
        assert!(many.verbose);
        assert_eq!(many.seed, Some(10));
    }

    #[test]
    fn test_valid_params() {
        let mut p = params("veo-3", PromptInput::Single("a cat".into()));
        p.resolution = Some("1080p".into());
        p.aspect_ratio = Some("9:16".into());
        p.camera_movement = Some("pan".into());
        p.motion_intensity = Some(5.0);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_empty_prompts_rejected() {
        let errors = params("veo-3", PromptInput::Many(vec![])).validate().unwrap_err();
        assert_eq!(errors[0].field, "prompt");

        let errors = params("veo-3", PromptInput::Many(vec!["ok".into(), "  ".into()]))
            .validate()
            .unwrap_err();
        assert_eq!(errors[0].field, "prompt[1]");
    }

    #[test]
    fn test_invalid_enumerations_rejected() {
        let mut p = params("veo-3", PromptInput::Single("a cat".into()));
        p.resolution = Some("2K".into());
        p.aspect_ratio = Some("4:3".into());
        p.camera_movement = Some("orbit".into());
        p.motion_intensity = Some(11.0);
        p.duration = Some(-1.0);
        let fields: Vec<_> = p.validate().unwrap_err().into_iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec!["duration", "resolution", "aspect_ratio", "camera_movement", "motion_intensity"]
        );
    }

    #[test]
    fn test_unknown_model_is_not_a_validation_error() {
        let p = params("gen4-turbo", PromptInput::Single("a cat".into()));
        assert!(p.validate().is_ok());
        assert!(p.get_model().is_none());
    }

    #[test]
    fn test_to_request_carries_overrides() {
        let mut p = params("wan-i2v-480p", PromptInput::Single("a cat".into()));
        p.guidance_scale = Some(5.0);
        p.seed = Some(3);
        let request = p.to_request(Some("https://img/cat.png".into()));
        assert_eq!(request.image.as_deref(), Some("https://img/cat.png"));
        assert_eq!(request.guidance_scale, Some(5.0));
        assert_eq!(request.seed, Some(3));
    }

    #[test]
    fn test_get_models_validation() {
        let handler = VideoGenHandler::new(Config::default());
        let err = handler
            .get_models(&GetModelsParams {
                sort_by: Some("price".into()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let report = handler.get_models(&GetModelsParams::default()).unwrap();
        assert!(report.contains("- Total Models: 22"));
    }
}
