//! MCP Server implementation for the video generation server.
//!
//! Exposes the generation, catalog, FFmpeg media and vision tools plus the
//! `video://models` and `video://providers` resources.

use crate::catalog::GetModelsParams;
use crate::generation::summary::render_error;
use crate::handler::{VideoGenHandler, VideoGenerateParams};
use crate::media::{
    AdjustVideoSpeedParams, ApplyVideoFiltersParams, GetContentParams, GetVideoMetadataParams,
    MediaHandler, MergeAudioVideoParams, ScaleVideoParams, SeparateAudioVideoParams,
};
use crate::resources;
use crate::vision::{ImageCheck, ImageCheckParams, VisionHandler};
use rmcp::{
    ErrorData as McpError, ServerHandler,
    model::{
        CallToolResult, Content, ListResourcesResult, ReadResourceResult, ResourceContents,
        ServerCapabilities, ServerInfo,
    },
};
use schemars::JsonSchema;
use serde::Deserialize;
use std::borrow::Cow;
use std::sync::Arc;
use tracing::{debug, info, warn};
use videogen_mcp_common::config::Config;
use videogen_mcp_common::error::Error;

/// MCP Server for video generation and editing.
#[derive(Clone)]
pub struct VideoGenServer {
    generator: Arc<VideoGenHandler>,
    media: MediaHandler,
    vision: VisionHandler,
}

impl VideoGenServer {
    /// Create a new VideoGenServer with the given configuration.
    pub fn new(config: Config) -> Self {
        let http = reqwest::Client::new();
        Self {
            media: MediaHandler::new(&config),
            vision: VisionHandler::new(http.clone(), &config),
            generator: Arc::new(VideoGenHandler::with_http(config, http)),
        }
    }

    /// Generate videos and summarize the outcome.
    pub async fn generate_video(&self, params: VideoGenerateParams) -> Result<CallToolResult, McpError> {
        info!(model = %params.model, "Generating video");

        match self.generator.generate_video(&params).await {
            Ok(result) => Ok(CallToolResult::success(vec![Content::text(
                result.render(params.verbose),
            )])),
            Err(e) => {
                warn!(error = %e, kind = e.kind(), "Video generation failed");
                Ok(CallToolResult::error(vec![Content::text(render_error(&e))]))
            }
        }
    }

    pub async fn get_models(&self, params: GetModelsParams) -> Result<CallToolResult, McpError> {
        Ok(respond(self.generator.get_models(&params), "Failed to list models"))
    }

    pub async fn get_video_metadata(&self, params: GetVideoMetadataParams) -> Result<CallToolResult, McpError> {
        info!(input = %params.file_path, "Reading video metadata");
        let result = self.media.get_video_metadata(params).await.and_then(|metadata| {
            serde_json::to_string_pretty(&metadata)
                .map_err(|e| Error::validation(format!("Failed to serialize result: {}", e)))
        });
        Ok(respond(result, "Failed to read metadata"))
    }

    pub async fn adjust_video_speed(&self, params: AdjustVideoSpeedParams) -> Result<CallToolResult, McpError> {
        info!(input = %params.input, speed = params.speed_factor, "Adjusting video speed");
        let result = self
            .media
            .adjust_video_speed(params)
            .await
            .map(|output| format!("Adjusted speed: {}", output));
        Ok(respond(result, "Speed adjustment failed"))
    }

    pub async fn scale_video(&self, params: ScaleVideoParams) -> Result<CallToolResult, McpError> {
        info!(input = %params.input, width = params.width, height = params.height, "Scaling video");
        let result = self
            .media
            .scale_video(params)
            .await
            .map(|output| format!("Scaled to: {}", output));
        Ok(respond(result, "Scaling failed"))
    }

    pub async fn apply_video_filters(&self, params: ApplyVideoFiltersParams) -> Result<CallToolResult, McpError> {
        info!(input = %params.input, "Applying video filters");
        let result = self
            .media
            .apply_video_filters(params)
            .await
            .map(|output| format!("Filtered video: {}", output));
        Ok(respond(result, "Filtering failed"))
    }

    pub async fn separate_audio_and_video(
        &self,
        params: SeparateAudioVideoParams,
    ) -> Result<CallToolResult, McpError> {
        info!(input = %params.input, "Separating audio and video");
        let result = self
            .media
            .separate_audio_and_video(params)
            .await
            .map(|(video, audio)| format!("Video track: {}\nAudio track: {}", video, audio));
        Ok(respond(result, "Separation failed"))
    }

    pub async fn merge_audio_and_video(&self, params: MergeAudioVideoParams) -> Result<CallToolResult, McpError> {
        info!(video = %params.video_input, audio = %params.audio_input, "Merging audio and video");
        let result = self.media.merge_audio_and_video(params).await.map(|merged| {
            match merged.trimmed_to {
                Some(seconds) => format!("Merged to: {} (trimmed to {:.2}s)", merged.output, seconds),
                None => format!("Merged to: {}", merged.output),
            }
        });
        Ok(respond(result, "Merge failed"))
    }

    pub async fn get_content(&self, params: GetContentParams) -> Result<CallToolResult, McpError> {
        info!(input = %params.input, "Extracting frames");
        let result = self.media.get_content(params).await.map(|frames| {
            format!(
                "Extracted {} screenshots to: {}",
                frames.screenshots, frames.output_directory
            )
        });
        Ok(respond(result, "Frame extraction failed"))
    }

    pub async fn check_image(&self, params: ImageCheckParams, check: ImageCheck) -> Result<CallToolResult, McpError> {
        info!(image = %params.image_path, check = ?check, "Checking image");
        Ok(respond(
            self.vision.check_image(&params, check).await,
            "Image check failed",
        ))
    }
}

/// Render a handler result; errors become tool-level error results.
fn respond(result: Result<String, Error>, context: &str) -> CallToolResult {
    match result {
        Ok(text) => CallToolResult::success(vec![Content::text(text)]),
        Err(e) => {
            warn!(error = %e, kind = e.kind(), "{}", context);
            CallToolResult::error(vec![Content::text(format!("{}: {}", context, e))])
        }
    }
}

/// Every tool the server exposes.
pub fn tools() -> Vec<rmcp::model::Tool> {
    vec![
        create_tool::<VideoGenerateParams>(
            "generate-video",
            "Generate one or more videos with a Replicate video model. Accepts a single prompt or a list of prompts, \
             an optional image for image-to-video models, and common generation parameters adapted per model. \
             Videos are saved locally once complete.",
        ),
        create_tool::<GetModelsParams>(
            "get-models",
            "List available video models with capabilities, quality, speed and cost estimates. \
             Supports filtering by name, type, resolution and audio support, and sorting.",
        ),
        create_tool::<GetVideoMetadataParams>(
            "get-video-metadata",
            "Get metadata for a video file (duration, resolution, aspect ratio, fps, codecs, bitrates, audio).",
        ),
        create_tool::<AdjustVideoSpeedParams>(
            "adjust-video-speed",
            "Speed up or slow down a video, adjusting audio tempo to match.",
        ),
        create_tool::<ScaleVideoParams>(
            "scale-video",
            "Resize a video to the given width and height, optionally preserving the aspect ratio.",
        ),
        create_tool::<ApplyVideoFiltersParams>(
            "apply-video-filters",
            "Apply an FFmpeg video filter string to a video.",
        ),
        create_tool::<SeparateAudioVideoParams>(
            "separate-audio-and-video",
            "Split a video into a silent video file and an audio file.",
        ),
        create_tool::<MergeAudioVideoParams>(
            "merge-audio-and-video",
            "Add or replace the audio track of a video, optionally trimming to the shorter stream.",
        ),
        create_tool::<GetContentParams>(
            "get-content",
            "Extract screenshots from a video at a fixed interval.",
        ),
        create_tool::<ImageCheckParams>(
            "check-watermark",
            "Check an image for watermarks using Gemini vision.",
        ),
        create_tool::<ImageCheckParams>(
            "check-asset-9by16",
            "Check whether an image is watermark-free and can be cropped to 9:16, with cropping instructions.",
        ),
    ]
}

impl ServerHandler for VideoGenServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Video generation server using Replicate models. \
                 Generates videos from text or images, lists model capabilities, \
                 edits videos with FFmpeg and checks images with Gemini."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            ..Default::default()
        }
    }

    fn list_tools(
        &self,
        _params: Option<rmcp::model::PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<rmcp::model::ListToolsResult, McpError>> + Send + '_ {
        async move {
            Ok(rmcp::model::ListToolsResult {
                tools: tools(),
                next_cursor: None,
                meta: None,
            })
        }
    }

    fn call_tool(
        &self,
        params: rmcp::model::CallToolRequestParam,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        async move {
            debug!(tool = %params.name, "Calling tool");
            match params.name.as_ref() {
                "generate-video" => self.generate_video(parse_params(params.arguments)?).await,
                "get-models" => {
                    // Every catalog filter is optional.
                    let tool_params: GetModelsParams = match params.arguments {
                        Some(_) => parse_params(params.arguments)?,
                        None => GetModelsParams::default(),
                    };
                    self.get_models(tool_params).await
                }
                "get-video-metadata" => self.get_video_metadata(parse_params(params.arguments)?).await,
                "adjust-video-speed" => self.adjust_video_speed(parse_params(params.arguments)?).await,
                "scale-video" => self.scale_video(parse_params(params.arguments)?).await,
                "apply-video-filters" => self.apply_video_filters(parse_params(params.arguments)?).await,
                "separate-audio-and-video" => {
                    self.separate_audio_and_video(parse_params(params.arguments)?).await
                }
                "merge-audio-and-video" => self.merge_audio_and_video(parse_params(params.arguments)?).await,
                "get-content" => self.get_content(parse_params(params.arguments)?).await,
                "check-watermark" => {
                    self.check_image(parse_params(params.arguments)?, ImageCheck::Watermark)
                        .await
                }
                "check-asset-9by16" => {
                    self.check_image(parse_params(params.arguments)?, ImageCheck::Asset9by16)
                        .await
                }
                _ => Err(McpError::invalid_params(format!("Unknown tool: {}", params.name), None)),
            }
        }
    }

    fn list_resources(
        &self,
        _params: Option<rmcp::model::PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListResourcesResult, McpError>> + Send + '_ {
        async move {
            debug!("Listing resources");
            Ok(ListResourcesResult {
                resources: vec![
                    json_resource(
                        resources::MODELS_URI,
                        "Available Video Models",
                        "Capability descriptors for every registered video model",
                    ),
                    json_resource(
                        resources::PROVIDERS_URI,
                        "Model Providers",
                        "Companies publishing the registered models, with model counts",
                    ),
                ],
                next_cursor: None,
                meta: None,
            })
        }
    }

    fn read_resource(
        &self,
        params: rmcp::model::ReadResourceRequestParam,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ReadResourceResult, McpError>> + Send + '_ {
        async move {
            let uri = &params.uri;
            debug!(uri = %uri, "Reading resource");

            let content = resources::read(uri).ok_or_else(|| {
                McpError::resource_not_found(format!("Unknown resource: {}", uri), None)
            })?;

            Ok(ReadResourceResult {
                contents: vec![ResourceContents::text(content, uri.clone())],
            })
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn json_resource(uri: &str, name: &str, description: &str) -> rmcp::model::Resource {
    rmcp::model::Resource {
        raw: rmcp::model::RawResource {
            uri: uri.to_string(),
            name: name.to_string(),
            title: None,
            description: Some(description.to_string()),
            mime_type: Some("application/json".to_string()),
            size: None,
            icons: None,
            meta: None,
        },
        annotations: None,
    }
}

/// Create a tool definition from a parameter type.
fn create_tool<T: JsonSchema>(name: &'static str, description: &'static str) -> rmcp::model::Tool {
    let schema = schemars::schema_for!(T);
    let input_schema = match serde_json::to_value(&schema).unwrap_or_default() {
        serde_json::Value::Object(map) => Arc::new(map),
        _ => Arc::new(serde_json::Map::new()),
    };

    rmcp::model::Tool {
        name: Cow::Borrowed(name),
        description: Some(Cow::Borrowed(description)),
        input_schema,
        annotations: None,
        icons: None,
        meta: None,
        output_schema: None,
        title: None,
    }
}

/// Parse tool parameters from JSON arguments.
fn parse_params<T: for<'de> Deserialize<'de>>(
    arguments: Option<serde_json::Map<String, serde_json::Value>>,
) -> Result<T, McpError> {
    arguments
        .map(|args| serde_json::from_value(serde_json::Value::Object(args)))
        .transpose()
        .map_err(|e| McpError::invalid_params(format!("Invalid parameters: {}", e), None))?
        .ok_or_else(|| McpError::invalid_params("Missing parameters", None))
}
