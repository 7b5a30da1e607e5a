//! FFmpeg-backed video editing tools.
//!
//! This module provides the `MediaHandler` struct and parameter types for
//! local video processing. Every operation takes local paths, checks the
//! input exists, creates the output directory and runs the subprocess under
//! the configured time budget.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{debug, info, instrument};
use videogen_mcp_common::config::Config;
use videogen_mcp_common::error::Error;

use crate::handler::ValidationError;

// =============================================================================
// Constants
// =============================================================================

/// Default seconds between extracted frames.
pub const DEFAULT_FRAME_INTERVAL: f64 = 0.5;

/// Default frame resolution for `get-content`.
pub const DEFAULT_FRAME_RESOLUTION: &str = "720p";

/// Audio formats accepted by `separate-audio-and-video`.
pub const VALID_AUDIO_FORMATS: &[&str] = &["mp3", "wav", "aac", "flac"];

/// Values accepted by `trim_to_match`.
pub const VALID_TRIM_MODES: &[&str] = &["video", "audio", "none"];

/// Name pattern of extracted frames.
pub const FRAME_PATTERN: &str = "screenshot_%06d.png";

// atempo accepts factors in [0.5, 2.0] per filter instance.
const ATEMPO_MIN: f64 = 0.5;
const ATEMPO_MAX: f64 = 2.0;

// =============================================================================
// Output Types
// =============================================================================

/// Video file metadata from ffprobe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub path: String,
    pub size_bytes: u64,
    pub duration_seconds: f64,
    pub width: u32,
    pub height: u32,
    /// `W:H`, or "unknown" when a dimension is missing
    pub aspect_ratio: String,
    /// "landscape", "portrait" or "square"
    pub orientation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fps: Option<f64>,
    pub video_codec: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_bitrate: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioProperties>,
    pub container: String,
    pub container_long_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_bitrate: Option<u64>,
    pub video_stream_count: usize,
    pub audio_stream_count: usize,
}

/// Properties of the first audio stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioProperties {
    pub codec: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channels: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<u64>,
    pub channel_layout: String,
}

/// Result of merging an audio track into a video.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeResult {
    pub output: String,
    /// Duration the output was trimmed to, if any
    pub trimmed_to: Option<f64>,
}

/// Result of frame extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameExtraction {
    pub output_directory: String,
    pub screenshots: usize,
}

// =============================================================================
// Parameter Types
// =============================================================================

/// Parameters for reading video metadata.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct GetVideoMetadataParams {
    /// Absolute path to the video file.
    pub file_path: String,
}

/// Parameters for changing playback speed.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct AdjustVideoSpeedParams {
    /// Absolute path to the input video file.
    pub input: String,
    /// Speed factor (0.5 = half speed, 2.0 = double speed).
    pub speed_factor: f64,
    /// Absolute path for the output video file.
    pub output: String,
}

/// Parameters for scaling a video.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct ScaleVideoParams {
    /// Absolute path to the input video file.
    pub input: String,
    /// Target width in pixels.
    pub width: u32,
    /// Target height in pixels.
    pub height: u32,
    /// Absolute path for the output video file.
    pub output: String,
    /// Fit within width x height keeping the aspect ratio (default: false).
    #[serde(default)]
    pub maintain_aspect: bool,
}

/// Parameters for applying an FFmpeg filter chain.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct ApplyVideoFiltersParams {
    /// Absolute path to the input video file.
    pub input: String,
    /// FFmpeg filter string (e.g. "eq=brightness=0.1:contrast=1.2").
    pub filter_string: String,
    /// Absolute path for the output video file.
    pub output: String,
    /// Copy the audio stream unchanged (default: true); false drops audio.
    #[serde(default = "default_true")]
    pub copy_audio: bool,
}

/// Parameters for splitting a video into silent video and audio files.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct SeparateAudioVideoParams {
    /// Absolute path to the input video file.
    pub input: String,
    /// Absolute path for the video output (no audio).
    pub video_output: String,
    /// Absolute path for the audio output.
    pub audio_output: String,
    /// Audio format: "mp3" (default), "wav", "aac", "flac".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_format: Option<String>,
}

/// Parameters for merging an audio file into a video.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct MergeAudioVideoParams {
    /// Absolute path to the input video file.
    pub video_input: String,
    /// Absolute path to the input audio file.
    pub audio_input: String,
    /// Absolute path for the merged output file.
    pub output: String,
    /// Replace the existing audio (default: true); false mixes both tracks.
    #[serde(default = "default_true")]
    pub replace_audio: bool,
    /// "video" trims to the video length, "audio" to the audio length, "none" (default) keeps both.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trim_to_match: Option<String>,
}

/// Parameters for extracting frames at a fixed interval.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct GetContentParams {
    /// Absolute path to the input video file.
    pub input: String,
    /// Absolute path to the output directory for screenshots.
    pub output_directory: String,
    /// Seconds between screenshots (default: 0.5).
    #[serde(default = "default_interval")]
    pub interval: f64,
    /// Screenshot resolution: "720p" (default), "1080p", "480p" or "WIDTHxHEIGHT".
    #[serde(default = "default_frame_resolution")]
    pub resolution: String,
}

fn default_true() -> bool {
    true
}

fn default_interval() -> f64 {
    DEFAULT_FRAME_INTERVAL
}

fn default_frame_resolution() -> String {
    DEFAULT_FRAME_RESOLUTION.to_string()
}

fn into_validation_error(errors: Vec<ValidationError>) -> Error {
    let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    Error::validation(messages.join("; "))
}

impl AdjustVideoSpeedParams {
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        if self.speed_factor.is_finite() && self.speed_factor > 0.0 {
            Ok(())
        } else {
            Err(vec![ValidationError {
                field: "speed_factor".to_string(),
                message: format!("speed_factor must be greater than 0, got {}", self.speed_factor),
            }])
        }
    }
}

impl ScaleVideoParams {
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        if self.width == 0 {
            errors.push(ValidationError {
                field: "width".to_string(),
                message: "width must be greater than 0".to_string(),
            });
        }
        if self.height == 0 {
            errors.push(ValidationError {
                field: "height".to_string(),
                message: "height must be greater than 0".to_string(),
            });
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

impl SeparateAudioVideoParams {
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        match self.audio_format.as_deref() {
            Some(format) if !VALID_AUDIO_FORMATS.contains(&format) => Err(vec![ValidationError {
                field: "audio_format".to_string(),
                message: format!(
                    "Invalid audio format '{}'. Valid options: {}",
                    format,
                    VALID_AUDIO_FORMATS.join(", ")
                ),
            }]),
            _ => Ok(()),
        }
    }
}

impl MergeAudioVideoParams {
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        match self.trim_to_match.as_deref() {
            Some(mode) if !VALID_TRIM_MODES.contains(&mode) => Err(vec![ValidationError {
                field: "trim_to_match".to_string(),
                message: format!(
                    "Invalid trim mode '{}'. Valid options: {}",
                    mode,
                    VALID_TRIM_MODES.join(", ")
                ),
            }]),
            _ => Ok(()),
        }
    }
}

impl GetContentParams {
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        if self.interval.is_finite() && self.interval > 0.0 {
            Ok(())
        } else {
            Err(vec![ValidationError {
                field: "interval".to_string(),
                message: format!("interval must be greater than 0, got {}", self.interval),
            }])
        }
    }
}

// =============================================================================
// Argument Builders
// =============================================================================

/// `atempo` chain for `factor`, splitting it into steps within [0.5, 2.0].
pub fn atempo_chain(factor: f64) -> String {
    let mut remaining = factor;
    let mut steps = Vec::new();
    while remaining > ATEMPO_MAX {
        steps.push(ATEMPO_MAX);
        remaining /= ATEMPO_MAX;
    }
    while remaining < ATEMPO_MIN {
        steps.push(ATEMPO_MIN);
        remaining /= ATEMPO_MIN;
    }
    steps.push(remaining);
    steps
        .iter()
        .map(|step| format!("atempo={}", step))
        .collect::<Vec<_>>()
        .join(",")
}

pub fn setpts_filter(factor: f64) -> String {
    format!("setpts={}*PTS", 1.0 / factor)
}

pub fn scale_filter(width: u32, height: u32, maintain_aspect: bool) -> String {
    if maintain_aspect {
        format!("scale={}:{}:force_original_aspect_ratio=decrease", width, height)
    } else {
        format!("scale={}:{}", width, height)
    }
}

/// Scale filter for a frame resolution name; unknown names fall back to 720p.
pub fn frame_scale(resolution: &str) -> String {
    match resolution {
        "720p" => "scale=1280:720".to_string(),
        "1080p" => "scale=1920:1080".to_string(),
        "480p" => "scale=854:480".to_string(),
        custom if custom.contains('x') => format!("scale={}", custom.replacen('x', ":", 1)),
        _ => "scale=1280:720".to_string(),
    }
}

pub fn audio_codec(format: &str) -> &'static str {
    match format {
        "wav" => "pcm_s16le",
        "aac" => "aac",
        "flac" => "flac",
        _ => "mp3",
    }
}

/// Parse an ffprobe rate such as "30000/1001" or "25".
pub fn parse_frame_rate(rate: &str) -> Option<f64> {
    let fps = match rate.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => rate.trim().parse().ok()?,
    };
    fps.is_finite().then_some(fps)
}

pub fn orientation(width: u32, height: u32) -> &'static str {
    if width > height {
        "landscape"
    } else if height > width {
        "portrait"
    } else {
        "square"
    }
}

fn str_field<'a>(value: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(|v| v.as_str())
}

/// ffprobe reports most numbers as strings; accept either form.
fn num_field<T: std::str::FromStr>(value: &serde_json::Value, key: &str) -> Option<T> {
    match value.get(key)? {
        serde_json::Value::String(s) => s.parse().ok(),
        serde_json::Value::Number(n) => n.to_string().parse().ok(),
        _ => None,
    }
}

/// Build [`VideoMetadata`] from `ffprobe -show_format -show_streams` JSON.
///
/// # Errors
/// Returns `Error::Validation` if the file has no video stream.
pub fn parse_metadata(path: &str, report: &serde_json::Value) -> Result<VideoMetadata, Error> {
    let empty = Vec::new();
    let streams = report
        .get("streams")
        .and_then(|s| s.as_array())
        .unwrap_or(&empty);
    let of_type = |kind: &'static str| {
        streams
            .iter()
            .filter(move |s| str_field(s, "codec_type") == Some(kind))
    };

    let video = of_type("video")
        .next()
        .ok_or_else(|| Error::validation("No video stream found in the file"))?;
    let audio = of_type("audio").next();
    let format = report.get("format").cloned().unwrap_or_default();

    let width: u32 = num_field(video, "width").unwrap_or(0);
    let height: u32 = num_field(video, "height").unwrap_or(0);
    let duration = num_field::<f64>(&format, "duration")
        .or_else(|| num_field(video, "duration"))
        .unwrap_or(0.0);

    Ok(VideoMetadata {
        path: path.to_string(),
        size_bytes: num_field(&format, "size").unwrap_or(0),
        duration_seconds: duration,
        width,
        height,
        aspect_ratio: if width > 0 && height > 0 {
            format!("{}:{}", width, height)
        } else {
            "unknown".to_string()
        },
        orientation: orientation(width, height).to_string(),
        fps: str_field(video, "r_frame_rate").and_then(parse_frame_rate),
        video_codec: str_field(video, "codec_name").unwrap_or("unknown").to_string(),
        video_bitrate: num_field(video, "bit_rate"),
        audio: audio.map(|a| AudioProperties {
            codec: str_field(a, "codec_name").unwrap_or("unknown").to_string(),
            sample_rate: num_field(a, "sample_rate"),
            channels: num_field(a, "channels"),
            bitrate: num_field(a, "bit_rate"),
            channel_layout: str_field(a, "channel_layout").unwrap_or("unknown").to_string(),
        }),
        container: str_field(&format, "format_name").unwrap_or("unknown").to_string(),
        container_long_name: str_field(&format, "format_long_name")
            .unwrap_or("unknown")
            .to_string(),
        overall_bitrate: num_field(&format, "bit_rate"),
        video_stream_count: of_type("video").count(),
        audio_stream_count: of_type("audio").count(),
    })
}

// =============================================================================
// Handler
// =============================================================================

/// FFmpeg/FFprobe runner for the editing tools.
#[derive(Debug, Clone)]
pub struct MediaHandler {
    ffmpeg: String,
    ffprobe: String,
    timeout: Duration,
}

impl MediaHandler {
    pub fn new(config: &Config) -> Self {
        Self {
            ffmpeg: config.ffmpeg_path.clone(),
            ffprobe: config.ffprobe_path.clone(),
            timeout: config.ffmpeg_timeout,
        }
    }

    async fn ensure_input(path: &str) -> Result<PathBuf, Error> {
        let path = PathBuf::from(path);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            Ok(path)
        } else {
            Err(Error::validation(format!("Input file not found: {}", path.display())))
        }
    }

    async fn ensure_parent_dir(output: &str) -> Result<(), Error> {
        if let Some(parent) = Path::new(output).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        Ok(())
    }

    async fn run(&self, program: &str, args: &[String]) -> Result<Vec<u8>, Error> {
        debug!(program, args = ?args, "Running subprocess");

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| Error::timeout(self.timeout.as_secs()))?
            .map_err(|e| Error::ffmpeg(format!("Failed to run {}: {}", program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::ffmpeg(format!("{} failed: {}", program, stderr.trim())));
        }

        Ok(output.stdout)
    }

    /// Execute ffprobe and return parsed JSON output.
    async fn run_ffprobe(&self, input: &Path) -> Result<serde_json::Value, Error> {
        let args = [
            "-v", "quiet", "-print_format", "json", "-show_format", "-show_streams",
        ]
        .iter()
        .map(|s| s.to_string())
        .chain(std::iter::once(input.to_string_lossy().into_owned()))
        .collect::<Vec<_>>();

        let stdout = self.run(&self.ffprobe, &args).await?;
        serde_json::from_slice(&stdout)
            .map_err(|e| Error::ffmpeg(format!("Failed to parse ffprobe output: {}", e)))
    }

    /// Container duration in seconds.
    async fn media_duration(&self, input: &Path) -> Result<f64, Error> {
        let args = vec![
            "-v".to_string(),
            "quiet".to_string(),
            "-show_entries".to_string(),
            "format=duration".to_string(),
            "-of".to_string(),
            "csv=p=0".to_string(),
            input.to_string_lossy().into_owned(),
        ];
        let stdout = self.run(&self.ffprobe, &args).await?;
        let text = String::from_utf8_lossy(&stdout);
        text.trim().parse::<f64>().map_err(|_| {
            Error::ffmpeg(format!(
                "Could not read duration of '{}': {}",
                input.display(),
                text.trim()
            ))
        })
    }

    /// Execute ffmpeg with the given arguments, overwriting outputs.
    async fn run_ffmpeg(&self, args: Vec<String>) -> Result<(), Error> {
        let mut full = vec!["-y".to_string()];
        full.extend(args);
        self.run(&self.ffmpeg, &full).await.map(|_| ())
    }

    // =========================================================================
    // Tool Implementations
    // =========================================================================

    #[instrument(level = "info", skip(self))]
    pub async fn get_video_metadata(&self, params: GetVideoMetadataParams) -> Result<VideoMetadata, Error> {
        let input = Self::ensure_input(&params.file_path).await?;
        let report = self.run_ffprobe(&input).await?;
        let metadata = parse_metadata(&params.file_path, &report)?;
        info!(
            width = metadata.width,
            height = metadata.height,
            duration = metadata.duration_seconds,
            "Got video metadata"
        );
        Ok(metadata)
    }

    #[instrument(level = "info", skip(self))]
    pub async fn adjust_video_speed(&self, params: AdjustVideoSpeedParams) -> Result<String, Error> {
        params.validate().map_err(into_validation_error)?;
        let input = Self::ensure_input(&params.input).await?;
        Self::ensure_parent_dir(&params.output).await?;

        self.run_ffmpeg(vec![
            "-i".to_string(),
            input.to_string_lossy().into_owned(),
            "-filter:v".to_string(),
            setpts_filter(params.speed_factor),
            "-filter:a".to_string(),
            atempo_chain(params.speed_factor),
            "-c:v".to_string(),
            "libx264".to_string(),
            "-c:a".to_string(),
            "aac".to_string(),
            params.output.clone(),
        ])
        .await?;

        info!(output = %params.output, "Adjusted video speed");
        Ok(params.output)
    }

    #[instrument(level = "info", skip(self))]
    pub async fn scale_video(&self, params: ScaleVideoParams) -> Result<String, Error> {
        params.validate().map_err(into_validation_error)?;
        let input = Self::ensure_input(&params.input).await?;
        Self::ensure_parent_dir(&params.output).await?;

        self.run_ffmpeg(vec![
            "-i".to_string(),
            input.to_string_lossy().into_owned(),
            "-vf".to_string(),
            scale_filter(params.width, params.height, params.maintain_aspect),
            "-c:v".to_string(),
            "libx264".to_string(),
            "-c:a".to_string(),
            "copy".to_string(),
            params.output.clone(),
        ])
        .await?;

        info!(output = %params.output, "Scaled video");
        Ok(params.output)
    }

    #[instrument(level = "info", skip(self))]
    pub async fn apply_video_filters(&self, params: ApplyVideoFiltersParams) -> Result<String, Error> {
        if params.filter_string.trim().is_empty() {
            return Err(Error::validation("filter_string: Filter string cannot be empty"));
        }
        let input = Self::ensure_input(&params.input).await?;
        Self::ensure_parent_dir(&params.output).await?;

        let mut args = vec![
            "-i".to_string(),
            input.to_string_lossy().into_owned(),
            "-vf".to_string(),
            params.filter_string.clone(),
            "-c:v".to_string(),
            "libx264".to_string(),
        ];
        if params.copy_audio {
            args.extend(["-c:a".to_string(), "copy".to_string()]);
        } else {
            args.push("-an".to_string());
        }
        args.push(params.output.clone());
        self.run_ffmpeg(args).await?;

        info!(output = %params.output, "Applied video filters");
        Ok(params.output)
    }

    /// Returns the video and audio output paths.
    #[instrument(level = "info", skip(self))]
    pub async fn separate_audio_and_video(
        &self,
        params: SeparateAudioVideoParams,
    ) -> Result<(String, String), Error> {
        params.validate().map_err(into_validation_error)?;
        let input = Self::ensure_input(&params.input).await?;
        Self::ensure_parent_dir(&params.video_output).await?;
        Self::ensure_parent_dir(&params.audio_output).await?;

        let input = input.to_string_lossy().into_owned();
        let codec = audio_codec(params.audio_format.as_deref().unwrap_or("mp3"));

        let video = self.run_ffmpeg(vec![
            "-i".to_string(),
            input.clone(),
            "-c:v".to_string(),
            "copy".to_string(),
            "-an".to_string(),
            params.video_output.clone(),
        ]);
        let audio = self.run_ffmpeg(vec![
            "-i".to_string(),
            input,
            "-vn".to_string(),
            "-c:a".to_string(),
            codec.to_string(),
            params.audio_output.clone(),
        ]);
        tokio::try_join!(video, audio)?;

        info!(video = %params.video_output, audio = %params.audio_output, "Separated audio and video");
        Ok((params.video_output, params.audio_output))
    }

    #[instrument(level = "info", skip(self))]
    pub async fn merge_audio_and_video(&self, params: MergeAudioVideoParams) -> Result<MergeResult, Error> {
        params.validate().map_err(into_validation_error)?;
        let video = Self::ensure_input(&params.video_input).await?;
        let audio = Self::ensure_input(&params.audio_input).await?;
        Self::ensure_parent_dir(&params.output).await?;

        let trimmed_to = match params.trim_to_match.as_deref() {
            Some("video") => Some(self.media_duration(&video).await?),
            Some("audio") => Some(self.media_duration(&audio).await?),
            _ => None,
        };

        let mut args = vec![
            "-i".to_string(),
            video.to_string_lossy().into_owned(),
            "-i".to_string(),
            audio.to_string_lossy().into_owned(),
        ];
        if let Some(duration) = trimmed_to {
            args.extend(["-t".to_string(), duration.to_string()]);
        }
        if params.replace_audio {
            args.extend(
                ["-c:v", "copy", "-c:a", "aac", "-map", "0:v:0", "-map", "1:a:0"]
                    .iter()
                    .map(|s| s.to_string()),
            );
        } else {
            args.extend(
                [
                    "-filter_complex",
                    "[0:a][1:a]amix=inputs=2:duration=first:dropout_transition=3",
                    "-c:v",
                    "copy",
                    "-c:a",
                    "aac",
                ]
                .iter()
                .map(|s| s.to_string()),
            );
        }
        args.push(params.output.clone());
        self.run_ffmpeg(args).await?;

        info!(output = %params.output, ?trimmed_to, "Merged audio and video");
        Ok(MergeResult {
            output: params.output,
            trimmed_to,
        })
    }

    #[instrument(level = "info", skip(self))]
    pub async fn get_content(&self, params: GetContentParams) -> Result<FrameExtraction, Error> {
        params.validate().map_err(into_validation_error)?;
        let input = Self::ensure_input(&params.input).await?;
        let out_dir = PathBuf::from(&params.output_directory);
        tokio::fs::create_dir_all(&out_dir).await?;

        self.run_ffmpeg(vec![
            "-i".to_string(),
            input.to_string_lossy().into_owned(),
            "-vf".to_string(),
            format!("fps=1/{},{}", params.interval, frame_scale(&params.resolution)),
            out_dir.join(FRAME_PATTERN).to_string_lossy().into_owned(),
        ])
        .await?;

        let screenshots = count_frames(&out_dir).await?;
        info!(screenshots, directory = %params.output_directory, "Extracted frames");
        Ok(FrameExtraction {
            output_directory: params.output_directory,
            screenshots,
        })
    }
}

async fn count_frames(dir: &Path) -> Result<usize, Error> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut count = 0;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with("screenshot_") && name.ends_with(".png") {
            count += 1;
        }
    }
    Ok(count)
}
