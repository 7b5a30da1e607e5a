//! Configuration loaded from environment variables and an optional `.env` file.

use crate::error::ConfigError;
use std::path::PathBuf;
use std::time::Duration;

/// Default inference API base URL.
pub const DEFAULT_REPLICATE_API_BASE: &str = "https://api.replicate.com/v1";

/// Default vision API base URL.
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Inference API token (REPLICATE_API_TOKEN). Checked per call, not at startup.
    pub replicate_api_token: Option<String>,
    /// Inference API base URL
    pub replicate_api_base: String,
    /// Directory generated videos are saved to unless a call overrides it
    pub save_dir: PathBuf,
    /// Delay between prediction status polls
    pub poll_interval: Duration,
    /// Wall-clock budget for one prediction
    pub generation_timeout: Duration,
    /// Object storage project URL, used to upload local images
    pub supabase_url: Option<String>,
    /// Object storage service-role key
    pub supabase_service_key: Option<String>,
    /// Bucket uploaded images are stored in
    pub supabase_bucket: String,
    /// Vision API key (GOOGLE_API_KEY)
    pub google_api_key: Option<String>,
    /// Vision API base URL
    pub gemini_api_base: String,
    /// ffmpeg binary
    pub ffmpeg_path: String,
    /// ffprobe binary
    pub ffprobe_path: String,
    /// Time budget for one ffmpeg/ffprobe invocation
    pub ffmpeg_timeout: Duration,
    /// HTTP server port
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            replicate_api_token: None,
            replicate_api_base: DEFAULT_REPLICATE_API_BASE.to_string(),
            save_dir: PathBuf::from("videos"),
            poll_interval: Duration::from_secs(10),
            generation_timeout: Duration::from_secs(15 * 60),
            supabase_url: None,
            supabase_service_key: None,
            supabase_bucket: "images".to_string(),
            google_api_key: None,
            gemini_api_base: DEFAULT_GEMINI_API_BASE.to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            ffmpeg_timeout: Duration::from_secs(300),
            port: 8080,
        }
    }
}

impl Config {
    /// Load configuration from environment variables and .env file.
    ///
    /// No variable is required; credentials are checked by the operations
    /// that need them.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidValue` if a numeric variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Ok(Self {
            replicate_api_token: non_empty("REPLICATE_API_TOKEN"),
            replicate_api_base: non_empty("REPLICATE_API_BASE")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.replicate_api_base),
            save_dir: non_empty("VIDEO_SAVE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.save_dir),
            poll_interval: parse_secs(&lookup, "VIDEO_POLL_INTERVAL_SECS")?
                .unwrap_or(defaults.poll_interval),
            generation_timeout: parse_secs(&lookup, "VIDEO_GENERATION_TIMEOUT_SECS")?
                .unwrap_or(defaults.generation_timeout),
            supabase_url: non_empty("SUPABASE_URL").map(|v| v.trim_end_matches('/').to_string()),
            supabase_service_key: non_empty("SUPABASE_SERVICE_ROLE_KEY"),
            supabase_bucket: non_empty("SUPABASE_BUCKET").unwrap_or(defaults.supabase_bucket),
            google_api_key: non_empty("GOOGLE_API_KEY"),
            gemini_api_base: non_empty("GEMINI_API_BASE")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.gemini_api_base),
            ffmpeg_path: non_empty("FFMPEG_PATH").unwrap_or(defaults.ffmpeg_path),
            ffprobe_path: non_empty("FFPROBE_PATH").unwrap_or(defaults.ffprobe_path),
            ffmpeg_timeout: parse_secs(&lookup, "FFMPEG_TIMEOUT_SECS")?
                .unwrap_or(defaults.ffmpeg_timeout),
            port: match lookup("PORT") {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::invalid_value("PORT", format!("'{}' is not a valid port", raw)))?,
                None => defaults.port,
            },
        })
    }
}

fn parse_secs<F>(lookup: &F, name: &str) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(name) else {
        return Ok(None);
    };
    let secs: u64 = raw.trim().parse().map_err(|_| {
        ConfigError::invalid_value(name, format!("'{}' is not a whole number of seconds", raw))
    })?;
    if secs == 0 {
        return Err(ConfigError::invalid_value(name, "must be greater than zero"));
    }
    Ok(Some(Duration::from_secs(secs)))
}
