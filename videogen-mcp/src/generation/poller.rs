//! Poll a prediction to a terminal state and persist its artifact.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};
use videogen_mcp_common::config::Config;
use videogen_mcp_common::error::Error;

use super::client::{PredictionStatus, ReplicateClient};
use super::naming::{artifact_file_name, video_extension, write_artifact};

/// Poll cadence and overall time limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            timeout: Duration::from_secs(900),
        }
    }
}

impl PollSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            interval: config.poll_interval,
            timeout: config.generation_timeout,
        }
    }
}

/// A downloaded artifact written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedArtifact {
    pub path: PathBuf,
    /// URL the artifact was downloaded from
    pub url: String,
    pub bytes: usize,
}

impl SavedArtifact {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Poll `prediction_id` until it reaches a terminal status or the timeout
/// elapses. On success the output is downloaded and saved under `save_dir`.
///
/// The timeout bounds the whole sequence, including a status request or
/// download that is still in flight when it runs out.
///
/// # Errors
/// - `Error::GenerationFailed` with the provider's message on failure
/// - `Error::GenerationCanceled` if the prediction was canceled
/// - `Error::GenerationTimedOut` if no terminal status arrived in time
/// - `Error::ProviderRejected` / `Error::ProviderUnreachable` if a poll fails
/// - `Error::ArtifactDownloadFailed` / `Error::LocalWriteFailed` when saving
pub async fn await_completion(
    client: &ReplicateClient,
    prediction_id: &str,
    settings: PollSettings,
    save_dir: &Path,
    model_id: &str,
    prompt: &str,
) -> Result<SavedArtifact, Error> {
    let polling = poll_and_save(client, prediction_id, settings.interval, save_dir, model_id, prompt);
    match tokio::time::timeout(settings.timeout, polling).await {
        Ok(result) => result,
        Err(_) => {
            warn!(prediction_id, timeout = ?settings.timeout, "Prediction timed out");
            Err(Error::GenerationTimedOut {
                seconds: settings.timeout.as_secs(),
            })
        }
    }
}

async fn poll_and_save(
    client: &ReplicateClient,
    prediction_id: &str,
    interval: Duration,
    save_dir: &Path,
    model_id: &str,
    prompt: &str,
) -> Result<SavedArtifact, Error> {
    let mut polls = 0u32;

    loop {
        polls += 1;
        let prediction = client.get_prediction(prediction_id).await?;
        debug!(prediction_id, status = %prediction.status, polls, "Polled prediction");

        match prediction.status {
            PredictionStatus::Succeeded => match prediction.output_url() {
                Some(url) => {
                    let bytes = client.download(url).await?;
                    let name = artifact_file_name(model_id, prompt, Utc::now(), video_extension(url));
                    let path = write_artifact(save_dir, &name, &bytes).await?;
                    info!(prediction_id, path = %path.display(), bytes = bytes.len(), "Video saved");
                    return Ok(SavedArtifact {
                        path,
                        url: url.to_string(),
                        bytes: bytes.len(),
                    });
                }
                None => {
                    // Succeeded without output yet; keep polling.
                    warn!(prediction_id, "Prediction succeeded without an output URL");
                }
            },
            PredictionStatus::Failed => {
                return Err(Error::GenerationFailed(prediction.error_message()));
            }
            PredictionStatus::Canceled => return Err(Error::GenerationCanceled),
            PredictionStatus::Starting | PredictionStatus::Processing | PredictionStatus::Unknown => {}
        }

        tokio::time::sleep(interval).await;
    }
}
