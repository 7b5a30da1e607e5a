//! One generation job per prompt, run concurrently and aggregated by index.

use std::path::Path;

use futures::future::join_all;
use serde_json::{Map, Value};
use tracing::{info, warn};
use videogen_mcp_common::error::Error;
use videogen_mcp_common::models::VideoModel;

use super::adapter::{GenerationRequest, adapt};
use super::client::{Prediction, PredictionStatus, ReplicateClient};
use super::poller::{PollSettings, SavedArtifact, await_completion};

/// Overall outcome of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateStatus {
    AllSuccessful,
    Partial,
    NoneSucceeded,
}

impl AggregateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateStatus::AllSuccessful => "all_successful",
            AggregateStatus::Partial => "partial",
            AggregateStatus::NoneSucceeded => "none",
        }
    }

    fn from_counts(completed: usize, total: usize) -> Self {
        if total > 0 && completed == total {
            AggregateStatus::AllSuccessful
        } else if completed > 0 {
            AggregateStatus::Partial
        } else {
            AggregateStatus::NoneSucceeded
        }
    }
}

impl std::fmt::Display for AggregateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to one prompt of the batch.
#[derive(Debug)]
pub struct PromptOutcome {
    /// Position of the prompt in the request
    pub index: usize,
    pub prompt: String,
    /// Provider input that was submitted
    pub input: Map<String, Value>,
    /// Adjustments made while adapting the request
    pub notes: Vec<String>,
    /// The prediction, if submission succeeded
    pub prediction: Option<Prediction>,
    /// Last status known for the prediction
    pub status: Option<PredictionStatus>,
    pub result: Result<SavedArtifact, Error>,
}

impl PromptOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn saved(&self) -> Option<&SavedArtifact> {
        self.result.as_ref().ok()
    }

    pub fn monitor_url(&self) -> Option<&str> {
        self.prediction.as_ref()?.monitor_url()
    }
}

/// Outcomes of every prompt, in request order.
#[derive(Debug)]
pub struct AggregateResult {
    pub model: &'static VideoModel,
    pub outcomes: Vec<PromptOutcome>,
}

impl AggregateResult {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn completed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn status(&self) -> AggregateStatus {
        AggregateStatus::from_counts(self.completed_count(), self.total())
    }
}

/// One request per prompt. A provided seed is offset by the prompt index.
pub fn expand_requests(base: &GenerationRequest, prompts: &[String]) -> Vec<GenerationRequest> {
    prompts
        .iter()
        .enumerate()
        .map(|(index, prompt)| GenerationRequest {
            prompt: prompt.clone(),
            seed: base.seed.map(|seed| seed.wrapping_add(index as i64)),
            ..base.clone()
        })
        .collect()
}

struct Submitted {
    index: usize,
    prompt: String,
    input: Map<String, Value>,
    notes: Vec<String>,
    submission: Result<Prediction, Error>,
}

/// Adapt, submit and await one job per prompt.
///
/// Every prompt is adapted before anything is sent, so an adaptation error
/// aborts the batch with no network calls. After that, failures are recorded
/// per prompt and never cancel sibling jobs.
///
/// # Errors
/// Returns the first adaptation error (`UnknownModel`, `MissingImageInput`,
/// `UnsupportedImageInput`).
pub async fn run_all(
    client: &ReplicateClient,
    model: &'static VideoModel,
    base: &GenerationRequest,
    prompts: &[String],
    settings: PollSettings,
    save_dir: &Path,
) -> Result<AggregateResult, Error> {
    let requests = expand_requests(base, prompts);
    let adapted = requests
        .iter()
        .map(|request| adapt(request, model))
        .collect::<Result<Vec<_>, Error>>()?;

    info!(model = model.id, jobs = requests.len(), "Submitting predictions");

    let submissions = requests.into_iter().zip(adapted).enumerate().map(
        |(index, (request, adapted))| async move {
            let submission = client.create_prediction(model.version, &adapted.input).await;
            if let Err(e) = &submission {
                warn!(index, error = %e, "Prediction submission failed");
            }
            Submitted {
                index,
                prompt: request.prompt,
                input: adapted.input,
                notes: adapted.notes,
                submission,
            }
        },
    );
    let submitted = join_all(submissions).await;

    let completions = submitted.into_iter().map(|job| async move {
        match job.submission {
            Ok(prediction) => {
                let result = await_completion(
                    client,
                    &prediction.id,
                    settings,
                    save_dir,
                    model.id,
                    &job.prompt,
                )
                .await;
                let status = Some(status_after(&result, prediction.status));
                PromptOutcome {
                    index: job.index,
                    prompt: job.prompt,
                    input: job.input,
                    notes: job.notes,
                    prediction: Some(prediction),
                    status,
                    result,
                }
            }
            Err(e) => PromptOutcome {
                index: job.index,
                prompt: job.prompt,
                input: job.input,
                notes: job.notes,
                prediction: None,
                status: None,
                result: Err(e),
            },
        }
    });
    let outcomes = join_all(completions).await;

    let aggregate = AggregateResult { model, outcomes };
    info!(
        model = model.id,
        completed = aggregate.completed_count(),
        total = aggregate.total(),
        status = %aggregate.status(),
        "Generation batch finished"
    );
    Ok(aggregate)
}

fn status_after(result: &Result<SavedArtifact, Error>, submitted: PredictionStatus) -> PredictionStatus {
    match result {
        Ok(_) => PredictionStatus::Succeeded,
        Err(Error::GenerationFailed(_)) => PredictionStatus::Failed,
        Err(Error::GenerationCanceled) => PredictionStatus::Canceled,
        Err(Error::GenerationTimedOut { .. }) => PredictionStatus::Processing,
        Err(_) => submitted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use videogen_mcp_common::models::ModelRegistry;

    #[test]
    fn test_expand_offsets_seed() {
        let base = GenerationRequest {
            seed: Some(41),
            duration: Some(4.0),
            ..Default::default()
        };
        let prompts = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let requests = expand_requests(&base, &prompts);
        let seeds: Vec<_> = requests.iter().map(|r| r.seed).collect();
        assert_eq!(seeds, vec![Some(41), Some(42), Some(43)]);
        assert!(requests.iter().all(|r| r.duration == Some(4.0)));
        assert_eq!(requests[1].prompt, "b");
    }

    #[test]
    fn test_expand_without_seed() {
        let prompts = vec!["a".to_string(), "b".to_string()];
        let requests = expand_requests(&GenerationRequest::default(), &prompts);
        assert!(requests.iter().all(|r| r.seed.is_none()));
    }

    #[test]
    fn test_aggregate_status_from_counts() {
        assert_eq!(AggregateStatus::from_counts(3, 3), AggregateStatus::AllSuccessful);
        assert_eq!(AggregateStatus::from_counts(2, 3), AggregateStatus::Partial);
        assert_eq!(AggregateStatus::from_counts(0, 3), AggregateStatus::NoneSucceeded);
        assert_eq!(AggregateStatus::from_counts(0, 0), AggregateStatus::NoneSucceeded);
        assert_eq!(AggregateStatus::Partial.to_string(), "partial");
    }

    #[tokio::test]
    async fn test_adaptation_error_aborts_before_network() {
        let model = ModelRegistry::resolve("wan-i2v-480p").unwrap();
        // Nothing listens here; reaching the network would surface ProviderUnreachable.
        let client = ReplicateClient::new(reqwest::Client::new(), "http://127.0.0.1:1", "t");
        let prompts = vec!["a".to_string()];
        let err = run_all(
            &client,
            model,
            &GenerationRequest::default(),
            &prompts,
            PollSettings::default(),
            Path::new("unused"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::MissingImageInput(_)));
    }
}
