//! Replicate predictions API client.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;
use videogen_mcp_common::config::Config;
use videogen_mcp_common::error::Error;

/// Longest provider error body carried into an error message.
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Prediction lifecycle status as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionStatus {
    #[default]
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
    /// Any status this client does not know; treated as non-terminal.
    #[serde(other)]
    Unknown,
}

impl PredictionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionStatus::Starting => "starting",
            PredictionStatus::Processing => "processing",
            PredictionStatus::Succeeded => "succeeded",
            PredictionStatus::Failed => "failed",
            PredictionStatus::Canceled => "canceled",
            PredictionStatus::Unknown => "unknown",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PredictionStatus::Succeeded | PredictionStatus::Failed | PredictionStatus::Canceled
        )
    }
}

impl std::fmt::Display for PredictionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Links returned with a prediction.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct PredictionUrls {
    /// Human-facing page for monitoring the prediction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web: Option<String>,
    /// API URL for polling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get: Option<String>,
}

/// A prediction as returned by create and get calls.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Prediction {
    pub id: String,
    #[serde(default)]
    pub status: PredictionStatus,
    #[serde(default)]
    pub output: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default)]
    pub urls: Option<PredictionUrls>,
}

impl Prediction {
    /// URL of the generated artifact: the output string, or the first element
    /// of an output array. Empty outputs yield `None`.
    pub fn output_url(&self) -> Option<&str> {
        let url = match self.output.as_ref()? {
            Value::String(url) => url.as_str(),
            Value::Array(items) => items.first()?.as_str()?,
            _ => return None,
        };
        (!url.is_empty()).then_some(url)
    }

    /// Provider error message, or "Unknown error".
    pub fn error_message(&self) -> String {
        match &self.error {
            Some(Value::String(message)) if !message.is_empty() => message.clone(),
            Some(Value::Null) | None => "Unknown error".to_string(),
            Some(Value::String(_)) => "Unknown error".to_string(),
            Some(other) => other.to_string(),
        }
    }

    pub fn monitor_url(&self) -> Option<&str> {
        self.urls.as_ref()?.web.as_deref()
    }
}

#[derive(Debug, Serialize)]
struct CreatePredictionRequest<'a> {
    version: &'a str,
    input: &'a Map<String, Value>,
}

/// Provider error body (`{"detail": "..."}`).
#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    #[serde(default)]
    detail: Option<String>,
}

/// Client for creating and polling predictions.
#[derive(Debug, Clone)]
pub struct ReplicateClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl ReplicateClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    /// Build a client from configuration.
    ///
    /// # Errors
    /// Returns `Error::MissingCredential` if `REPLICATE_API_TOKEN` is unset.
    pub fn from_config(http: reqwest::Client, config: &Config) -> Result<Self, Error> {
        let token = config
            .replicate_api_token
            .as_deref()
            .ok_or_else(|| Error::missing_credential("REPLICATE_API_TOKEN"))?;
        Ok(Self::new(http, config.replicate_api_base.clone(), token))
    }

    pub fn predictions_endpoint(&self) -> String {
        format!("{}/predictions", self.base_url)
    }

    pub fn prediction_endpoint(&self, id: &str) -> String {
        format!("{}/predictions/{}", self.base_url, id)
    }

    /// Submit a prediction for `version` with the adapted `input`.
    ///
    /// # Errors
    /// - `Error::ProviderRejected` for non-success responses, carrying the
    ///   provider's `detail` or the status text
    /// - `Error::ProviderUnreachable` if the request could not be sent
    pub async fn create_prediction(
        &self,
        version: &str,
        input: &Map<String, Value>,
    ) -> Result<Prediction, Error> {
        let endpoint = self.predictions_endpoint();
        debug!(endpoint = %endpoint, version, "Creating prediction");

        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(&self.token)
            .json(&CreatePredictionRequest { version, input })
            .send()
            .await
            .map_err(|e| Error::provider_unreachable(&endpoint, e.to_string()))?;

        Self::parse_prediction(response).await
    }

    /// Fetch the current state of a prediction.
    ///
    /// # Errors
    /// Same as [`ReplicateClient::create_prediction`].
    pub async fn get_prediction(&self, id: &str) -> Result<Prediction, Error> {
        let endpoint = self.prediction_endpoint(id);

        let response = self
            .http
            .get(&endpoint)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| Error::provider_unreachable(&endpoint, e.to_string()))?;

        Self::parse_prediction(response).await
    }

    /// Download a generated artifact.
    ///
    /// # Errors
    /// Returns `Error::ArtifactDownloadFailed` on transport errors or
    /// non-success responses.
    pub async fn download(&self, url: &str) -> Result<Vec<u8>, Error> {
        debug!(url, "Downloading artifact");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::artifact_download_failed(url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::artifact_download_failed(url, status_text(status)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::artifact_download_failed(url, e.to_string()))?;
        Ok(bytes.to_vec())
    }

    async fn parse_prediction(response: reqwest::Response) -> Result<Prediction, Error> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::provider_rejected(
                status.as_u16(),
                rejection_message(status, &body),
            ));
        }

        response.json::<Prediction>().await.map_err(|e| {
            Error::provider_rejected(status.as_u16(), format!("Invalid prediction response: {}", e))
        })
    }
}

fn status_text(status: reqwest::StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.as_u16().to_string())
}

/// The provider's `detail`, else the raw body, else the status text.
fn rejection_message(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(ProviderErrorBody { detail: Some(detail) }) = serde_json::from_str(body) {
        if !detail.is_empty() {
            return detail;
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        status_text(status)
    } else {
        trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prediction_deserializes_provider_shape() {
        let prediction: Prediction = serde_json::from_value(json!({
            "id": "abc123",
            "status": "processing",
            "output": null,
            "error": null,
            "urls": {
                "get": "https://api.replicate.com/v1/predictions/abc123",
                "web": "https://replicate.com/p/abc123"
            },
            "logs": "",
            "version": "google/veo-3"
        }))
        .unwrap();
        assert_eq!(prediction.status, PredictionStatus::Processing);
        assert_eq!(prediction.monitor_url(), Some("https://replicate.com/p/abc123"));
        assert_eq!(prediction.output_url(), None);
    }

    #[test]
    fn test_unknown_status_is_not_terminal() {
        let prediction: Prediction =
            serde_json::from_value(json!({"id": "x", "status": "queued"})).unwrap();
        assert_eq!(prediction.status, PredictionStatus::Unknown);
        assert!(!prediction.status.is_terminal());
    }

    #[test]
    fn test_output_url_from_string_or_array() {
        let single: Prediction =
            serde_json::from_value(json!({"id": "x", "output": "https://cdn/x.mp4"})).unwrap();
        assert_eq!(single.output_url(), Some("https://cdn/x.mp4"));

        let many: Prediction = serde_json::from_value(
            json!({"id": "x", "output": ["https://cdn/a.mp4", "https://cdn/b.mp4"]}),
        )
        .unwrap();
        assert_eq!(many.output_url(), Some("https://cdn/a.mp4"));

        let empty: Prediction =
            serde_json::from_value(json!({"id": "x", "output": []})).unwrap();
        assert_eq!(empty.output_url(), None);

        let blank: Prediction = serde_json::from_value(json!({"id": "x", "output": ""})).unwrap();
        assert_eq!(blank.output_url(), None);
    }

    #[test]
    fn test_error_message_defaults() {
        let failed: Prediction =
            serde_json::from_value(json!({"id": "x", "status": "failed", "error": "CUDA OOM"}))
                .unwrap();
        assert_eq!(failed.error_message(), "CUDA OOM");

        let silent: Prediction =
            serde_json::from_value(json!({"id": "x", "status": "failed"})).unwrap();
        assert_eq!(silent.error_message(), "Unknown error");
    }

    #[test]
    fn test_rejection_message_prefers_detail() {
        let status = reqwest::StatusCode::UNPROCESSABLE_ENTITY;
        assert_eq!(
            rejection_message(status, r#"{"detail": "Invalid version or not permitted"}"#),
            "Invalid version or not permitted"
        );
        assert_eq!(rejection_message(status, ""), "Unprocessable Entity");
        assert_eq!(rejection_message(status, "plain failure"), "plain failure");
    }

    #[test]
    fn test_from_config_requires_token() {
        let err = ReplicateClient::from_config(reqwest::Client::new(), &Config::default()).unwrap_err();
        assert!(matches!(err, Error::MissingCredential(ref var) if var == "REPLICATE_API_TOKEN"));
    }

    #[test]
    fn test_create_request_serialization() {
        let mut input = Map::new();
        input.insert("prompt".into(), json!("cat"));
        let body = serde_json::to_value(CreatePredictionRequest {
            version: "google/veo-3",
            input: &input,
        })
        .unwrap();
        assert_eq!(body, json!({"version": "google/veo-3", "input": {"prompt": "cat"}}));
    }
}

#[cfg(test)]
mod api_tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> ReplicateClient {
        ReplicateClient::new(reqwest::Client::new(), format!("{}/v1", server.uri()), "r8_test")
    }

    #[tokio::test]
    async fn test_create_prediction_posts_version_and_input() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/predictions"))
            .and(header("authorization", "Bearer r8_test"))
            .and(body_json(json!({"version": "luma/ray", "input": {"prompt": "cat"}})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "p1",
                "status": "starting",
                "urls": {"web": "https://replicate.com/p/p1"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut input = Map::new();
        input.insert("prompt".into(), json!("cat"));
        let prediction = client(&server).create_prediction("luma/ray", &input).await.unwrap();
        assert_eq!(prediction.id, "p1");
        assert_eq!(prediction.status, PredictionStatus::Starting);
    }

    #[tokio::test]
    async fn test_create_prediction_rejection_carries_detail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(402).set_body_json(json!({
                "detail": "You have insufficient credit"
            })))
            .mount(&server)
            .await;

        let err = client(&server).create_prediction("luma/ray", &Map::new()).await.unwrap_err();
        match err {
            Error::ProviderRejected { status_code, message } => {
                assert_eq!(status_code, 402);
                assert_eq!(message, "You have insufficient credit");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_provider() {
        let client = ReplicateClient::new(reqwest::Client::new(), "http://127.0.0.1:1/v1", "t");
        let err = client.get_prediction("p1").await.unwrap_err();
        assert!(matches!(err, Error::ProviderUnreachable { .. }));
    }

    #[tokio::test]
    async fn test_download_failure_names_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/out.mp4"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = format!("{}/out.mp4", server.uri());
        let err = client(&server).download(&url).await.unwrap_err();
        match err {
            Error::ArtifactDownloadFailed { url: failed, message } => {
                assert_eq!(failed, url);
                assert_eq!(message, "Not Found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
