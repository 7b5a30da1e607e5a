//! Gemini-backed image checks for video assets.
//!
//! Sends a local image with a fixed instruction prompt to the Gemini
//! `generateContent` REST endpoint and returns the model's analysis.

use std::path::Path;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use videogen_mcp_common::config::Config;
use videogen_mcp_common::error::Error;

/// Model used for image analysis.
pub const VISION_MODEL: &str = "gemini-2.5-flash";

const WATERMARK_PROMPT: &str = r#"You are analyzing an image to detect watermarks. Examine the ENTIRE image, including every corner, edge and the center, for:
- Text watermarks (company names, photographer credits, stock photo text)
- Logo watermarks (transparent or semi-transparent logos)
- Pattern watermarks (repeating patterns or grids)
- Copyright marks or attribution text
- Any overlaid text that appears to be a watermark
- Subtle, semi-transparent overlays

Respond in one of these formats:

**Format 1 (Watermark Found):**
WATERMARK DETECTED: [Describe the type and location of watermark]
Location: [Specific location like "bottom right corner", "center", "top left"]
Type: [Text/Logo/Pattern/Copyright]
Description: [Detailed description of the watermark]

**Format 2 (No Watermark):**
NO WATERMARK DETECTED: The image is clean and free of any watermarks."#;

const ASSET_9BY16_PROMPT: &str = r#"You are analyzing an image that will be used for 9:16 vertical video content.

1. **WATERMARK CHECK**: First, examine the ENTIRE image, including every corner, edge and the center, for text, logo, pattern or copyright watermarks and any subtle semi-transparent overlays.

2. **IF WATERMARK FOUND**: Stop and respond with:
   "REJECTED: Watermark detected - [describe location and type of watermark]. This image cannot be used."

3. **IF NO WATERMARK**: Work out how to crop the image to 9:16:
   - Identify the main subject(s) or focal point(s)
   - Determine the current aspect ratio and dimensions
   - Give specific cropping instructions that preserve the main subject(s)
   - If the main subject(s) cannot be preserved in 9:16, explain why

Respond in one of these formats:

**Format 1 (Watermark Found):**
REJECTED: Watermark detected - [specific description and location]. This image cannot be used.

**Format 2 (Can be cropped to 9:16):**
APPROVED: No watermarks detected.
CROPPING INSTRUCTIONS:
- Main subject: [what needs to be preserved]
- Recommended crop: [for example "crop from center, removing X pixels from left/right"]
- Notes: [any additional considerations]

**Format 3 (Cannot be cropped to 9:16):**
REJECTED: No watermarks detected, but image cannot be cropped to 9:16 while preserving main subject(s).
Reason: [why, for example "main subjects at opposite edges"]
Recommendation: Delete this image and find another suitable for vertical format."#;

/// Which analysis to run on an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageCheck {
    Watermark,
    Asset9by16,
}

impl ImageCheck {
    pub fn prompt(&self) -> &'static str {
        match self {
            ImageCheck::Watermark => WATERMARK_PROMPT,
            ImageCheck::Asset9by16 => ASSET_9BY16_PROMPT,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ImageCheck::Watermark => "Watermark Check Analysis",
            ImageCheck::Asset9by16 => "9:16 Asset Check Analysis",
        }
    }
}

/// Parameters for the image check tools.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct ImageCheckParams {
    /// Absolute path to the image file to analyze.
    pub image_path: String,
}

/// MIME type for an image path; unknown extensions are sent as JPEG.
pub fn image_mime_type(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

// =============================================================================
// API Types
// =============================================================================

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<RequestContent>,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    role: &'static str,
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart {
    InlineData { inline_data: InlineData },
    Text { text: String },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: &'static str,
    data: String,
}

/// Gemini API response.
#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
pub struct CandidatePart {
    #[serde(default)]
    pub text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate.
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

// =============================================================================
// Handler
// =============================================================================

/// Image analysis through the Gemini REST API.
#[derive(Debug, Clone)]
pub struct VisionHandler {
    http: reqwest::Client,
    api_base: String,
    api_key: Option<String>,
}

impl VisionHandler {
    pub fn new(http: reqwest::Client, config: &Config) -> Self {
        Self {
            http,
            api_base: config.gemini_api_base.clone(),
            api_key: config.google_api_key.clone(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.api_base, VISION_MODEL)
    }

    /// Run `check` on the image and return the titled analysis.
    ///
    /// # Errors
    /// - `Error::Validation` if the image does not exist
    /// - `Error::MissingCredential` if `GOOGLE_API_KEY` is unset
    /// - `Error::Api` if the request fails or returns no text
    #[instrument(level = "info", skip(self, params), fields(image = %params.image_path))]
    pub async fn check_image(&self, params: &ImageCheckParams, check: ImageCheck) -> Result<String, Error> {
        let path = Path::new(&params.image_path);
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(Error::validation(format!("Image file not found: {}", params.image_path)));
        }
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::missing_credential("GOOGLE_API_KEY"))?;

        let bytes = tokio::fs::read(path).await?;
        let request = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![
                    RequestPart::InlineData {
                        inline_data: InlineData {
                            mime_type: image_mime_type(path),
                            data: BASE64.encode(&bytes),
                        },
                    },
                    RequestPart::Text {
                        text: check.prompt().to_string(),
                    },
                ],
            }],
        };

        let endpoint = self.endpoint();
        debug!(endpoint = %endpoint, bytes = bytes.len(), "Calling Gemini API");

        let response = self
            .http
            .post(&endpoint)
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::api(&endpoint, 0, format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::api(&endpoint, status.as_u16(), body));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|e| {
            Error::api(&endpoint, status.as_u16(), format!("Failed to parse response: {}", e))
        })?;
        let analysis = parsed
            .text()
            .ok_or_else(|| Error::api(&endpoint, status.as_u16(), "Response contained no text"))?;

        info!(check = ?check, "Image analysis complete");

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| params.image_path.clone());
        Ok(format!("**{}**\n\n**Image:** {}\n\n{}", check.title(), name, analysis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_image_mime_type() {
        assert_eq!(image_mime_type(Path::new("/a/b.PNG")), "image/png");
        assert_eq!(image_mime_type(Path::new("/a/b.jpg")), "image/jpeg");
        assert_eq!(image_mime_type(Path::new("/a/b.webp")), "image/webp");
        assert_eq!(image_mime_type(Path::new("/a/b.gif")), "image/jpeg");
        assert_eq!(image_mime_type(Path::new("/a/b")), "image/jpeg");
    }

    #[test]
    fn test_request_serialization() {
        let request = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![
                    RequestPart::InlineData {
                        inline_data: InlineData {
                            mime_type: "image/png",
                            data: "AAAA".to_string(),
                        },
                    },
                    RequestPart::Text { text: "look".to_string() },
                ],
            }],
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"contents": [{"role": "user", "parts": [
                {"inline_data": {"mime_type": "image/png", "data": "AAAA"}},
                {"text": "look"}
            ]}]})
        );
    }

    #[test]
    fn test_response_text() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"text": "NO WATERMARK "}, {"text": "DETECTED"}]}}]
        }))
        .unwrap();
        assert_eq!(response.text().as_deref(), Some("NO WATERMARK DETECTED"));

        let empty: GenerateContentResponse = serde_json::from_value(json!({"candidates": []})).unwrap();
        assert!(empty.text().is_none());
    }

    #[test]
    fn test_prompts_describe_expected_verdicts() {
        assert!(ImageCheck::Watermark.prompt().contains("NO WATERMARK DETECTED"));
        assert!(ImageCheck::Asset9by16.prompt().contains("APPROVED"));
        assert!(ImageCheck::Asset9by16.prompt().contains("REJECTED"));
    }
}

#[cfg(test)]
mod api_tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::matchers::{any, body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn handler(server: &MockServer, key: Option<&str>) -> VisionHandler {
        let config = Config {
            gemini_api_base: server.uri(),
            google_api_key: key.map(str::to_string),
            ..Config::default()
        };
        VisionHandler::new(reqwest::Client::new(), &config)
    }

    fn image(dir: &TempDir) -> ImageCheckParams {
        let file = dir.path().join("frame.png");
        std::fs::write(&file, [0x89, b'P', b'N', b'G']).unwrap();
        ImageCheckParams {
            image_path: file.to_string_lossy().into_owned(),
        }
    }

    #[tokio::test]
    async fn test_watermark_check() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
            .and(header("x-goog-api-key", "g-key"))
            .and(body_partial_json(json!({"contents": [{"role": "user"}]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "NO WATERMARK DETECTED: The image is clean."}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let tmp = TempDir::new().unwrap();
        let text = handler(&server, Some("g-key"))
            .check_image(&image(&tmp), ImageCheck::Watermark)
            .await
            .unwrap();
        assert_eq!(
            text,
            "**Watermark Check Analysis**\n\n**Image:** frame.png\n\nNO WATERMARK DETECTED: The image is clean."
        );
    }

    #[tokio::test]
    async fn test_missing_key_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let tmp = TempDir::new().unwrap();
        let err = handler(&server, None)
            .check_image(&image(&tmp), ImageCheck::Asset9by16)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingCredential(ref var) if var == "GOOGLE_API_KEY"));
    }

    #[tokio::test]
    async fn test_api_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("API key not valid"))
            .mount(&server)
            .await;

        let tmp = TempDir::new().unwrap();
        let err = handler(&server, Some("bad"))
            .check_image(&image(&tmp), ImageCheck::Watermark)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Api { status_code: 403, .. }));
    }

    #[tokio::test]
    async fn test_missing_image() {
        let server = MockServer::start().await;
        let err = handler(&server, Some("g-key"))
            .check_image(
                &ImageCheckParams {
                    image_path: "/nonexistent/frame.png".to_string(),
                },
                ImageCheck::Watermark,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
