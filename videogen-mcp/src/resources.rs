//! MCP Resources for the video generation server.
//!
//! - `video://models` - registered video models
//! - `video://providers` - model companies with model counts

use serde::Serialize;
use videogen_mcp_common::models::{ModelRegistry, VideoModel};

use crate::catalog::company_counts;

pub const MODELS_URI: &str = "video://models";
pub const PROVIDERS_URI: &str = "video://providers";

/// A company publishing models on the provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderInfo {
    pub id: &'static str,
    pub model_count: usize,
}

pub fn list_models() -> &'static [VideoModel] {
    ModelRegistry::list_models()
}

pub fn list_providers() -> Vec<ProviderInfo> {
    company_counts(list_models())
        .into_iter()
        .map(|(id, model_count)| ProviderInfo { id, model_count })
        .collect()
}

pub fn models_resource_json() -> String {
    serde_json::to_string_pretty(list_models()).unwrap_or_else(|_| "[]".to_string())
}

pub fn providers_resource_json() -> String {
    serde_json::to_string_pretty(&list_providers()).unwrap_or_else(|_| "[]".to_string())
}

/// Content for a resource URI, if it exists.
pub fn read(uri: &str) -> Option<String> {
    match uri {
        MODELS_URI => Some(models_resource_json()),
        PROVIDERS_URI => Some(providers_resource_json()),
        _ => None,
    }
}
