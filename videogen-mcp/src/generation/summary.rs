//! Text rendering of generation results for tool responses.

use serde_json::{Map, Value};
use videogen_mcp_common::error::Error;
use videogen_mcp_common::models::{DefaultParam, ModelMode, VideoModel};

use super::fanout::{AggregateResult, AggregateStatus, PromptOutcome};

/// Feature labels shown for a model.
pub fn model_features(model: &VideoModel) -> Vec<&'static str> {
    let mut features = Vec::new();
    if model.supports_audio {
        features.push("Audio Generation");
    }
    features.push(model.mode.label());
    features
}

/// Failure line returned when a tool call errors as a whole.
pub fn render_error(error: &Error) -> String {
    format!("❌ Error generating video: {}", error)
}

/// One-line result listing saved files, or monitor links when none were saved.
pub fn render_terse(aggregate: &AggregateResult) -> String {
    let state = match aggregate.status() {
        AggregateStatus::AllSuccessful => "complete",
        AggregateStatus::Partial => "partially complete",
        AggregateStatus::NoneSucceeded => "started",
    };

    let saved: Vec<String> = aggregate
        .outcomes
        .iter()
        .filter_map(|o| o.saved().map(|s| s.file_name()))
        .collect();

    let detail = if !saved.is_empty() {
        format!("Saved: {}", saved.join(", "))
    } else {
        let monitors: Vec<String> = aggregate
            .outcomes
            .iter()
            .filter_map(|o| o.monitor_url().map(|url| format!("Monitor: {}", url)))
            .collect();
        if monitors.is_empty() {
            aggregate
                .outcomes
                .iter()
                .filter_map(|o| o.result.as_ref().err().map(|e| format!("Failed: {}", e)))
                .collect::<Vec<_>>()
                .join(", ")
        } else {
            monitors.join(", ")
        }
    };

    format!("✅ Video generation {}. {}", state, detail)
}

/// Multi-section report: model details, one block per prompt, and an overall line.
pub fn render_verbose(aggregate: &AggregateResult, input_image: Option<&str>) -> String {
    let model = aggregate.model;
    let total = aggregate.total();
    let completed = aggregate.completed_count();
    let status = aggregate.status();
    let parallel = total > 1;

    let headline = match status {
        AggregateStatus::AllSuccessful => "Completed Successfully!".to_string(),
        AggregateStatus::Partial => {
            format!("Partially Complete! ({}/{} videos saved)", completed, total)
        }
        AggregateStatus::NoneSucceeded => "Started Successfully!".to_string(),
    };

    let mut lines = vec![
        format!(
            "🎬 {}Video Generation {}",
            if parallel { "Parallel " } else { "" },
            headline
        ),
        String::new(),
        "📋 **Model Details:**".to_string(),
        format!("- Model: {} ({})", model.id, model.version),
        format!("- Features: {}", model_features(model).join(", ")),
    ];
    if parallel {
        lines.push(format!("- Videos Generated: {}", total));
    } else {
        lines.push("- Single Video".to_string());
    }
    lines.push(format!("- Max Duration: {}s", model.max_duration_seconds));
    lines.push(format!("- Resolutions: {}", model.resolutions.join(", ")));

    for outcome in &aggregate.outcomes {
        lines.push(String::new());
        lines.extend(outcome_lines(model, outcome, input_image));
    }

    lines.push(String::new());
    match status {
        AggregateStatus::AllSuccessful => lines.push(format!(
            "✅ **All {} video{} generated successfully!**",
            total,
            if total > 1 { "s" } else { "" }
        )),
        AggregateStatus::Partial => {
            lines.push(format!("⚠️ **{} of {} videos completed successfully.**", completed, total));
        }
        AggregateStatus::NoneSucceeded => {
            lines.push("📥 **Monitor Progress:**".to_string());
            lines.extend(
                aggregate
                    .outcomes
                    .iter()
                    .filter_map(|o| o.monitor_url().map(|url| format!("- Video {}: {}", o.index + 1, url))),
            );
            lines.push(String::new());
            lines.push("Processing time varies by model complexity and queue load.".to_string());
        }
    }

    if model.supports_audio {
        lines.push(String::new());
        lines.push("🎵 This model includes audio generation!".to_string());
    }
    if model.mode == ModelMode::Both {
        lines.push(String::new());
        lines.push("🖼️ This model supports both text-to-video and image-to-video!".to_string());
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn outcome_lines(model: &VideoModel, outcome: &PromptOutcome, input_image: Option<&str>) -> Vec<String> {
    let mut lines = vec![
        format!("📹 **Video {}:**", outcome.index + 1),
        format!("- Prompt: \"{}\"", outcome.prompt),
    ];
    match &outcome.prediction {
        Some(prediction) => lines.push(format!("- Prediction ID: {}", prediction.id)),
        None => lines.push("- Prediction ID: (not submitted)".to_string()),
    }
    if let Some(status) = outcome.status {
        lines.push(format!("- Status: {}", status));
    }
    match &outcome.result {
        Ok(saved) => lines.push(format!("- ✅ Saved: {}", saved.file_name())),
        Err(e) => {
            lines.push(format!("- ❌ Failed: {}", e));
            if let Some(url) = outcome.monitor_url() {
                lines.push(format!("- 🔗 Monitor: {}", url));
            }
        }
    }
    lines.extend(outcome.notes.iter().map(|note| format!("- 📝 Note: {}", note)));

    lines.push(String::new());
    lines.push("⚙️ **Parameters:**".to_string());
    lines.extend(
        parameter_lines(model, &outcome.prompt, &outcome.input, input_image)
            .into_iter()
            .map(|line| format!("  - {}", line)),
    );
    lines
}

/// Parameter lines for one prompt, taken from the submitted input.
pub fn parameter_lines(
    model: &VideoModel,
    prompt: &str,
    input: &Map<String, Value>,
    input_image: Option<&str>,
) -> Vec<String> {
    let mut lines = vec![format!("Prompt: {}", prompt)];

    let duration = input
        .get("duration")
        .filter(|v| is_set(v))
        .map(display_value)
        .or_else(|| model.default_param("duration").map(|d| display_default(&d)))
        .unwrap_or_else(|| "5".to_string());
    lines.push(format!("Duration: {}s", duration));

    const LABELED: &[(&str, &str)] = &[
        ("resolution", "Resolution"),
        ("fps", "FPS"),
        ("aspect_ratio", "Aspect Ratio"),
        ("generate_audio", "Audio Generation"),
        ("camera_movement", "Camera Movement"),
        ("motion_intensity", "Motion Intensity"),
    ];
    for (key, label) in LABELED {
        if let Some(value) = input.get(*key).filter(|v| is_set(v)) {
            lines.push(format!("{}: {}", label, display_value(value)));
        }
    }

    if let Some(image) = input_image {
        lines.push(format!("Input Image: {}", image));
    }
    if let Some(negative) = input.get("negative_prompt").filter(|v| is_set(v)) {
        lines.push(format!("Negative Prompt: {}", display_value(negative)));
    }
    if let Some(seed) = input.get("seed").filter(|v| is_set(v)) {
        lines.push(format!("Seed: {}", display_value(seed)));
    }

    lines
}

fn is_set(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn display_default(param: &DefaultParam) -> String {
    display_value(&param.to_value())
}
