//! Integration tests for the videogen-mcp server.
//!
//! Media tests need `ffmpeg` and `ffprobe` on PATH and are skipped otherwise.
//! The generation test needs REPLICATE_API_TOKEN, spends provider credits and
//! is ignored by default:
//!
//! Run with: `cargo test --package videogen-mcp --test integration_test -- --include-ignored`
//! Skip in CI: `cargo test --package videogen-mcp --lib`

use std::env;
use std::path::{Path, PathBuf};
use std::sync::Once;

use serde_json::json;
use tempfile::TempDir;
use videogen_mcp::media::{GetContentParams, GetVideoMetadataParams, MediaHandler, ScaleVideoParams};
use videogen_mcp::{AggregateStatus, VideoGenHandler, VideoGenerateParams};
use videogen_mcp_common::config::Config;
use videogen_mcp_common::error::Error;

static INIT: Once = Once::new();

/// Initialize environment from .env file once
fn init_env() {
    INIT.call_once(|| {
        let _ = dotenvy::dotenv();
    });
}

fn ffmpeg_available() -> bool {
    ["ffmpeg", "ffprobe"].iter().all(|tool| {
        std::process::Command::new(tool)
            .arg("-version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    })
}

macro_rules! skip_if_no_ffmpeg {
    () => {
        if !ffmpeg_available() {
            eprintln!("Skipping media test: ffmpeg/ffprobe not found");
            return;
        }
    };
}

/// Render a short 320x240 test clip with a sine tone.
fn make_clip(dir: &Path) -> PathBuf {
    let clip = dir.join("clip.mp4");
    let status = std::process::Command::new("ffmpeg")
        .args([
            "-y",
            "-f",
            "lavfi",
            "-i",
            "testsrc=duration=2:size=320x240:rate=10",
            "-f",
            "lavfi",
            "-i",
            "sine=frequency=440:duration=2",
            "-shortest",
            "-pix_fmt",
            "yuv420p",
        ])
        .arg(&clip)
        .output()
        .expect("failed to run ffmpeg");
    assert!(status.status.success(), "ffmpeg could not render the test clip");
    clip
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[tokio::test]
async fn test_metadata_of_rendered_clip() {
    skip_if_no_ffmpeg!();
    let tmp = TempDir::new().unwrap();
    let clip = make_clip(tmp.path());

    let media = MediaHandler::new(&Config::default());
    let metadata = media
        .get_video_metadata(GetVideoMetadataParams {
            file_path: path_str(&clip),
        })
        .await
        .unwrap();

    assert_eq!((metadata.width, metadata.height), (320, 240));
    assert_eq!(metadata.aspect_ratio, "320:240");
    assert_eq!(metadata.orientation, "landscape");
    assert_eq!(metadata.video_stream_count, 1);
    assert!(metadata.audio.is_some());
    assert!((metadata.duration_seconds - 2.0).abs() < 0.5);
}

#[tokio::test]
async fn test_scale_then_extract_frames() {
    skip_if_no_ffmpeg!();
    let tmp = TempDir::new().unwrap();
    let clip = make_clip(tmp.path());
    let media = MediaHandler::new(&Config::default());

    let scaled = tmp.path().join("out").join("scaled.mp4");
    media
        .scale_video(ScaleVideoParams {
            input: path_str(&clip),
            width: 160,
            height: 120,
            output: path_str(&scaled),
            maintain_aspect: false,
        })
        .await
        .unwrap();
    assert!(scaled.exists());

    let frames_dir = tmp.path().join("frames");
    let frames = media
        .get_content(GetContentParams {
            input: path_str(&scaled),
            output_directory: path_str(&frames_dir),
            interval: 0.5,
            resolution: "160x120".to_string(),
        })
        .await
        .unwrap();
    assert!(frames.screenshots >= 3, "got {} screenshots", frames.screenshots);
}

#[tokio::test]
async fn test_image_model_without_image_is_rejected_before_submission() {
    let handler = VideoGenHandler::new(Config::default());
    let params: VideoGenerateParams =
        serde_json::from_value(json!({"model": "wan-i2v-480p", "prompt": "a dog running"})).unwrap();

    let err = handler.generate_video(&params).await.unwrap_err();
    assert!(matches!(err, Error::MissingImageInput(_)));
}

#[tokio::test]
#[ignore = "submits a paid prediction to Replicate"]
async fn test_generate_single_video() {
    init_env();
    if env::var("REPLICATE_API_TOKEN").is_err() {
        eprintln!("Skipping generation test: REPLICATE_API_TOKEN not set");
        return;
    }

    let tmp = TempDir::new().unwrap();
    let config = Config {
        save_dir: tmp.path().to_path_buf(),
        ..Config::from_env().unwrap()
    };
    let handler = VideoGenHandler::new(config);
    let params: VideoGenerateParams = serde_json::from_value(json!({
        "model": "ltx-video",
        "prompt": "A paper boat drifting on a calm lake at sunrise",
        "duration": 3,
    }))
    .unwrap();

    let result = handler.generate_video(&params).await.unwrap();
    println!("{}", result.render(true));
    assert_eq!(result.aggregate.status(), AggregateStatus::AllSuccessful);
    let saved = result.aggregate.outcomes[0].saved().unwrap();
    assert!(saved.path.exists());
}
