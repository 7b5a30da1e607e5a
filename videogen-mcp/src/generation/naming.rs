//! Artifact file naming and collision-free local writes.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::warn;
use videogen_mcp_common::error::Error;
use videogen_mcp_common::storage::timestamp_slug;

/// Characters of the prompt kept in a file name.
const PROMPT_SLUG_CHARS: usize = 50;

/// Highest numeric suffix tried before giving up on a name.
const MAX_COLLISION_SUFFIX: u32 = 10_000;

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "webm", "mkv", "gif"];

/// First 50 characters of the prompt with every non-ASCII-alphanumeric
/// character replaced by `_`.
pub fn sanitize_prompt(prompt: &str) -> String {
    prompt
        .chars()
        .take(PROMPT_SLUG_CHARS)
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Extension of the artifact URL's path when it is a known video type,
/// otherwise `mp4`.
pub fn video_extension(url: &str) -> &'static str {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let file = path.rsplit('/').next().unwrap_or_default();
    file.rsplit_once('.')
        .and_then(|(_, ext)| {
            VIDEO_EXTENSIONS
                .iter()
                .find(|known| known.eq_ignore_ascii_case(ext))
                .copied()
        })
        .unwrap_or("mp4")
}

/// `{model}_{sanitized prompt}_{timestamp}.{ext}`
pub fn artifact_file_name(model_id: &str, prompt: &str, now: DateTime<Utc>, ext: &str) -> String {
    format!(
        "{}_{}_{}.{}",
        model_id,
        sanitize_prompt(prompt),
        timestamp_slug(now),
        ext
    )
}

fn suffixed(name: &str, n: u32) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) => format!("{}_{}.{}", stem, n, ext),
        None => format!("{}_{}", name, n),
    }
}

/// Write `bytes` to `dir/name`, creating `dir` if needed.
///
/// The file is created exclusively. If `name` is taken, `_1`, `_2`, ... are
/// appended to the stem until a free name is found, so concurrent writers
/// never overwrite each other.
///
/// # Errors
/// Returns `Error::LocalWriteFailed` naming the path that could not be written.
pub async fn write_artifact(dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf, Error> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| Error::local_write_failed(dir, e))?;

    let mut candidate = dir.join(name);
    for n in 1..=MAX_COLLISION_SUFFIX {
        match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
            .await
        {
            Ok(file) => {
                fill_or_remove(&candidate, file, bytes).await?;
                return Ok(candidate);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                candidate = dir.join(suffixed(name, n));
            }
            Err(e) => return Err(Error::local_write_failed(&candidate, e)),
        }
    }

    Err(Error::local_write_failed(
        candidate,
        std::io::Error::new(ErrorKind::AlreadyExists, "no free file name"),
    ))
}

/// Write `bytes` into the freshly created file at `path`. A partial file is
/// removed so the name is not left taken.
async fn fill_or_remove<W>(path: &Path, mut file: W, bytes: &[u8]) -> Result<(), Error>
where
    W: AsyncWrite + Unpin,
{
    let written = match file.write_all(bytes).await {
        Ok(()) => file.flush().await,
        Err(e) => Err(e),
    };
    drop(file);

    if let Err(e) = written {
        if let Err(cleanup) = tokio::fs::remove_file(path).await {
            warn!(path = %path.display(), error = %cleanup, "Failed to remove partial artifact");
        }
        return Err(Error::local_write_failed(path, e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 10, 30, 45).unwrap()
    }

    #[test]
    fn test_sanitize_prompt() {
        assert_eq!(sanitize_prompt("A cat, on a mat!"), "A_cat__on_a_mat_");
        assert_eq!(sanitize_prompt("café"), "caf_");
        assert_eq!(sanitize_prompt(&"x".repeat(80)).len(), 50);
    }

    #[test]
    fn test_artifact_file_name() {
        let name = artifact_file_name("veo-3", "a dog surfing", fixed_time(), "mp4");
        assert_eq!(name, "veo-3_a_dog_surfing_2025-01-15T10-30-45-000Z.mp4");
    }

    #[test]
    fn test_video_extension() {
        assert_eq!(video_extension("https://cdn.example/out/abc.mp4"), "mp4");
        assert_eq!(video_extension("https://cdn.example/abc.WEBM?sig=1"), "webm");
        assert_eq!(video_extension("https://cdn.example/abc"), "mp4");
        assert_eq!(video_extension("https://cdn.example/abc.png"), "mp4");
    }

    #[test]
    fn test_suffixed() {
        assert_eq!(suffixed("a.mp4", 1), "a_1.mp4");
        assert_eq!(suffixed("noext", 2), "noext_2");
    }

    #[tokio::test]
    async fn test_write_artifact_creates_directory() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("nested").join("videos");
        let path = write_artifact(&dir, "clip.mp4", b"data").await.unwrap();
        assert_eq!(path, dir.join("clip.mp4"));
        assert_eq!(std::fs::read(&path).unwrap(), b"data");
    }

    #[tokio::test]
    async fn test_write_artifact_never_overwrites() {
        let tmp = TempDir::new().unwrap();
        let first = write_artifact(tmp.path(), "clip.mp4", b"one").await.unwrap();
        let second = write_artifact(tmp.path(), "clip.mp4", b"two").await.unwrap();
        assert_ne!(first, second);
        assert_eq!(second, tmp.path().join("clip_1.mp4"));
        assert_eq!(std::fs::read(&first).unwrap(), b"one");
        assert_eq!(std::fs::read(&second).unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_concurrent_writes_get_distinct_files() {
        let tmp = TempDir::new().unwrap();
        let writes = (0..8u8).map(|i| {
            let dir = tmp.path().to_path_buf();
            async move { write_artifact(&dir, "same.mp4", &[i]).await }
        });
        let paths: Vec<PathBuf> = futures::future::join_all(writes)
            .await
            .into_iter()
            .collect::<Result<_, _>>()
            .unwrap();

        let unique: std::collections::HashSet<_> = paths.iter().collect();
        assert_eq!(unique.len(), 8);
        let mut contents: Vec<u8> = paths
            .iter()
            .map(|p| std::fs::read(p).unwrap()[0])
            .collect();
        contents.sort_unstable();
        assert_eq!(contents, (0..8).collect::<Vec<u8>>());
    }

    /// Writer that fails every write, like a full disk.
    struct FullDisk;

    impl AsyncWrite for FullDisk {
        fn poll_write(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
            _buf: &[u8],
        ) -> std::task::Poll<std::io::Result<usize>> {
            std::task::Poll::Ready(Err(std::io::Error::new(ErrorKind::Other, "no space left on device")))
        }

        fn poll_flush(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Ok(()))
        }

        fn poll_shutdown(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_failed_write_removes_partial_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("clip.mp4");
        std::fs::write(&path, b"").unwrap();

        let err = fill_or_remove(&path, FullDisk, b"video-bytes").await.unwrap_err();
        assert!(matches!(err, Error::LocalWriteFailed { path: ref p, .. } if p == &path));
        assert!(!path.exists());

        // The name is free again.
        let written = write_artifact(tmp.path(), "clip.mp4", b"data").await.unwrap();
        assert_eq!(written, path);
    }

    #[tokio::test]
    async fn test_successful_fill_keeps_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("clip.mp4");
        let file = tokio::fs::File::create(&path).await.unwrap();
        fill_or_remove(&path, file, b"data").await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"data");
    }

    #[tokio::test]
    async fn test_write_into_file_path_fails_with_path() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();

        let err = write_artifact(&blocker.join("sub"), "clip.mp4", b"data")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::LocalWriteFailed { .. }));
    }
}
