//! HAR files on disk as a capture source

use netlens_core::{HarSource, LoadError};
use serde_json::Value;
use std::path::PathBuf;

/// A HAR export read fresh from disk on every fetch
#[derive(Debug, Clone)]
pub struct HarFile {
    path: PathBuf,
}

impl HarFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl HarSource for HarFile {
    async fn fetch_har(&self) -> Result<Value, LoadError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| LoadError::Unavailable(format!("{}: {}", self.path.display(), e)))?;

        serde_json::from_str(&content).map_err(|e| {
            tracing::debug!("HAR parse error: {}", e);
            LoadError::MalformedDocument
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netlens_core::HistoricalLoader;

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.har");
        std::fs::write(
            &path,
            r#"{"log":{"entries":[{"_requestId":"1","request":{"method":"POST","url":"https://x.test/a"},"response":{"status":201}}]}}"#,
        )
        .unwrap();

        let result = HistoricalLoader::new(HarFile::new(&path)).load().await;
        assert!(result.is_ok());
        assert_eq!(result.calls[0].method, "POST");
    }

    #[tokio::test]
    async fn test_missing_and_invalid_files() {
        let dir = tempfile::tempdir().unwrap();

        let missing = HistoricalLoader::new(HarFile::new(dir.path().join("nope.har"))).load().await;
        assert!(missing.errors[0].starts_with("Capture source unavailable"));

        let path = dir.path().join("bad.har");
        std::fs::write(&path, "not json").unwrap();
        let invalid = HistoricalLoader::new(HarFile::new(&path)).load().await;
        assert_eq!(invalid.errors, vec!["Invalid HAR data received from capture source".to_string()]);
    }
}
