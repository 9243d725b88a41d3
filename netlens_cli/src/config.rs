//! CLI configuration management

use anyhow::{Context, Result};
use netlens_core::history::{LoaderConfig, DEFAULT_CHUNK_SIZE, DEFAULT_YIELD_AFTER_CHUNKS};
use netlens_core::locate::MAX_DEPTH;
use netlens_core::prefs::BlobStore;
use netlens_core::{PersistError, Preferences};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Get the configuration directory path
pub fn config_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("netlens")
    }

    #[cfg(not(target_os = "windows"))]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".netlens")
    }
}

/// Get the config file path
pub fn config_file() -> PathBuf {
    config_dir().join("config.yml")
}

/// Ensure all config directories exist
pub fn ensure_dirs() -> Result<()> {
    fs::create_dir_all(config_dir()).context("Failed to create config directory")?;
    Ok(())
}

/// Main configuration file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HAR entries normalized per chunk
    pub chunk_size: usize,

    /// Chunk count above which loading yields between chunks
    pub yield_after_chunks: usize,

    /// Match case when highlighting search results
    pub case_sensitive: bool,

    /// Depth cap for the structured body walk
    pub max_depth: usize,

    /// Maximum rows printed by `list`
    pub list_limit: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            yield_after_chunks: DEFAULT_YIELD_AFTER_CHUNKS,
            case_sensitive: false,
            max_depth: MAX_DEPTH,
            list_limit: None,
        }
    }
}

impl Config {
    /// Load config from file
    pub fn load() -> Result<Self> {
        Self::load_from(&config_file())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        Ok(config)
    }

    pub fn loader(&self) -> LoaderConfig {
        LoaderConfig {
            chunk_size: self.chunk_size,
            yield_after_chunks: self.yield_after_chunks,
        }
    }
}

/// Blob store keeping one `<name>.json` file per blob
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }
}

impl Default for FileBlobStore {
    fn default() -> Self {
        Self::new(config_dir())
    }
}

impl BlobStore for FileBlobStore {
    fn load(&self, name: &str) -> Result<Option<String>, PersistError> {
        let path = self.path(name);
        if !path.exists() {
            return Ok(None);
        }

        fs::read_to_string(&path)
            .map(Some)
            .map_err(|e| PersistError::Backend(format!("{}: {}", path.display(), e)))
    }

    fn save(&self, name: &str, blob: &str) -> Result<(), PersistError> {
        fs::create_dir_all(&self.dir).map_err(|e| PersistError::Backend(e.to_string()))?;
        let path = self.path(name);
        fs::write(&path, blob).map_err(|e| PersistError::Backend(format!("{}: {}", path.display(), e)))
    }

    fn remove(&self, name: &str) -> Result<(), PersistError> {
        let path = self.path(name);
        if path.exists() {
            fs::remove_file(&path).map_err(|e| PersistError::Backend(format!("{}: {}", path.display(), e)))?;
        }
        Ok(())
    }
}

/// Load saved preferences from the config directory
pub fn load_preferences() -> Preferences {
    Preferences::load(&FileBlobStore::default())
}

/// Save preferences to the config directory
pub fn save_preferences(prefs: &Preferences) -> Result<()> {
    prefs
        .save(&FileBlobStore::default())
        .context("Failed to save preferences")
}

#[cfg(test)]
mod tests {
    use super::*;
    use netlens_core::prefs::{FILTERS_KEY, SEARCH_CONFIG_KEY};
    use netlens_core::FilterRule;

    #[test]
    fn test_missing_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.yml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.loader(), LoaderConfig::default());
    }

    #[test]
    fn test_partial_yaml_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        fs::write(&path, "chunk_size: 10\ncase_sensitive: true\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.chunk_size, 10);
        assert!(config.case_sensitive);
        assert_eq!(config.max_depth, MAX_DEPTH);
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        fs::write(&path, "chunk_size: [").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_file_blob_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileBlobStore::new(dir.path().join("prefs"));

        assert_eq!(store.load(FILTERS_KEY).unwrap(), None);

        let mut prefs = Preferences::default();
        prefs.filters.add(FilterRule::new("errors").with_errors());
        prefs.search.query = "token".to_string();
        prefs.save(&store).unwrap();

        assert!(dir.path().join("prefs").join("netlens-filters.json").exists());
        assert_eq!(Preferences::load(&store), prefs);

        store.remove(SEARCH_CONFIG_KEY).unwrap();
        assert_eq!(Preferences::load(&store).search.query, "");
    }
}
