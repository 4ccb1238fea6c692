use std::{
    fs,
    path::{Path, PathBuf},
    sync::{LazyLock, RwLock},
};

use documented::{Documented, DocumentedFields};
use hangar_utils::path::{resolve_path, xdg_config_home, xdg_data_home};
use serde::{Deserialize, Serialize};
use toml_edit::DocumentMut;
use tracing::info;

use crate::{
    annotations::annotate_toml_table,
    error::{ConfigError, Result},
};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api/conan";
pub const DEFAULT_OWNER: i64 = 1;
pub const DEFAULT_SEARCH_LIMIT: usize = 100;

/// Registry configuration
#[derive(Clone, Debug, Deserialize, Serialize, Documented, DocumentedFields)]
pub struct Config {
    /// Root directory holding the registry database and blob storage.
    /// Default: $HANGAR_ROOT or $XDG_DATA_HOME/hangar
    pub root_path: String,

    /// Path to the registry database file.
    /// Default: $HANGAR_ROOT/registry.db
    pub db_path: Option<String>,

    /// Directory where uploaded file contents are stored by hash.
    /// Default: $HANGAR_ROOT/blobs
    pub storage_path: Option<String>,

    /// Public base URL of the Conan API, used to build download and upload URLs.
    /// Default: "http://localhost:8080/api/conan"
    pub base_url: Option<String>,

    /// Owner id used when a command does not name one.
    /// Default: 1
    pub default_owner: Option<i64>,

    /// Maximum number of recipes returned by a search.
    /// Default: 100
    pub search_limit: Option<usize>,

    /// Replace an existing file when the same file is uploaded again for a reference.
    /// Default: true
    pub allow_overwrite: Option<bool>,
}

pub static CONFIG: LazyLock<RwLock<Option<Config>>> = LazyLock::new(|| RwLock::new(None));

pub static CONFIG_PATH: LazyLock<RwLock<PathBuf>> = LazyLock::new(|| {
    RwLock::new(match std::env::var("HANGAR_CONFIG") {
        Ok(path_str) => PathBuf::from(path_str),
        Err(_) => xdg_config_home().join("hangar").join("config.toml"),
    })
});

fn config_path() -> PathBuf {
    CONFIG_PATH
        .read()
        .map(|path| path.to_path_buf())
        .unwrap_or_else(|poisoned| poisoned.into_inner().to_path_buf())
}

/// Loads the configuration file into the process-wide slot.
pub fn init() -> Result<()> {
    let config = Config::new()?;
    let mut global_config = CONFIG.write().unwrap_or_else(|e| e.into_inner());
    *global_config = Some(config);
    Ok(())
}

/// Returns the loaded configuration, falling back to defaults if `init` was never called.
pub fn get_config() -> Config {
    {
        let config_guard = CONFIG.read().unwrap_or_else(|e| e.into_inner());
        if let Some(config) = config_guard.as_ref() {
            return config.clone();
        }
    }

    let mut config_guard = CONFIG.write().unwrap_or_else(|e| e.into_inner());
    config_guard.get_or_insert_with(Config::default_config).clone()
}

impl Config {
    pub fn default_config() -> Self {
        let hangar_root = std::env::var("HANGAR_ROOT")
            .unwrap_or_else(|_| format!("{}/hangar", xdg_data_home().display()));

        Self {
            db_path: Some(format!("{hangar_root}/registry.db")),
            storage_path: Some(format!("{hangar_root}/blobs")),
            root_path: hangar_root,
            base_url: Some(DEFAULT_BASE_URL.to_string()),
            default_owner: Some(DEFAULT_OWNER),
            search_limit: Some(DEFAULT_SEARCH_LIMIT),
            allow_overwrite: Some(true),
        }
    }

    /// Creates a new configuration by loading it from the configuration file.
    /// If the configuration file is not found, it uses the default configuration.
    pub fn new() -> Result<Self> {
        Self::from_file(config_path())
    }

    /// Loads a configuration from `path`, using defaults when the file does not exist.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = match fs::read_to_string(path.as_ref()) {
            Ok(content) => toml::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default_config(),
            Err(err) => return Err(ConfigError::IoError(err)),
        };

        config.resolve()?;

        Ok(config)
    }

    /// Fills unset optional fields with defaults and validates the result.
    pub fn resolve(&mut self) -> Result<()> {
        let base_url = self
            .base_url
            .get_or_insert_with(|| DEFAULT_BASE_URL.to_string());
        if base_url.trim().is_empty() {
            return Err(ConfigError::EmptyBaseUrl);
        }

        let owner = *self.default_owner.get_or_insert(DEFAULT_OWNER);
        if owner <= 0 {
            return Err(ConfigError::InvalidOwner(owner));
        }

        if *self.search_limit.get_or_insert(DEFAULT_SEARCH_LIMIT) == 0 {
            return Err(ConfigError::InvalidSearchLimit);
        }

        self.allow_overwrite.get_or_insert(true);

        Ok(())
    }

    pub fn get_root_path(&self) -> Result<PathBuf> {
        if let Ok(env_path) = std::env::var("HANGAR_ROOT") {
            return Ok(resolve_path(&env_path)?);
        }
        Ok(resolve_path(&self.root_path)?)
    }

    pub fn get_db_path(&self) -> Result<PathBuf> {
        if let Ok(env_path) = std::env::var("HANGAR_DB") {
            return Ok(resolve_path(&env_path)?);
        }
        if let Some(db_path) = &self.db_path {
            return Ok(resolve_path(db_path)?);
        }
        Ok(self.get_root_path()?.join("registry.db"))
    }

    pub fn get_storage_path(&self) -> Result<PathBuf> {
        if let Ok(env_path) = std::env::var("HANGAR_STORAGE") {
            return Ok(resolve_path(&env_path)?);
        }
        if let Some(storage_path) = &self.storage_path {
            return Ok(resolve_path(storage_path)?);
        }
        Ok(self.get_root_path()?.join("blobs"))
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> String {
        let base_url = std::env::var("HANGAR_BASE_URL")
            .ok()
            .or_else(|| self.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        base_url.trim_end_matches('/').to_string()
    }

    pub fn default_owner(&self) -> i64 {
        self.default_owner.unwrap_or(DEFAULT_OWNER)
    }

    pub fn search_limit(&self) -> usize {
        self.search_limit.unwrap_or(DEFAULT_SEARCH_LIMIT)
    }

    pub fn allow_overwrite(&self) -> bool {
        self.allow_overwrite.unwrap_or(true)
    }

    pub fn to_annotated_document(&self) -> Result<DocumentMut> {
        let toml_string = toml::to_string_pretty(self)?;
        let mut doc = toml_string.parse::<DocumentMut>()?;

        annotate_toml_table::<Config>(doc.as_table_mut(), true)?;

        Ok(doc)
    }
}

/// Writes the default configuration with field docs to the configuration path.
pub fn generate_default_config() -> Result<PathBuf> {
    let config_path = config_path();

    if config_path.exists() {
        return Err(ConfigError::ConfigAlreadyExists);
    }

    let annotated_doc = Config::default_config().to_annotated_document()?;

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(&config_path, annotated_doc.to_string())?;
    info!(
        "Default configuration file generated with documentation at: {}",
        config_path.display()
    );
    Ok(config_path)
}

#[cfg(test)]
mod tests {
    use serial_test::serial;
    use tempfile::tempdir;

    use super::*;
    use crate::test_utils::with_env;

    #[test]
    #[serial]
    fn test_default_config_creation() {
        with_env(vec![("HANGAR_ROOT", "/srv/hangar")], || {
            let config = Config::default_config();

            assert_eq!(config.root_path, "/srv/hangar");
            assert_eq!(config.db_path.as_deref(), Some("/srv/hangar/registry.db"));
            assert_eq!(config.storage_path.as_deref(), Some("/srv/hangar/blobs"));
            assert_eq!(config.search_limit, Some(100));
            assert_eq!(config.default_owner, Some(1));
            assert!(config.allow_overwrite());
        });
    }

    #[test]
    fn test_resolve_sets_defaults() {
        let mut config = Config::default_config();
        config.base_url = None;
        config.search_limit = None;
        config.allow_overwrite = None;
        config.default_owner = None;

        config.resolve().unwrap();

        assert_eq!(config.base_url.as_deref(), Some(DEFAULT_BASE_URL));
        assert_eq!(config.search_limit, Some(100));
        assert_eq!(config.allow_overwrite, Some(true));
        assert_eq!(config.default_owner, Some(1));
    }

    #[test]
    fn test_resolve_rejects_invalid_values() {
        let mut config = Config::default_config();
        config.base_url = Some("  ".into());
        assert!(matches!(config.resolve(), Err(ConfigError::EmptyBaseUrl)));

        let mut config = Config::default_config();
        config.default_owner = Some(0);
        assert!(matches!(
            config.resolve(),
            Err(ConfigError::InvalidOwner(0))
        ));

        let mut config = Config::default_config();
        config.search_limit = Some(0);
        assert!(matches!(
            config.resolve(),
            Err(ConfigError::InvalidSearchLimit)
        ));
    }

    #[test]
    #[serial]
    fn test_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "root_path = \"/data/hangar\"\nbase_url = \"https://pkg.example.com/conan/\"\nsearch_limit = 5\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.root_path, "/data/hangar");
        assert_eq!(config.search_limit(), 5);
        assert_eq!(config.base_url(), "https://pkg.example.com/conan");
        assert!(config.allow_overwrite());
        assert_eq!(
            config.get_storage_path().unwrap(),
            PathBuf::from("/data/hangar/blobs")
        );
    }

    #[test]
    fn test_from_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::from_file(dir.path().join("missing.toml")).unwrap();
        assert_eq!(config.search_limit(), DEFAULT_SEARCH_LIMIT);
    }

    #[test]
    fn test_from_invalid_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "root_path = [").unwrap();

        assert!(matches!(
            Config::from_file(&path),
            Err(ConfigError::TomlDeError(_))
        ));
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        with_env(
            vec![
                ("HANGAR_DB", "/custom/registry.db"),
                ("HANGAR_STORAGE", "/custom/blobs"),
                ("HANGAR_BASE_URL", "https://example.com/conan/"),
            ],
            || {
                let config = Config::default_config();
                assert_eq!(
                    config.get_db_path().unwrap(),
                    PathBuf::from("/custom/registry.db")
                );
                assert_eq!(
                    config.get_storage_path().unwrap(),
                    PathBuf::from("/custom/blobs")
                );
                assert_eq!(config.base_url(), "https://example.com/conan");
            },
        );
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default_config();
        let serialized = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(deserialized.root_path, config.root_path);
        assert_eq!(deserialized.base_url, config.base_url);
    }
}
