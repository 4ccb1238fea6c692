use hangar_utils::error::{FileSystemError, PathError, UtilsError};
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("TOML serialization error: {0}")]
    #[diagnostic(
        code(hangar_config::toml_serialize),
        help("Check your configuration structure for invalid values")
    )]
    TomlSerError(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    #[diagnostic(
        code(hangar_config::toml_deserialize),
        help("Check your config.toml syntax and structure")
    )]
    TomlDeError(#[from] toml::de::Error),

    #[error("Configuration file already exists")]
    #[diagnostic(
        code(hangar_config::already_exists),
        help("Remove the existing config file or use a different location")
    )]
    ConfigAlreadyExists,

    #[error("Base URL cannot be empty")]
    #[diagnostic(
        code(hangar_config::invalid_base_url),
        help("Set base_url to the public address of the registry")
    )]
    EmptyBaseUrl,

    #[error("Invalid owner id: {0}")]
    #[diagnostic(
        code(hangar_config::invalid_owner),
        help("default_owner must be a positive integer")
    )]
    InvalidOwner(i64),

    #[error("Search limit must be greater than zero")]
    #[diagnostic(code(hangar_config::invalid_search_limit))]
    InvalidSearchLimit,

    #[error("IO error: {0}")]
    #[diagnostic(code(hangar_config::io))]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    #[diagnostic(code(hangar_config::utils))]
    Utils(#[from] UtilsError),

    #[error("Failed to parse TOML: {0}")]
    #[diagnostic(code(hangar_config::toml))]
    Toml(#[from] toml_edit::TomlError),

    #[error("Encountered unexpected TOML item: {0}")]
    #[diagnostic(code(hangar_config::unexpected_toml_item))]
    UnexpectedTomlItem(String),
}

impl From<PathError> for ConfigError {
    fn from(err: PathError) -> Self {
        Self::Utils(UtilsError::Path(err))
    }
}

impl From<FileSystemError> for ConfigError {
    fn from(err: FileSystemError) -> Self {
        Self::Utils(UtilsError::FileSystem(err))
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
