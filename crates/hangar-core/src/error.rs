//! Error types for hangar-core.

use hangar_conan::ConanError;
use hangar_config::error::ConfigError;
use hangar_db::error::DbError;
use hangar_utils::error::{FileSystemError, HashError, PathError};
use miette::Diagnostic;
use thiserror::Error;

/// Core error type for registry operations.
#[derive(Error, Diagnostic, Debug)]
pub enum RegistryError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Database(#[from] DbError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Conan(#[from] ConanError),

    #[error("Recipe reference does not exist: {0}")]
    #[diagnostic(
        code(hangar::recipe_not_found),
        help("List the recipe revisions to see what has been uploaded")
    )]
    RecipeReferenceNotExist(String),

    #[error("Package reference does not exist: {0}")]
    #[diagnostic(
        code(hangar::package_reference_not_found),
        help("List the package references of the recipe revision")
    )]
    PackageReferenceNotExist(String),

    #[error("Package does not exist: {0}")]
    #[diagnostic(code(hangar::package_not_found))]
    PackageNotExist(String),

    #[error("Package file does not exist: {0}")]
    #[diagnostic(code(hangar::file_not_found))]
    PackageFileNotExist(String),

    #[error("File '{0}' is not accepted for this reference")]
    #[diagnostic(
        code(hangar::invalid_filename),
        help("Recipes accept conanfile.py, conanmanifest.txt, conan_sources.tgz and conan_export.tgz; packages accept conaninfo.txt, conanmanifest.txt and conan_package.tgz")
    )]
    InvalidFilename(String),

    #[error("File '{0}' already exists for this reference")]
    #[diagnostic(
        code(hangar::duplicate_file),
        help("Enable overwriting or upload under a new revision")
    )]
    DuplicatePackageFile(String),

    #[error("Error while {action}")]
    #[diagnostic(code(hangar::io), help("Check file permissions and disk space"))]
    IoError {
        action: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    #[diagnostic(code(hangar::fs))]
    FileSystem(#[from] FileSystemError),

    #[error(transparent)]
    #[diagnostic(code(hangar::hash))]
    Hash(#[from] HashError),

    #[error(transparent)]
    #[diagnostic(code(hangar::path))]
    Path(#[from] PathError),

    #[error(transparent)]
    #[diagnostic(code(hangar::serialization))]
    Serialization(#[from] serde_json::Error),

    #[error("Thread lock poison error")]
    #[diagnostic(
        code(hangar::poison),
        help("This is an internal error, please report it")
    )]
    PoisonError,

    #[error("{0}")]
    #[diagnostic(code(hangar::error))]
    Custom(String),
}

impl RegistryError {
    /// True for every "nothing matched" condition.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::RecipeReferenceNotExist(_)
                | Self::PackageReferenceNotExist(_)
                | Self::PackageNotExist(_)
                | Self::PackageFileNotExist(_)
                | Self::Database(DbError::NotFound(_))
        )
    }

    /// True for malformed input rejected before touching the store.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Conan(_) | Self::InvalidFilename(_))
    }
}

impl From<diesel::result::Error> for RegistryError {
    fn from(err: diesel::result::Error) -> Self {
        Self::Database(DbError::from(err))
    }
}

impl<T> From<std::sync::PoisonError<T>> for RegistryError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        Self::PoisonError
    }
}

/// Trait for adding context to IO errors.
pub trait ErrorContext<T> {
    fn with_context<C>(self, context: C) -> std::result::Result<T, RegistryError>
    where
        C: FnOnce() -> String;
}

impl<T> ErrorContext<T> for std::io::Result<T> {
    fn with_context<C>(self, context: C) -> std::result::Result<T, RegistryError>
    where
        C: FnOnce() -> String,
    {
        self.map_err(|err| {
            RegistryError::IoError {
                action: context(),
                source: err,
            }
        })
    }
}
