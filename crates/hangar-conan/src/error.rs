use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum ConanError {
    #[error("Invalid name: {0}")]
    #[diagnostic(
        code(hangar_conan::invalid_name),
        help("Names are 2-51 characters of [A-Za-z0-9_+.-] and must not start with + . or -")
    )]
    InvalidName(String),

    #[error("Invalid version: {0}")]
    #[diagnostic(
        code(hangar_conan::invalid_version),
        help("Use a semantic version such as 1.2.3")
    )]
    InvalidVersion(String),

    #[error("User and channel must both be set or both be empty")]
    #[diagnostic(
        code(hangar_conan::incomplete_user_channel),
        help("Use '_' for both user and channel to omit them")
    )]
    IncompleteUserChannel,

    #[error("Invalid revision: {0}")]
    #[diagnostic(
        code(hangar_conan::invalid_revision),
        help("Revisions are 1-51 alphanumeric characters")
    )]
    InvalidRevision(String),

    #[error("Invalid package reference: {0}")]
    #[diagnostic(
        code(hangar_conan::invalid_package_reference),
        help("Package references are 1-51 alphanumeric characters")
    )]
    InvalidPackageReference(String),

    #[error("Invalid reference format: {0}")]
    #[diagnostic(
        code(hangar_conan::invalid_reference),
        help("Use name/version[@user/channel][#revision], optionally followed by :package_id[#revision]")
    )]
    InvalidReference(String),

    #[error("Invalid conaninfo: {0}")]
    #[diagnostic(code(hangar_conan::invalid_conaninfo))]
    InvalidConaninfo(String),

    #[error("Failed to read metadata: {0}")]
    #[diagnostic(code(hangar_conan::read))]
    Read(String),
}

pub type Result<T> = std::result::Result<T, ConanError>;
