//! Repository pattern implementations for database operations.

pub mod blob;
pub mod file;
pub mod package;
pub mod property;
pub mod version;

pub use blob::BlobRepository;
pub use file::{FileRepository, FileSearchOptions, LeadFileSearch};
pub use package::PackageRepository;
pub use property::PropertyRepository;
pub use version::VersionRepository;
