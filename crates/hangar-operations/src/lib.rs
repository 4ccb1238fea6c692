pub mod context;
pub mod files;
pub mod path;
pub mod status;
pub mod types;

pub mod v1;
pub mod v2;

pub use context::RegistryContext;
pub use path::ReferencePath;
pub use status::ProtocolStatus;
pub use types::*;

#[cfg(test)]
mod test_utils;
