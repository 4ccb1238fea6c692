pub mod files;
pub mod remove;
pub mod revision;
pub mod search;
pub mod upload;
