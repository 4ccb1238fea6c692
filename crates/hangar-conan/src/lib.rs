//! Conan coordinates and metadata.
//!
//! This crate holds everything about the Conan protocol that does not touch storage:
//! recipe and package references, the property names used to tag stored files, the
//! allowed file lists and the parsers for `conanfile.py` and `conaninfo.txt`.

pub mod conanfile;
pub mod conaninfo;
pub mod constants;
pub mod error;
pub mod query;
pub mod reference;

pub use conanfile::Metadata;
pub use conaninfo::Conaninfo;
pub use error::{ConanError, Result};
pub use query::RecipeSearchQuery;
pub use reference::{PackageReference, RecipeReference};
