//! Storage layer of the hangar registry.
//!
//! A generic package store: packages own versions, versions own files, files point at
//! content-addressed blobs, and any row can carry free-form properties. Nothing here knows
//! about Conan; the hierarchy of references and revisions is rebuilt from properties by
//! `hangar-core`.

pub mod connection;
pub mod error;
pub mod migration;
pub mod models;
pub mod repository;
pub mod schema;
