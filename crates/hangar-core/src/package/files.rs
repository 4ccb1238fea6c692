//! Lookup of the files stored under a reference.

use diesel::SqliteConnection;
use hangar_conan::RecipeReference;
use hangar_db::{
    models::{
        registry::{PackageBlob, PackageFile, PackageVersion},
        types::PackageType,
    },
    repository::{BlobRepository, FileRepository, FileSearchOptions, VersionRepository},
};

use crate::{
    database::connection::RegistryDatabase, error::RegistryError, storage::BlobStore,
    RegistryResult,
};

/// Resolves the package version of a recipe.
///
/// # Errors
///
/// [`RegistryError::PackageNotExist`] if the owner has no such name and version.
pub fn find_version(
    conn: &mut SqliteConnection,
    owner_id: i64,
    rref: &RecipeReference,
) -> RegistryResult<PackageVersion> {
    VersionRepository::find_by_name_and_version(
        conn,
        owner_id,
        PackageType::Conan,
        rref.name(),
        rref.version(),
    )?
    .ok_or_else(|| {
        RegistryError::PackageNotExist(format!("{}/{}", rref.name(), rref.version()))
    })
}

/// Lists the files tagged with `composite_key` together with their blobs, ordered by id.
///
/// # Errors
///
/// * [`RegistryError::PackageNotExist`] if the package version does not exist.
/// * [`RegistryError::PackageFileNotExist`] if no file carries the key.
pub fn reference_files(
    conn: &mut SqliteConnection,
    owner_id: i64,
    rref: &RecipeReference,
    composite_key: &str,
) -> RegistryResult<Vec<(PackageFile, PackageBlob)>> {
    let version = find_version(conn, owner_id, rref)?;

    let files = FileRepository::search(
        conn,
        &FileSearchOptions {
            version_id: Some(version.id),
            composite_key: Some(composite_key),
            ..Default::default()
        },
    )?;
    if files.is_empty() {
        return Err(RegistryError::PackageFileNotExist(composite_key.to_string()));
    }

    files
        .into_iter()
        .map(|file| {
            let blob = BlobRepository::find_by_id(conn, file.blob_id)?.ok_or_else(|| {
                RegistryError::Custom(format!("blob {} of file {} is missing", file.blob_id, file.id))
            })?;
            Ok((file, blob))
        })
        .collect()
}

/// A stored file with its content.
#[derive(Debug, Clone)]
pub struct FileContent {
    pub file: PackageFile,
    pub blob: PackageBlob,
    pub data: Vec<u8>,
}

/// Reads one file of a reference.
///
/// # Errors
///
/// * [`RegistryError::PackageNotExist`] if the package version does not exist.
/// * [`RegistryError::PackageFileNotExist`] if the file is not stored under the key.
pub fn read_file(
    db: &RegistryDatabase,
    blobs: &BlobStore,
    owner_id: i64,
    rref: &RecipeReference,
    composite_key: &str,
    filename: &str,
) -> RegistryResult<FileContent> {
    let (file, blob) = db.with_conn(|conn| {
        let version = find_version(conn, owner_id, rref)?;
        let file = FileRepository::find(conn, version.id, filename, composite_key)?
            .ok_or_else(|| RegistryError::PackageFileNotExist(filename.to_string()))?;
        let blob = BlobRepository::find_by_id(conn, file.blob_id)?
            .ok_or_else(|| RegistryError::PackageFileNotExist(filename.to_string()))?;
        Ok((file, blob))
    })?;

    let data = blobs.read(&blob.hash_blake3)?;
    Ok(FileContent {
        file,
        blob,
        data,
    })
}
