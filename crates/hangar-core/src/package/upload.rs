use diesel::{Connection, SqliteConnection};
use hangar_conan::{
    conanfile, conaninfo,
    constants::{
        is_package_file, is_recipe_file, CONANFILE_FILE, CONANINFO_FILE, PROPERTY_PACKAGE_INFO,
        PROPERTY_PACKAGE_REFERENCE, PROPERTY_PACKAGE_REVISION, PROPERTY_RECIPE_CHANNEL,
        PROPERTY_RECIPE_REVISION, PROPERTY_RECIPE_USER,
    },
    PackageReference, RecipeReference,
};
use hangar_db::{
    models::{
        registry::NewPackageFile,
        types::{PackageType, PropertyType},
    },
    repository::{
        BlobRepository, FileRepository, PackageRepository, PropertyRepository, VersionRepository,
    },
};
use hangar_events::{EventSinkHandle, RegistryEvent};
use tracing::{debug, trace, warn};

use crate::{
    database::connection::RegistryDatabase,
    error::RegistryError,
    now_unix,
    storage::{BlobStore, StoredBlob},
    RegistryResult,
};

/// A file sent for a recipe, or for a binary package when `package` is set.
#[derive(Debug, Clone, Copy)]
pub struct UploadRequest<'a> {
    pub recipe: &'a RecipeReference,
    pub package: Option<&'a PackageReference>,
    pub filename: &'a str,
    pub content: &'a [u8],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Zero-length uploads are probes; the real content follows in a second request.
    Ignored,
    Stored(StoredFile),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub file_id: i32,
    pub name: String,
    pub composite_key: String,
    pub blob_hash: String,
    pub version_created: bool,
    pub replaced: bool,
}

/// Values computed from the upload before any write happens.
struct PreparedUpload {
    name: String,
    composite_key: String,
    is_lead: bool,
    metadata_json: Option<String>,
    properties: Vec<(&'static str, String)>,
}

struct Committed {
    stored: StoredFile,
    orphaned_blobs: Vec<String>,
}

/// Stores uploaded files and tags them with their reference properties.
pub struct PackageUploader {
    db: RegistryDatabase,
    blobs: BlobStore,
    events: EventSinkHandle,
    owner_id: i64,
    overwrite: bool,
}

impl PackageUploader {
    pub fn new(
        db: RegistryDatabase,
        blobs: BlobStore,
        events: EventSinkHandle,
        owner_id: i64,
        overwrite: bool,
    ) -> Self {
        Self {
            db,
            blobs,
            events,
            owner_id,
            overwrite,
        }
    }

    fn check_filename(request: &UploadRequest) -> RegistryResult<()> {
        let allowed = match request.package {
            Some(_) => is_package_file(request.filename),
            None => is_recipe_file(request.filename),
        };
        if !allowed {
            return Err(RegistryError::InvalidFilename(request.filename.to_string()));
        }
        Ok(())
    }

    fn prepare(request: &UploadRequest) -> RegistryResult<PreparedUpload> {
        let filename = request.filename;
        let rref = request.recipe;
        let mut properties = vec![
            (PROPERTY_RECIPE_USER, rref.user().to_string()),
            (PROPERTY_RECIPE_CHANNEL, rref.channel().to_string()),
            (PROPERTY_RECIPE_REVISION, rref.revision_or_default().to_string()),
        ];
        if let Some(pref) = request.package {
            properties.push((PROPERTY_PACKAGE_REFERENCE, pref.reference().to_string()));
            properties.push((PROPERTY_PACKAGE_REVISION, pref.revision_or_default().to_string()));
        }

        let is_lead = filename == CONANFILE_FILE;
        let mut metadata_json = None;
        if is_lead {
            let metadata = conanfile::parse(request.content)?;
            metadata_json = Some(serde_json::to_string(&metadata)?);
        } else if filename == CONANINFO_FILE {
            let info = conaninfo::parse(request.content)?;
            properties.push((PROPERTY_PACKAGE_INFO, serde_json::to_string(&info)?));
        }

        let composite_key = match request.package {
            Some(pref) => pref.as_key(),
            None => rref.as_key(),
        };

        Ok(PreparedUpload {
            name: filename.to_lowercase(),
            composite_key,
            is_lead,
            metadata_json,
            properties,
        })
    }

    /// Stores one file. Empty content is accepted and ignored.
    ///
    /// # Errors
    ///
    /// * [`RegistryError::InvalidFilename`] if the file is not part of a recipe or package.
    /// * [`RegistryError::DuplicatePackageFile`] if the file exists and overwriting is off.
    pub fn upload(&self, request: UploadRequest) -> RegistryResult<UploadOutcome> {
        Self::check_filename(&request)?;

        if request.content.is_empty() {
            debug!(
                "ignoring empty upload of {} for {}",
                request.filename, request.recipe
            );
            return Ok(UploadOutcome::Ignored);
        }

        let prepared = Self::prepare(&request)?;
        let rref = request.recipe;

        // Blob content is written and removed only while the connection is locked.
        let committed = self.db.with_conn(|conn| {
            let blob = self.blobs.write(request.content)?;

            match conn.transaction(|conn| self.store(conn, rref, &prepared, &blob)) {
                Ok(committed) => {
                    for hash in &committed.orphaned_blobs {
                        remove_unreferenced_content(conn, &self.blobs, hash);
                    }
                    Ok(committed)
                }
                Err(err) => {
                    if blob.created {
                        remove_unreferenced_content(conn, &self.blobs, &blob.hash);
                    }
                    Err(err)
                }
            }
        })?;

        let stored = committed.stored;
        if stored.version_created {
            self.events.emit(RegistryEvent::PackageCreated {
                owner_id: self.owner_id,
                name: rref.name().to_string(),
                version: rref.version().to_string(),
            });
        }
        self.events.emit(RegistryEvent::FileUploaded {
            owner_id: self.owner_id,
            name: rref.name().to_string(),
            version: rref.version().to_string(),
            file: stored.name.clone(),
            composite_key: stored.composite_key.clone(),
        });

        debug!(
            "stored {} under {} ({})",
            stored.name, rref, stored.composite_key
        );
        Ok(UploadOutcome::Stored(stored))
    }

    fn store(
        &self,
        conn: &mut SqliteConnection,
        rref: &RecipeReference,
        prepared: &PreparedUpload,
        content: &StoredBlob,
    ) -> RegistryResult<Committed> {
        let now = now_unix();

        let (package, _) = PackageRepository::get_or_insert(
            conn,
            self.owner_id,
            PackageType::Conan,
            rref.name(),
            now,
        )?;

        let (version, version_created) = VersionRepository::get_or_insert(
            conn,
            package.id,
            rref.version(),
            prepared.metadata_json.as_deref(),
            now,
        )?;
        if !version_created {
            if let Some(metadata) = &prepared.metadata_json {
                trace!("updating metadata of {}/{}", rref.name(), rref.version());
                VersionRepository::update_metadata(conn, version.id, metadata)?;
            }
        }

        let (blob, _) = BlobRepository::get_or_insert(
            conn,
            &content.hash,
            &content.md5,
            content.size,
            now,
        )?;

        let mut orphaned_blobs = Vec::new();
        let existing =
            FileRepository::find(conn, version.id, &prepared.name, &prepared.composite_key)?;
        let replaced = existing.is_some();
        if let Some(existing) = existing {
            if !self.overwrite {
                return Err(RegistryError::DuplicatePackageFile(prepared.name.clone()));
            }

            trace!("replacing file {} ({})", existing.name, existing.id);
            PropertyRepository::delete_by_ref(conn, PropertyType::File, existing.id)?;
            for blob_id in FileRepository::delete_many(conn, &[existing.id])? {
                if blob_id != blob.id {
                    if let Some(hash) = release_blob(conn, blob_id)? {
                        orphaned_blobs.push(hash);
                    }
                }
            }
        }

        let file = FileRepository::insert(
            conn,
            &NewPackageFile {
                version_id: version.id,
                blob_id: blob.id,
                name: &prepared.name,
                lower_name: &prepared.name,
                composite_key: &prepared.composite_key,
                is_lead: prepared.is_lead,
                created_unix: now,
            },
        )?;

        let properties: Vec<(&str, &str)> = prepared
            .properties
            .iter()
            .map(|(name, value)| (*name, value.as_str()))
            .collect();
        PropertyRepository::insert_many(conn, PropertyType::File, file.id, &properties)?;

        Ok(Committed {
            stored: StoredFile {
                file_id: file.id,
                name: file.name,
                composite_key: file.composite_key,
                blob_hash: content.hash.clone(),
                version_created,
                replaced,
            },
            orphaned_blobs,
        })
    }
}

/// Deletes the blob row once no file points at it, returning its hash so the content
/// can be removed after commit.
pub(crate) fn release_blob(
    conn: &mut SqliteConnection,
    blob_id: i32,
) -> RegistryResult<Option<String>> {
    if BlobRepository::is_referenced(conn, blob_id)? {
        return Ok(None);
    }

    let Some(blob) = BlobRepository::find_by_id(conn, blob_id)? else {
        return Ok(None);
    };
    BlobRepository::delete(conn, blob.id)?;
    Ok(Some(blob.hash_blake3))
}

/// Removes stored content unless a blob row points at it again. The caller must hold the
/// connection lock and must not be inside an open transaction.
pub(crate) fn remove_unreferenced_content(
    conn: &mut SqliteConnection,
    blobs: &BlobStore,
    hash: &str,
) {
    match BlobRepository::find_by_hash(conn, hash) {
        Ok(Some(_)) => trace!("blob {} is referenced again, keeping its content", hash),
        Ok(None) => {
            if let Err(err) = blobs.remove(hash) {
                warn!("failed to remove blob {}: {}", hash, err);
            }
        }
        Err(err) => warn!("failed to look up blob {}: {}", hash, err),
    }
}
