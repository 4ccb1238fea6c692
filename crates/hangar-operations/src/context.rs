use std::{path::Path, sync::Arc};

use hangar_config::config::Config;
use hangar_core::{
    database::connection::RegistryDatabase,
    package::{
        remove::ReferenceRemover, revision::RevisionResolver, upload::PackageUploader,
    },
    storage::BlobStore,
    RegistryResult,
};
use hangar_events::{EventSinkHandle, NullSink};
use tracing::debug;

/// Everything an operation needs: the store, the blob directory, the event sink, the
/// configuration and the owner the operation acts for.
#[derive(Clone)]
pub struct RegistryContext {
    db: RegistryDatabase,
    blobs: BlobStore,
    events: EventSinkHandle,
    config: Config,
    owner_id: i64,
}

impl RegistryContext {
    /// Opens the database and blob store named by `config`, acting for its default owner.
    pub fn open(config: &Config) -> RegistryResult<Self> {
        let db_path = config.get_db_path()?;
        let storage_path = config.get_storage_path()?;
        debug!(
            "opening registry at {} with blobs in {}",
            db_path.display(),
            storage_path.display()
        );

        Ok(Self {
            db: RegistryDatabase::open(&db_path)?,
            blobs: BlobStore::new(storage_path),
            events: Arc::new(NullSink),
            config: config.clone(),
            owner_id: config.default_owner(),
        })
    }

    /// In-memory database with blobs under `storage`.
    pub fn in_memory<P: AsRef<Path>>(config: &Config, storage: P) -> RegistryResult<Self> {
        Ok(Self {
            db: RegistryDatabase::open_in_memory()?,
            blobs: BlobStore::new(storage),
            events: Arc::new(NullSink),
            config: config.clone(),
            owner_id: config.default_owner(),
        })
    }

    pub fn with_events(mut self, events: EventSinkHandle) -> Self {
        self.events = events;
        self
    }

    pub fn with_owner(mut self, owner_id: i64) -> Self {
        self.owner_id = owner_id;
        self
    }

    pub fn db(&self) -> &RegistryDatabase {
        &self.db
    }

    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn owner_id(&self) -> i64 {
        self.owner_id
    }

    pub fn resolver(&self) -> RevisionResolver {
        RevisionResolver::new(self.db.clone(), self.owner_id)
    }

    pub fn uploader(&self) -> PackageUploader {
        PackageUploader::new(
            self.db.clone(),
            self.blobs.clone(),
            self.events.clone(),
            self.owner_id,
            self.config.allow_overwrite(),
        )
    }

    pub fn remover(&self) -> ReferenceRemover {
        ReferenceRemover::new(
            self.db.clone(),
            self.blobs.clone(),
            self.events.clone(),
            self.owner_id,
        )
    }

    /// Root of the Conan API, used as prefix of download and upload URLs.
    pub fn base_url(&self) -> String {
        self.config.base_url()
    }
}
