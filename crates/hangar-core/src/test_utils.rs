use std::sync::Arc;

use diesel::{dsl::count_star, prelude::*};
use hangar_conan::{PackageReference, RecipeReference};
use hangar_db::schema::package_files;
use hangar_events::NullSink;
use tempfile::TempDir;

use crate::{
    database::connection::RegistryDatabase,
    package::upload::{PackageUploader, UploadOutcome, UploadRequest},
    storage::BlobStore,
};

pub const OWNER: i64 = 1;

/// In-memory registry with a temporary blob directory.
pub struct TestRegistry {
    pub db: RegistryDatabase,
    pub blobs: BlobStore,
    _dir: TempDir,
}

impl TestRegistry {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        Self {
            db: RegistryDatabase::open_in_memory().unwrap(),
            blobs: BlobStore::new(dir.path()),
            _dir: dir,
        }
    }

    pub fn uploader(&self, overwrite: bool) -> PackageUploader {
        PackageUploader::new(
            self.db.clone(),
            self.blobs.clone(),
            Arc::new(NullSink),
            OWNER,
            overwrite,
        )
    }

    pub fn upload_recipe(&self, rref: &RecipeReference, name: &str, content: &[u8]) -> UploadOutcome {
        self.uploader(true)
            .upload(UploadRequest {
                recipe: rref,
                package: None,
                filename: name,
                content,
            })
            .unwrap()
    }

    pub fn upload_package(
        &self,
        pref: &PackageReference,
        name: &str,
        content: &[u8],
    ) -> UploadOutcome {
        self.uploader(true)
            .upload(UploadRequest {
                recipe: pref.recipe(),
                package: Some(pref),
                filename: name,
                content,
            })
            .unwrap()
    }

    /// Uploads a recipe with its manifest, as a client does.
    pub fn publish_recipe(&self, reference: &str) -> RecipeReference {
        let rref = RecipeReference::parse(reference).unwrap();
        self.upload_recipe(&rref, "conanfile.py", b"license = \"MIT\"\n");
        self.upload_recipe(&rref, "conanmanifest.txt", reference.as_bytes());
        rref
    }

    /// Uploads a binary package with its info and manifest.
    pub fn publish_package(
        &self,
        rref: &RecipeReference,
        reference: &str,
        revision: &str,
    ) -> PackageReference {
        let pref = PackageReference::new(rref.clone(), reference, revision).unwrap();
        self.upload_package(&pref, "conaninfo.txt", b"[settings]\nos=Linux\n");
        self.upload_package(&pref, "conanmanifest.txt", pref.to_string().as_bytes());
        pref
    }

    pub fn file_count(&self) -> i64 {
        self.db
            .with_conn(|conn| Ok(package_files::table.select(count_star()).first(conn)?))
            .unwrap()
    }
}
