use diesel::{Connection, SqliteConnection};
use hangar_conan::{
    constants::{
        PROPERTY_PACKAGE_REFERENCE, PROPERTY_PACKAGE_REVISION, PROPERTY_RECIPE_CHANNEL,
        PROPERTY_RECIPE_REVISION, PROPERTY_RECIPE_USER,
    },
    PackageReference, RecipeReference,
};
use hangar_db::{
    models::types::PropertyType,
    repository::{
        FileRepository, FileSearchOptions, PackageRepository, PropertyRepository,
        VersionRepository,
    },
};
use hangar_events::{EventSinkHandle, RegistryEvent};
use tracing::{debug, trace};

use crate::{
    database::connection::RegistryDatabase,
    error::RegistryError,
    package::{
        files::find_version,
        revision,
        upload::{release_blob, remove_unreferenced_content},
    },
    storage::BlobStore,
    RegistryResult,
};

/// Result of one or more deletions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub files_removed: usize,
    pub version_deleted: bool,
}

impl DeleteOutcome {
    /// Adds the files removed by `other`; the version counts as deleted if either run
    /// deleted it.
    pub fn merge(&mut self, other: DeleteOutcome) {
        self.files_removed += other.files_removed;
        self.version_deleted |= other.version_deleted;
    }
}

struct Removed {
    outcome: DeleteOutcome,
    freed_blobs: Vec<String>,
}

/// Deletes recipes, recipe revisions, packages and package revisions of one owner.
pub struct ReferenceRemover {
    db: RegistryDatabase,
    blobs: BlobStore,
    events: EventSinkHandle,
    owner_id: i64,
}

impl ReferenceRemover {
    pub fn new(
        db: RegistryDatabase,
        blobs: BlobStore,
        events: EventSinkHandle,
        owner_id: i64,
    ) -> Self {
        Self {
            db,
            blobs,
            events,
            owner_id,
        }
    }

    /// Deletes every file matching the reference, and the package version with its last
    /// file, in a single transaction.
    ///
    /// Without `pref` the whole recipe scope is deleted, binary packages included.
    /// `ignore_recipe_revision` widens the scope to every revision of the recipe's
    /// user/channel, `ignore_package_revision` to every revision of the package.
    ///
    /// # Errors
    ///
    /// * [`RegistryError::PackageNotExist`] if the package version does not exist.
    /// * [`RegistryError::PackageReferenceNotExist`] if no file matches.
    pub fn delete_recipe_or_package(
        &self,
        rref: &RecipeReference,
        ignore_recipe_revision: bool,
        pref: Option<&PackageReference>,
        ignore_package_revision: bool,
    ) -> RegistryResult<DeleteOutcome> {
        let mut filters = vec![
            (PROPERTY_RECIPE_USER, rref.user()),
            (PROPERTY_RECIPE_CHANNEL, rref.channel()),
        ];
        if !ignore_recipe_revision {
            filters.push((PROPERTY_RECIPE_REVISION, rref.revision_or_default()));
        }
        if let Some(pref) = pref {
            filters.push((PROPERTY_PACKAGE_REFERENCE, pref.reference()));
            if !ignore_package_revision {
                filters.push((PROPERTY_PACKAGE_REVISION, pref.revision_or_default()));
            }
        }
        trace!("deleting files of {} matching {:?}", rref, filters);

        let removed = self.db.with_conn(|conn| {
            let removed = conn.transaction(|conn| self.delete_matching(conn, rref, &filters))?;
            for hash in &removed.freed_blobs {
                remove_unreferenced_content(conn, &self.blobs, hash);
            }
            Ok(removed)
        })?;

        let outcome = removed.outcome;
        let name = rref.name().to_string();
        let version = rref.version().to_string();
        if outcome.version_deleted {
            debug!("deleted {}/{} with its last file", name, version);
            self.events.emit(RegistryEvent::PackageDeleted {
                owner_id: self.owner_id,
                name,
                version,
            });
        } else {
            debug!("deleted {} file(s) of {}/{}", outcome.files_removed, name, version);
            self.events.emit(RegistryEvent::FilesRemoved {
                owner_id: self.owner_id,
                name,
                version,
                count: outcome.files_removed,
            });
        }

        Ok(outcome)
    }

    fn delete_matching(
        &self,
        conn: &mut SqliteConnection,
        rref: &RecipeReference,
        filters: &[(&str, &str)],
    ) -> RegistryResult<Removed> {
        let version = find_version(conn, self.owner_id, rref)?;

        let files = FileRepository::search(
            conn,
            &FileSearchOptions {
                version_id: Some(version.id),
                properties: filters.to_vec(),
                ..Default::default()
            },
        )?;
        if files.is_empty() {
            return Err(RegistryError::PackageReferenceNotExist(rref.to_string()));
        }

        let file_ids: Vec<i32> = files.iter().map(|file| file.id).collect();
        PropertyRepository::delete_by_refs(conn, PropertyType::File, &file_ids)?;
        let blob_ids = FileRepository::delete_many(conn, &file_ids)?;

        let mut freed_blobs = Vec::new();
        for blob_id in blob_ids {
            if let Some(hash) = release_blob(conn, blob_id)? {
                freed_blobs.push(hash);
            }
        }

        let version_deleted = !VersionRepository::has_files(conn, version.id)?;
        if version_deleted {
            PropertyRepository::delete_by_ref(conn, PropertyType::Version, version.id)?;
            VersionRepository::delete(conn, version.id)?;

            if !PackageRepository::has_versions(conn, version.package_id)? {
                trace!("deleting package {} without versions", rref.name());
                PropertyRepository::delete_by_ref(conn, PropertyType::Package, version.package_id)?;
                PackageRepository::delete(conn, version.package_id)?;
            }
        }

        Ok(Removed {
            outcome: DeleteOutcome {
                files_removed: file_ids.len(),
                version_deleted,
            },
            freed_blobs,
        })
    }

    /// Deletes a recipe with its packages. `ignore_revision` removes every revision.
    pub fn remove_recipe(
        &self,
        rref: &RecipeReference,
        ignore_revision: bool,
    ) -> RegistryResult<DeleteOutcome> {
        self.delete_recipe_or_package(rref, ignore_revision, None, false)
    }

    /// Deletes binary packages by id across every recipe revision, regardless of package
    /// revision. Without ids, every package of each recipe revision is deleted.
    ///
    /// A recipe without revisions is not an error; nothing is deleted.
    pub fn remove_package_ids(
        &self,
        rref: &RecipeReference,
        ids: &[String],
    ) -> RegistryResult<DeleteOutcome> {
        let revisions = self
            .db
            .with_conn(|conn| revision::recipe_revisions(conn, self.owner_id, rref))?;

        let mut total = DeleteOutcome::default();
        for recipe_revision in revisions {
            let current = rref.with_revision(&recipe_revision.value);

            let references: Vec<String> = if ids.is_empty() {
                self.db
                    .with_conn(|conn| revision::package_references(conn, self.owner_id, &current))?
                    .into_iter()
                    .map(|value| value.value)
                    .collect()
            } else {
                ids.to_vec()
            };

            for reference in references {
                let pref = PackageReference::new(current.clone(), &reference, "")?;
                total.merge(self.delete_recipe_or_package(&current, true, Some(&pref), true)?);
            }
        }

        Ok(total)
    }

    /// Deletes one package, or every package of the recipe revision when `pref` is unset.
    ///
    /// The recipe revision is always respected. A package without revision loses all of
    /// its revisions.
    ///
    /// # Errors
    ///
    /// [`RegistryError::PackageReferenceNotExist`] if the recipe revision has no packages.
    pub fn remove_packages(
        &self,
        rref: &RecipeReference,
        pref: Option<&PackageReference>,
    ) -> RegistryResult<DeleteOutcome> {
        if let Some(pref) = pref {
            return self.delete_recipe_or_package(rref, false, Some(pref), !pref.has_revision());
        }

        let references = self
            .db
            .with_conn(|conn| revision::package_references(conn, self.owner_id, rref))?;
        if references.is_empty() {
            return Err(RegistryError::PackageReferenceNotExist(rref.to_string()));
        }

        let mut total = DeleteOutcome::default();
        for reference in references {
            let pref = PackageReference::new(rref.clone(), &reference.value, "")?;
            total.merge(self.delete_recipe_or_package(rref, false, Some(&pref), true)?);
        }

        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use diesel::{sql_query, RunQueryDsl};
    use hangar_db::repository::BlobRepository;
    use hangar_events::CollectorSink;

    use super::*;
    use crate::{
        package::{
            files::read_file,
            revision::{last_package_revision, last_recipe_revision, package_references},
        },
        test_utils::{TestRegistry, OWNER},
    };

    fn remover(registry: &TestRegistry) -> (ReferenceRemover, Arc<CollectorSink>) {
        let events = Arc::new(CollectorSink::default());
        let remover = ReferenceRemover::new(
            registry.db.clone(),
            registry.blobs.clone(),
            events.clone(),
            OWNER,
        );
        (remover, events)
    }

    fn references(registry: &TestRegistry, rref: &RecipeReference) -> Vec<String> {
        registry
            .db
            .with_conn(|conn| package_references(conn, OWNER, rref))
            .unwrap()
            .into_iter()
            .map(|value| value.value)
            .collect()
    }

    #[test]
    fn test_merge_outcomes() {
        let mut total = DeleteOutcome::default();
        total.merge(DeleteOutcome {
            files_removed: 2,
            version_deleted: false,
        });
        total.merge(DeleteOutcome {
            files_removed: 3,
            version_deleted: true,
        });
        total.merge(DeleteOutcome::default());

        assert_eq!(
            total,
            DeleteOutcome {
                files_removed: 5,
                version_deleted: true,
            }
        );
    }

    #[test]
    fn test_delete_package_revision_keeps_siblings() {
        let registry = TestRegistry::new();
        let rref = registry.publish_recipe("zlib/1.3");
        registry.publish_package(&rref, "pkg1", "p1");
        let p2 = registry.publish_package(&rref, "pkg1", "p2");
        let (remover, events) = remover(&registry);

        let outcome = remover
            .delete_recipe_or_package(&rref, false, Some(&p2), false)
            .unwrap();
        assert_eq!(
            outcome,
            DeleteOutcome {
                files_removed: 2,
                version_deleted: false
            }
        );

        let last = registry
            .db
            .with_conn(|conn| last_package_revision(conn, OWNER, &p2.with_revision("")))
            .unwrap();
        assert_eq!(last.value, "p1");
        assert!(matches!(
            events.events()[0],
            RegistryEvent::FilesRemoved { count: 2, .. }
        ));
    }

    #[test]
    fn test_delete_recipe_revision_leaves_other_revisions() {
        let registry = TestRegistry::new();
        let rref = registry.publish_recipe("zlib/1.3");
        let rev2 = rref.with_revision("rev2");
        registry.upload_recipe(&rev2, "conanfile.py", b"name = \"zlib\"\n");
        let (remover, _) = remover(&registry);

        remover.remove_recipe(&rev2, false).unwrap();

        let last = registry
            .db
            .with_conn(|conn| last_recipe_revision(conn, OWNER, &rref))
            .unwrap();
        assert_eq!(last.value, "0");
        assert_eq!(registry.file_count(), 2);
    }

    #[test]
    fn test_delete_recipe_all_revisions_cascades() {
        let registry = TestRegistry::new();
        let rref = registry.publish_recipe("zlib/1.3");
        let pref = registry.publish_package(&rref, "pkg1", "");
        registry.upload_recipe(&rref.with_revision("rev2"), "conanfile.py", b"name = \"z\"\n");
        let (remover, events) = remover(&registry);

        let outcome = remover.remove_recipe(&rref, true).unwrap();
        assert_eq!(outcome.files_removed, 5);
        assert!(outcome.version_deleted);
        assert_eq!(registry.file_count(), 0);

        let err = registry
            .db
            .with_conn(|conn| last_package_revision(conn, OWNER, &pref))
            .unwrap_err();
        assert!(matches!(err, RegistryError::PackageReferenceNotExist(_)));

        let package = registry
            .db
            .with_conn(|conn| {
                Ok(PackageRepository::find(
                    conn,
                    OWNER,
                    hangar_db::models::types::PackageType::Conan,
                    "zlib",
                )?)
            })
            .unwrap();
        assert!(package.is_none());
        assert_eq!(
            events.events(),
            vec![RegistryEvent::PackageDeleted {
                owner_id: OWNER,
                name: "zlib".to_string(),
                version: "1.3".to_string(),
            }]
        );
    }

    #[test]
    fn test_delete_keeps_other_user_channel() {
        let registry = TestRegistry::new();
        let rref = registry.publish_recipe("zlib/1.3");
        registry.publish_recipe("zlib/1.3@conan/stable");
        let (remover, _) = remover(&registry);

        let outcome = remover.remove_recipe(&rref, true).unwrap();
        assert!(!outcome.version_deleted);
        assert_eq!(registry.file_count(), 2);
    }

    #[test]
    fn test_delete_missing_reference() {
        let registry = TestRegistry::new();
        let rref = registry.publish_recipe("zlib/1.3");
        let (remover, events) = remover(&registry);

        let missing = RecipeReference::parse("zlib/9.9").unwrap();
        assert!(matches!(
            remover.remove_recipe(&missing, true),
            Err(RegistryError::PackageNotExist(_))
        ));

        let pref = PackageReference::new(rref.clone(), "nope", "").unwrap();
        assert!(matches!(
            remover.delete_recipe_or_package(&rref, false, Some(&pref), true),
            Err(RegistryError::PackageReferenceNotExist(_))
        ));
        assert!(events.is_empty());
        assert_eq!(registry.file_count(), 2);
    }

    #[test]
    fn test_freed_blobs_are_removed() {
        let registry = TestRegistry::new();
        let rref = registry.publish_recipe("zlib/1.3");
        registry.publish_package(&rref, "pkg1", "");
        let p2 = registry.publish_package(&rref, "pkg2", "");
        let shared = hangar_utils::hash::hash_bytes(b"[settings]\nos=Linux\n");
        let (remover, _) = remover(&registry);

        remover.remove_packages(&rref, Some(&p2)).unwrap();
        assert!(registry.blobs.exists(&shared).unwrap());

        remover.remove_packages(&rref, None).unwrap();
        assert!(!registry.blobs.exists(&shared).unwrap());
        let row = registry
            .db
            .with_conn(|conn| Ok(BlobRepository::find_by_hash(conn, &shared)?))
            .unwrap();
        assert!(row.is_none());
        assert_eq!(registry.file_count(), 2);
    }

    #[test]
    fn test_reupload_after_delete_keeps_content() {
        let registry = TestRegistry::new();
        let zlib = registry.publish_recipe("zlib/1.3");
        let (remover, _) = remover(&registry);

        remover.remove_recipe(&zlib, true).unwrap();
        let other = RecipeReference::parse("other/1.0").unwrap();
        registry.upload_recipe(&other, "conanmanifest.txt", b"zlib/1.3");

        let content = read_file(
            &registry.db,
            &registry.blobs,
            OWNER,
            &other,
            &other.as_key(),
            "conanmanifest.txt",
        )
        .unwrap();
        assert_eq!(content.data, b"zlib/1.3");
    }

    #[test]
    fn test_concurrent_upload_and_delete_of_shared_content() {
        let registry = TestRegistry::new();
        let other = RecipeReference::parse("other/1.0").unwrap();

        std::thread::scope(|scope| {
            scope.spawn(|| {
                let (remover, _) = remover(&registry);
                for _ in 0..25 {
                    let zlib = registry.publish_recipe("zlib/1.3");
                    remover.remove_recipe(&zlib, true).unwrap();
                }
            });
            scope.spawn(|| {
                for _ in 0..25 {
                    registry.upload_recipe(&other, "conanmanifest.txt", b"zlib/1.3");
                }
            });
        });

        let content = read_file(
            &registry.db,
            &registry.blobs,
            OWNER,
            &other,
            &other.as_key(),
            "conanmanifest.txt",
        )
        .unwrap();
        assert_eq!(content.data, b"zlib/1.3");
    }

    #[test]
    fn test_remove_packages_without_references() {
        let registry = TestRegistry::new();
        let rref = registry.publish_recipe("zlib/1.3");
        let (remover, _) = remover(&registry);

        assert!(matches!(
            remover.remove_packages(&rref, None),
            Err(RegistryError::PackageReferenceNotExist(_))
        ));
    }

    #[test]
    fn test_remove_package_ids() {
        let registry = TestRegistry::new();
        let rref = registry.publish_recipe("zlib/1.3");
        registry.publish_package(&rref, "pkg1", "p1");
        registry.publish_package(&rref, "pkg1", "p2");
        registry.publish_package(&rref, "pkg2", "");
        let (remover, _) = remover(&registry);

        let outcome = remover
            .remove_package_ids(&rref, &["pkg1".to_string()])
            .unwrap();
        assert_eq!(outcome.files_removed, 4);
        assert_eq!(references(&registry, &rref), vec!["pkg2"]);

        remover.remove_package_ids(&rref, &[]).unwrap();
        assert!(references(&registry, &rref).is_empty());
        assert_eq!(registry.file_count(), 2);
    }

    #[test]
    fn test_remove_package_ids_without_revisions() {
        let registry = TestRegistry::new();
        let (remover, _) = remover(&registry);
        let rref = RecipeReference::parse("zlib/1.3").unwrap();

        let outcome = remover.remove_package_ids(&rref, &[]).unwrap();
        assert_eq!(outcome, DeleteOutcome::default());
    }

    #[test]
    fn test_failed_delete_rolls_back() {
        let registry = TestRegistry::new();
        let rref = registry.publish_recipe("zlib/1.3");
        registry.publish_package(&rref, "pkg1", "");
        let before = registry.file_count();
        let (remover, events) = remover(&registry);

        registry
            .db
            .with_conn(|conn| {
                sql_query(
                    "CREATE TRIGGER fail_version_delete BEFORE DELETE ON package_versions \
                     BEGIN SELECT RAISE(ABORT, 'injected failure'); END;",
                )
                .execute(conn)?;
                Ok(())
            })
            .unwrap();

        assert!(remover.remove_recipe(&rref, true).is_err());
        assert_eq!(registry.file_count(), before);
        assert_eq!(references(&registry, &rref), vec!["pkg1"]);
        assert!(events.is_empty());

        let manifest = hangar_utils::hash::hash_bytes(b"zlib/1.3");
        assert!(registry.blobs.exists(&manifest).unwrap());
    }
}
