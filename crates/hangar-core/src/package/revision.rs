//! Revision resolution over file properties.
//!
//! Revisions and package references have no table of their own. They are the distinct
//! values of a property among the files of a package version, each dated by the newest
//! file carrying it. The most recent value is the latest revision; ties on the timestamp
//! go to the value whose newest file was inserted last.

use diesel::SqliteConnection;
use hangar_conan::{
    constants::{
        PROPERTY_PACKAGE_REFERENCE, PROPERTY_PACKAGE_REVISION, PROPERTY_RECIPE_CHANNEL,
        PROPERTY_RECIPE_REVISION, PROPERTY_RECIPE_USER,
    },
    PackageReference, RecipeReference,
};
use hangar_db::{
    models::{registry::PropertyValue, types::PackageType},
    repository::{FileRepository, FileSearchOptions, VersionRepository},
};
use tracing::trace;

use crate::{database::connection::RegistryDatabase, error::RegistryError, RegistryResult};

/// Lists the values of `property` over the files of `name/version` that carry every
/// `(name, value)` pair in `filters`, newest first.
///
/// A missing package version yields an empty list.
pub fn find_property_values(
    conn: &mut SqliteConnection,
    owner_id: i64,
    name: &str,
    version: &str,
    property: &str,
    filters: &[(&str, &str)],
) -> RegistryResult<Vec<PropertyValue>> {
    let Some(package_version) =
        VersionRepository::find_by_name_and_version(conn, owner_id, PackageType::Conan, name, version)?
    else {
        trace!("no package version {}/{} for owner {}", name, version, owner_id);
        return Ok(Vec::new());
    };

    let files = FileRepository::search(
        conn,
        &FileSearchOptions {
            version_id: Some(package_version.id),
            properties: filters.to_vec(),
            ..Default::default()
        },
    )?;
    let file_ids: Vec<i32> = files.iter().map(|file| file.id).collect();

    let values = FileRepository::property_values(conn, property, &file_ids)?;
    trace!(
        "{} value(s) of {} among {} file(s) of {}/{}",
        values.len(),
        property,
        file_ids.len(),
        name,
        version
    );

    Ok(values)
}

fn recipe_filters(rref: &RecipeReference) -> Vec<(&str, &str)> {
    vec![
        (PROPERTY_RECIPE_USER, rref.user()),
        (PROPERTY_RECIPE_CHANNEL, rref.channel()),
    ]
}

fn recipe_revision_filters(rref: &RecipeReference) -> Vec<(&str, &str)> {
    let mut filters = recipe_filters(rref);
    filters.push((PROPERTY_RECIPE_REVISION, rref.revision_or_default()));
    filters
}

fn package_filters(pref: &PackageReference) -> Vec<(&str, &str)> {
    let mut filters = recipe_revision_filters(pref.recipe());
    filters.push((PROPERTY_PACKAGE_REFERENCE, pref.reference()));
    filters
}

/// All revisions of the recipe's user/channel, newest first.
pub fn recipe_revisions(
    conn: &mut SqliteConnection,
    owner_id: i64,
    rref: &RecipeReference,
) -> RegistryResult<Vec<PropertyValue>> {
    find_property_values(
        conn,
        owner_id,
        rref.name(),
        rref.version(),
        PROPERTY_RECIPE_REVISION,
        &recipe_filters(rref),
    )
}

pub fn last_recipe_revision(
    conn: &mut SqliteConnection,
    owner_id: i64,
    rref: &RecipeReference,
) -> RegistryResult<PropertyValue> {
    recipe_revisions(conn, owner_id, rref)?
        .into_iter()
        .next()
        .ok_or_else(|| RegistryError::RecipeReferenceNotExist(rref.coordinate()))
}

/// Binary package ids built from the recipe revision (the default revision when unset).
pub fn package_references(
    conn: &mut SqliteConnection,
    owner_id: i64,
    rref: &RecipeReference,
) -> RegistryResult<Vec<PropertyValue>> {
    find_property_values(
        conn,
        owner_id,
        rref.name(),
        rref.version(),
        PROPERTY_PACKAGE_REFERENCE,
        &recipe_revision_filters(rref),
    )
}

pub fn package_revisions(
    conn: &mut SqliteConnection,
    owner_id: i64,
    pref: &PackageReference,
) -> RegistryResult<Vec<PropertyValue>> {
    let rref = pref.recipe();
    find_property_values(
        conn,
        owner_id,
        rref.name(),
        rref.version(),
        PROPERTY_PACKAGE_REVISION,
        &package_filters(pref),
    )
}

pub fn last_package_revision(
    conn: &mut SqliteConnection,
    owner_id: i64,
    pref: &PackageReference,
) -> RegistryResult<PropertyValue> {
    package_revisions(conn, owner_id, pref)?
        .into_iter()
        .next()
        .ok_or_else(|| RegistryError::PackageReferenceNotExist(pref.to_string()))
}

pub fn recipe_exists(
    conn: &mut SqliteConnection,
    owner_id: i64,
    rref: &RecipeReference,
) -> RegistryResult<bool> {
    Ok(!recipe_revisions(conn, owner_id, rref)?.is_empty())
}

/// Revision lookups scoped to one owner.
#[derive(Clone)]
pub struct RevisionResolver {
    db: RegistryDatabase,
    owner_id: i64,
}

impl RevisionResolver {
    pub fn new(db: RegistryDatabase, owner_id: i64) -> Self {
        Self {
            db,
            owner_id,
        }
    }

    pub fn owner_id(&self) -> i64 {
        self.owner_id
    }

    pub fn recipe_revisions(&self, rref: &RecipeReference) -> RegistryResult<Vec<PropertyValue>> {
        self.db
            .with_conn(|conn| recipe_revisions(conn, self.owner_id, rref))
    }

    pub fn last_recipe_revision(&self, rref: &RecipeReference) -> RegistryResult<PropertyValue> {
        self.db
            .with_conn(|conn| last_recipe_revision(conn, self.owner_id, rref))
    }

    pub fn package_references(
        &self,
        rref: &RecipeReference,
    ) -> RegistryResult<Vec<PropertyValue>> {
        self.db
            .with_conn(|conn| package_references(conn, self.owner_id, rref))
    }

    pub fn package_revisions(&self, pref: &PackageReference) -> RegistryResult<Vec<PropertyValue>> {
        self.db
            .with_conn(|conn| package_revisions(conn, self.owner_id, pref))
    }

    pub fn last_package_revision(&self, pref: &PackageReference) -> RegistryResult<PropertyValue> {
        self.db
            .with_conn(|conn| last_package_revision(conn, self.owner_id, pref))
    }

    pub fn recipe_exists(&self, rref: &RecipeReference) -> RegistryResult<bool> {
        self.db
            .with_conn(|conn| recipe_exists(conn, self.owner_id, rref))
    }
}
