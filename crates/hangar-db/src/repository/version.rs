use diesel::prelude::*;

use crate::{
    models::{
        registry::{NewPackageVersion, Package, PackageVersion},
        types::PackageType,
    },
    schema::{package_files, package_versions, packages},
};

/// Repository for package version rows.
pub struct VersionRepository;

impl VersionRepository {
    /// Finds a version by owner, package type, package name and version, all compared
    /// case-insensitively.
    pub fn find_by_name_and_version(
        conn: &mut SqliteConnection,
        owner_id: i64,
        package_type: PackageType,
        name: &str,
        version: &str,
    ) -> QueryResult<Option<PackageVersion>> {
        package_versions::table
            .inner_join(packages::table)
            .filter(packages::owner_id.eq(owner_id))
            .filter(packages::package_type.eq(package_type.as_str()))
            .filter(packages::lower_name.eq(name.to_lowercase()))
            .filter(package_versions::lower_version.eq(version.to_lowercase()))
            .select(PackageVersion::as_select())
            .first(conn)
            .optional()
    }

    pub fn find_by_package(
        conn: &mut SqliteConnection,
        package_id: i32,
        version: &str,
    ) -> QueryResult<Option<PackageVersion>> {
        package_versions::table
            .filter(package_versions::package_id.eq(package_id))
            .filter(package_versions::lower_version.eq(version.to_lowercase()))
            .select(PackageVersion::as_select())
            .first(conn)
            .optional()
    }

    /// Returns the existing version or inserts a new one. The flag is true when inserted.
    pub fn get_or_insert(
        conn: &mut SqliteConnection,
        package_id: i32,
        version: &str,
        metadata_json: Option<&str>,
        created_unix: i64,
    ) -> QueryResult<(PackageVersion, bool)> {
        if let Some(existing) = Self::find_by_package(conn, package_id, version)? {
            return Ok((existing, false));
        }

        let lower_version = version.to_lowercase();
        let created = diesel::insert_into(package_versions::table)
            .values(&NewPackageVersion {
                package_id,
                version,
                lower_version: &lower_version,
                metadata_json,
                created_unix,
            })
            .returning(PackageVersion::as_returning())
            .get_result(conn)?;

        Ok((created, true))
    }

    pub fn update_metadata(
        conn: &mut SqliteConnection,
        id: i32,
        metadata_json: &str,
    ) -> QueryResult<usize> {
        diesel::update(package_versions::table.filter(package_versions::id.eq(id)))
            .set(package_versions::metadata_json.eq(metadata_json))
            .execute(conn)
    }

    /// Lists every version of an owner's packages of one type with its package.
    pub fn list_by_owner(
        conn: &mut SqliteConnection,
        owner_id: i64,
        package_type: PackageType,
    ) -> QueryResult<Vec<(Package, PackageVersion)>> {
        package_versions::table
            .inner_join(packages::table)
            .filter(packages::owner_id.eq(owner_id))
            .filter(packages::package_type.eq(package_type.as_str()))
            .order((packages::lower_name.asc(), package_versions::lower_version.asc()))
            .select((Package::as_select(), PackageVersion::as_select()))
            .load(conn)
    }

    /// Returns true if any file still belongs to the version.
    pub fn has_files(conn: &mut SqliteConnection, version_id: i32) -> QueryResult<bool> {
        diesel::select(diesel::dsl::exists(
            package_files::table.filter(package_files::version_id.eq(version_id)),
        ))
        .get_result(conn)
    }

    pub fn delete(conn: &mut SqliteConnection, id: i32) -> QueryResult<usize> {
        diesel::delete(package_versions::table.filter(package_versions::id.eq(id))).execute(conn)
    }
}
