use diesel::prelude::*;

use crate::{
    models::{
        registry::{NewPackage, Package},
        types::PackageType,
    },
    schema::{package_versions, packages},
};

/// Repository for package rows.
pub struct PackageRepository;

impl PackageRepository {
    /// Finds a package by owner, type and case-insensitive name.
    pub fn find(
        conn: &mut SqliteConnection,
        owner_id: i64,
        package_type: PackageType,
        name: &str,
    ) -> QueryResult<Option<Package>> {
        packages::table
            .filter(packages::owner_id.eq(owner_id))
            .filter(packages::package_type.eq(package_type.as_str()))
            .filter(packages::lower_name.eq(name.to_lowercase()))
            .select(Package::as_select())
            .first(conn)
            .optional()
    }

    /// Returns the existing package or inserts a new one. The flag is true when inserted.
    pub fn get_or_insert(
        conn: &mut SqliteConnection,
        owner_id: i64,
        package_type: PackageType,
        name: &str,
        created_unix: i64,
    ) -> QueryResult<(Package, bool)> {
        if let Some(package) = Self::find(conn, owner_id, package_type, name)? {
            return Ok((package, false));
        }

        let lower_name = name.to_lowercase();
        let package = diesel::insert_into(packages::table)
            .values(&NewPackage {
                owner_id,
                package_type: package_type.as_str(),
                name,
                lower_name: &lower_name,
                created_unix,
            })
            .returning(Package::as_returning())
            .get_result(conn)?;

        Ok((package, true))
    }

    pub fn find_by_id(conn: &mut SqliteConnection, id: i32) -> QueryResult<Option<Package>> {
        packages::table
            .filter(packages::id.eq(id))
            .select(Package::as_select())
            .first(conn)
            .optional()
    }

    /// Returns true if any version still belongs to the package.
    pub fn has_versions(conn: &mut SqliteConnection, package_id: i32) -> QueryResult<bool> {
        diesel::select(diesel::dsl::exists(
            package_versions::table.filter(package_versions::package_id.eq(package_id)),
        ))
        .get_result(conn)
    }

    pub fn delete(conn: &mut SqliteConnection, id: i32) -> QueryResult<usize> {
        diesel::delete(packages::table.filter(packages::id.eq(id))).execute(conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::DbConnection;

    #[test]
    fn test_get_or_insert_is_case_insensitive() {
        let mut db = DbConnection::open_in_memory().unwrap();
        let conn = db.conn();

        let (created, inserted) =
            PackageRepository::get_or_insert(conn, 1, PackageType::Conan, "ConanPackage", 10)
                .unwrap();
        assert!(inserted);
        assert_eq!(created.lower_name, "conanpackage");

        let (found, inserted) =
            PackageRepository::get_or_insert(conn, 1, PackageType::Conan, "conanpackage", 20)
                .unwrap();
        assert!(!inserted);
        assert_eq!(found.id, created.id);
        assert_eq!(found.name, "ConanPackage");

        assert!(
            PackageRepository::find(conn, 2, PackageType::Conan, "ConanPackage")
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_delete() {
        let mut db = DbConnection::open_in_memory().unwrap();
        let conn = db.conn();

        let (package, _) =
            PackageRepository::get_or_insert(conn, 1, PackageType::Conan, "zlib", 10).unwrap();
        assert!(!PackageRepository::has_versions(conn, package.id).unwrap());
        assert_eq!(PackageRepository::delete(conn, package.id).unwrap(), 1);
        assert!(PackageRepository::find_by_id(conn, package.id)
            .unwrap()
            .is_none());
    }
}
