use diesel::prelude::*;

use crate::schema::*;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = packages)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Package {
    pub id: i32,
    pub owner_id: i64,
    pub package_type: String,
    pub name: String,
    pub lower_name: String,
    pub created_unix: i64,
}

#[derive(Insertable)]
#[diesel(table_name = packages)]
pub struct NewPackage<'a> {
    pub owner_id: i64,
    pub package_type: &'a str,
    pub name: &'a str,
    pub lower_name: &'a str,
    pub created_unix: i64,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = package_versions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PackageVersion {
    pub id: i32,
    pub package_id: i32,
    pub version: String,
    pub lower_version: String,
    pub metadata_json: Option<String>,
    pub created_unix: i64,
}

#[derive(Insertable)]
#[diesel(table_name = package_versions)]
pub struct NewPackageVersion<'a> {
    pub package_id: i32,
    pub version: &'a str,
    pub lower_version: &'a str,
    pub metadata_json: Option<&'a str>,
    pub created_unix: i64,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = package_blobs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PackageBlob {
    pub id: i32,
    pub size: i64,
    pub hash_blake3: String,
    /// Served to v1 clients, which check file digests with MD5.
    pub hash_md5: String,
    pub created_unix: i64,
}

#[derive(Insertable)]
#[diesel(table_name = package_blobs)]
pub struct NewPackageBlob<'a> {
    pub size: i64,
    pub hash_blake3: &'a str,
    pub hash_md5: &'a str,
    pub created_unix: i64,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = package_files)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PackageFile {
    pub id: i32,
    pub version_id: i32,
    pub blob_id: i32,
    pub name: String,
    pub lower_name: String,
    pub composite_key: String,
    pub is_lead: bool,
    pub created_unix: i64,
}

#[derive(Insertable)]
#[diesel(table_name = package_files)]
pub struct NewPackageFile<'a> {
    pub version_id: i32,
    pub blob_id: i32,
    pub name: &'a str,
    pub lower_name: &'a str,
    pub composite_key: &'a str,
    pub is_lead: bool,
    pub created_unix: i64,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = package_properties)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PackageProperty {
    pub id: i32,
    pub ref_type: i32,
    pub ref_id: i32,
    pub name: String,
    pub value: String,
}

#[derive(Insertable)]
#[diesel(table_name = package_properties)]
pub struct NewPackageProperty<'a> {
    pub ref_type: i32,
    pub ref_id: i32,
    pub name: &'a str,
    pub value: &'a str,
}

/// One distinct value of a property together with the creation time of the newest file
/// carrying it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyValue {
    pub value: String,
    pub created_unix: i64,
}

/// A lead file with the coordinates of its package version.
#[derive(Debug, Clone, PartialEq, Eq, Queryable)]
pub struct LeadFile {
    pub package_name: String,
    pub version: String,
    pub file_id: i32,
}
