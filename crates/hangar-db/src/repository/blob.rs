use diesel::prelude::*;

use crate::{
    models::registry::{NewPackageBlob, PackageBlob},
    schema::{package_blobs, package_files},
};

/// Repository for content-addressed blob rows.
pub struct BlobRepository;

impl BlobRepository {
    pub fn find_by_hash(conn: &mut SqliteConnection, hash: &str) -> QueryResult<Option<PackageBlob>> {
        package_blobs::table
            .filter(package_blobs::hash_blake3.eq(hash))
            .select(PackageBlob::as_select())
            .first(conn)
            .optional()
    }

    pub fn find_by_id(conn: &mut SqliteConnection, id: i32) -> QueryResult<Option<PackageBlob>> {
        package_blobs::table
            .filter(package_blobs::id.eq(id))
            .select(PackageBlob::as_select())
            .first(conn)
            .optional()
    }

    pub fn find_by_ids(conn: &mut SqliteConnection, ids: &[i32]) -> QueryResult<Vec<PackageBlob>> {
        package_blobs::table
            .filter(package_blobs::id.eq_any(ids))
            .select(PackageBlob::as_select())
            .load(conn)
    }

    /// Returns the blob with the given blake3 hash, inserting it first if unknown.
    /// The flag is true when inserted.
    pub fn get_or_insert(
        conn: &mut SqliteConnection,
        hash: &str,
        hash_md5: &str,
        size: i64,
        created_unix: i64,
    ) -> QueryResult<(PackageBlob, bool)> {
        if let Some(blob) = Self::find_by_hash(conn, hash)? {
            return Ok((blob, false));
        }

        let blob = diesel::insert_into(package_blobs::table)
            .values(&NewPackageBlob {
                size,
                hash_blake3: hash,
                hash_md5,
                created_unix,
            })
            .returning(PackageBlob::as_returning())
            .get_result(conn)?;

        Ok((blob, true))
    }

    /// Returns true while any file row still points at the blob.
    pub fn is_referenced(conn: &mut SqliteConnection, id: i32) -> QueryResult<bool> {
        diesel::select(diesel::dsl::exists(
            package_files::table.filter(package_files::blob_id.eq(id)),
        ))
        .get_result(conn)
    }

    pub fn delete(conn: &mut SqliteConnection, id: i32) -> QueryResult<usize> {
        diesel::delete(package_blobs::table.filter(package_blobs::id.eq(id))).execute(conn)
    }
}
