use diesel::prelude::*;

use crate::{
    models::{
        registry::{NewPackageProperty, PackageProperty},
        types::PropertyType,
    },
    schema::package_properties,
};

/// Repository for name/value properties attached to versions, files and packages.
pub struct PropertyRepository;

impl PropertyRepository {
    pub fn insert(
        conn: &mut SqliteConnection,
        ref_type: PropertyType,
        ref_id: i32,
        name: &str,
        value: &str,
    ) -> QueryResult<usize> {
        diesel::insert_into(package_properties::table)
            .values(&NewPackageProperty {
                ref_type: ref_type.code(),
                ref_id,
                name,
                value,
            })
            .execute(conn)
    }

    /// Inserts several properties on the same row.
    pub fn insert_many(
        conn: &mut SqliteConnection,
        ref_type: PropertyType,
        ref_id: i32,
        properties: &[(&str, &str)],
    ) -> QueryResult<usize> {
        if properties.is_empty() {
            return Ok(0);
        }

        let rows: Vec<NewPackageProperty> = properties
            .iter()
            .map(|&(name, value)| {
                NewPackageProperty {
                    ref_type: ref_type.code(),
                    ref_id,
                    name,
                    value,
                }
            })
            .collect();

        diesel::insert_into(package_properties::table)
            .values(&rows)
            .execute(conn)
    }

    pub fn get_by_ref(
        conn: &mut SqliteConnection,
        ref_type: PropertyType,
        ref_id: i32,
    ) -> QueryResult<Vec<PackageProperty>> {
        package_properties::table
            .filter(package_properties::ref_type.eq(ref_type.code()))
            .filter(package_properties::ref_id.eq(ref_id))
            .order(package_properties::id.asc())
            .select(PackageProperty::as_select())
            .load(conn)
    }

    /// Gets the first value of a named property on a row.
    pub fn get_by_ref_and_name(
        conn: &mut SqliteConnection,
        ref_type: PropertyType,
        ref_id: i32,
        name: &str,
    ) -> QueryResult<Option<String>> {
        package_properties::table
            .filter(package_properties::ref_type.eq(ref_type.code()))
            .filter(package_properties::ref_id.eq(ref_id))
            .filter(package_properties::name.eq(name))
            .order(package_properties::id.asc())
            .select(package_properties::value)
            .first(conn)
            .optional()
    }

    /// Replaces every value of a named property on a row with a single value.
    pub fn set(
        conn: &mut SqliteConnection,
        ref_type: PropertyType,
        ref_id: i32,
        name: &str,
        value: &str,
    ) -> QueryResult<usize> {
        diesel::delete(
            package_properties::table
                .filter(package_properties::ref_type.eq(ref_type.code()))
                .filter(package_properties::ref_id.eq(ref_id))
                .filter(package_properties::name.eq(name)),
        )
        .execute(conn)?;

        Self::insert(conn, ref_type, ref_id, name, value)
    }

    pub fn delete_by_ref(
        conn: &mut SqliteConnection,
        ref_type: PropertyType,
        ref_id: i32,
    ) -> QueryResult<usize> {
        diesel::delete(
            package_properties::table
                .filter(package_properties::ref_type.eq(ref_type.code()))
                .filter(package_properties::ref_id.eq(ref_id)),
        )
        .execute(conn)
    }

    pub fn delete_by_refs(
        conn: &mut SqliteConnection,
        ref_type: PropertyType,
        ref_ids: &[i32],
    ) -> QueryResult<usize> {
        if ref_ids.is_empty() {
            return Ok(0);
        }

        diesel::delete(
            package_properties::table
                .filter(package_properties::ref_type.eq(ref_type.code()))
                .filter(package_properties::ref_id.eq_any(ref_ids)),
        )
        .execute(conn)
    }
}
