use diesel::{dsl::max, prelude::*};

use crate::{
    models::{
        registry::{LeadFile, NewPackageFile, PackageFile, PropertyValue},
        types::{PackageType, PropertyType, TextMatch},
    },
    schema::{package_files, package_properties, package_versions, packages},
};

/// Filters for [`FileRepository::search`]. Every property pair must match.
#[derive(Debug, Default)]
pub struct FileSearchOptions<'a> {
    pub version_id: Option<i32>,
    pub composite_key: Option<&'a str>,
    pub lower_name: Option<&'a str>,
    pub properties: Vec<(&'a str, &'a str)>,
}

/// Filters for [`FileRepository::search_lead`]. Name and version are matched against the
/// lowercased columns.
#[derive(Debug)]
pub struct LeadFileSearch<'a> {
    pub owner_id: i64,
    pub package_type: PackageType,
    pub name: Option<TextMatch>,
    pub version: Option<TextMatch>,
    pub properties: Vec<(&'a str, TextMatch)>,
}

/// Repository for package file rows.
pub struct FileRepository;

impl FileRepository {
    /// Finds a file of a version by case-insensitive name and composite key.
    pub fn find(
        conn: &mut SqliteConnection,
        version_id: i32,
        name: &str,
        composite_key: &str,
    ) -> QueryResult<Option<PackageFile>> {
        package_files::table
            .filter(package_files::version_id.eq(version_id))
            .filter(package_files::lower_name.eq(name.to_lowercase()))
            .filter(package_files::composite_key.eq(composite_key))
            .select(PackageFile::as_select())
            .first(conn)
            .optional()
    }

    pub fn insert(conn: &mut SqliteConnection, file: &NewPackageFile) -> QueryResult<PackageFile> {
        diesel::insert_into(package_files::table)
            .values(file)
            .returning(PackageFile::as_returning())
            .get_result(conn)
    }

    pub fn find_by_id(conn: &mut SqliteConnection, id: i32) -> QueryResult<Option<PackageFile>> {
        package_files::table
            .filter(package_files::id.eq(id))
            .select(PackageFile::as_select())
            .first(conn)
            .optional()
    }

    pub fn list_by_version(
        conn: &mut SqliteConnection,
        version_id: i32,
    ) -> QueryResult<Vec<PackageFile>> {
        package_files::table
            .filter(package_files::version_id.eq(version_id))
            .order(package_files::id.asc())
            .select(PackageFile::as_select())
            .load(conn)
    }

    /// Searches files matching every given filter, ordered by id.
    pub fn search(
        conn: &mut SqliteConnection,
        options: &FileSearchOptions,
    ) -> QueryResult<Vec<PackageFile>> {
        let mut query = package_files::table.into_boxed();

        if let Some(version_id) = options.version_id {
            query = query.filter(package_files::version_id.eq(version_id));
        }
        if let Some(key) = options.composite_key {
            query = query.filter(package_files::composite_key.eq(key));
        }
        if let Some(name) = options.lower_name {
            query = query.filter(package_files::lower_name.eq(name));
        }
        for &(name, value) in &options.properties {
            query = query.filter(
                package_files::id.eq_any(
                    package_properties::table
                        .filter(package_properties::ref_type.eq(PropertyType::File.code()))
                        .filter(package_properties::name.eq(name))
                        .filter(package_properties::value.eq(value))
                        .select(package_properties::ref_id),
                ),
            );
        }

        query
            .order(package_files::id.asc())
            .select(PackageFile::as_select())
            .load(conn)
    }

    /// Groups the values of a property over the given files. Each value carries the
    /// creation time of its newest file; results are newest first, ties broken by the
    /// most recently inserted file.
    pub fn property_values(
        conn: &mut SqliteConnection,
        name: &str,
        file_ids: &[i32],
    ) -> QueryResult<Vec<PropertyValue>> {
        if file_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<(String, Option<i64>, Option<i32>)> = package_properties::table
            .inner_join(package_files::table.on(package_files::id.eq(package_properties::ref_id)))
            .filter(package_properties::ref_type.eq(PropertyType::File.code()))
            .filter(package_properties::name.eq(name))
            .filter(package_files::id.eq_any(file_ids))
            .group_by(package_properties::value)
            .select((
                package_properties::value,
                max(package_files::created_unix),
                max(package_files::id),
            ))
            .load(conn)?;

        let mut rows: Vec<(String, i64, i32)> = rows
            .into_iter()
            .map(|(value, created, id)| (value, created.unwrap_or(0), id.unwrap_or(0)))
            .collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then(b.2.cmp(&a.2)));

        Ok(rows
            .into_iter()
            .map(|(value, created_unix, _)| {
                PropertyValue {
                    value,
                    created_unix,
                }
            })
            .collect())
    }

    /// Searches lead files of an owner's packages, returning package name, version and
    /// file id.
    pub fn search_lead(
        conn: &mut SqliteConnection,
        search: &LeadFileSearch,
    ) -> QueryResult<Vec<LeadFile>> {
        let mut query = package_files::table
            .inner_join(package_versions::table.inner_join(packages::table))
            .filter(package_files::is_lead.eq(true))
            .filter(packages::owner_id.eq(search.owner_id))
            .filter(packages::package_type.eq(search.package_type.as_str()))
            .into_boxed();

        match &search.name {
            Some(TextMatch::Exact(name)) => {
                query = query.filter(packages::lower_name.eq(name.to_lowercase()));
            }
            Some(TextMatch::Like(pattern)) => {
                query = query.filter(
                    packages::lower_name
                        .like(pattern.to_lowercase())
                        .escape('\\'),
                );
            }
            None => {}
        }

        match &search.version {
            Some(TextMatch::Exact(version)) => {
                query = query.filter(package_versions::lower_version.eq(version.to_lowercase()));
            }
            Some(TextMatch::Like(pattern)) => {
                query = query.filter(
                    package_versions::lower_version
                        .like(pattern.to_lowercase())
                        .escape('\\'),
                );
            }
            None => {}
        }

        for (name, matcher) in &search.properties {
            let name = *name;
            query = match matcher {
                TextMatch::Exact(value) => {
                    query.filter(
                        package_files::id.eq_any(
                            package_properties::table
                                .filter(package_properties::ref_type.eq(PropertyType::File.code()))
                                .filter(package_properties::name.eq(name))
                                .filter(package_properties::value.eq(value.clone()))
                                .select(package_properties::ref_id),
                        ),
                    )
                }
                TextMatch::Like(pattern) => {
                    query.filter(
                        package_files::id.eq_any(
                            package_properties::table
                                .filter(package_properties::ref_type.eq(PropertyType::File.code()))
                                .filter(package_properties::name.eq(name))
                                .filter(package_properties::value.like(pattern.clone()).escape('\\'))
                                .select(package_properties::ref_id),
                        ),
                    )
                }
            };
        }

        query
            .order((
                packages::lower_name.asc(),
                package_versions::lower_version.asc(),
                package_files::id.asc(),
            ))
            .select((packages::name, package_versions::version, package_files::id))
            .load::<LeadFile>(conn)
    }

    /// Deletes file rows and returns the ids of the blobs they pointed at.
    pub fn delete_many(conn: &mut SqliteConnection, ids: &[i32]) -> QueryResult<Vec<i32>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut blob_ids: Vec<i32> = package_files::table
            .filter(package_files::id.eq_any(ids))
            .select(package_files::blob_id)
            .load(conn)?;
        blob_ids.sort_unstable();
        blob_ids.dedup();

        diesel::delete(package_files::table.filter(package_files::id.eq_any(ids)))
            .execute(conn)?;

        Ok(blob_ids)
    }
}
