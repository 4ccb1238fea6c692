//! Recipe and binary package search.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use diesel::SqliteConnection;
use hangar_conan::{
    conaninfo::Conaninfo,
    constants::{
        PROPERTY_PACKAGE_INFO, PROPERTY_PACKAGE_REFERENCE, PROPERTY_PACKAGE_REVISION,
        PROPERTY_RECIPE_CHANNEL, PROPERTY_RECIPE_REVISION, PROPERTY_RECIPE_USER,
    },
    PackageReference, RecipeReference, RecipeSearchQuery,
};
use hangar_db::{
    models::types::{PackageType, PropertyType, TextMatch},
    repository::{FileRepository, FileSearchOptions, LeadFileSearch, PropertyRepository},
};
use tracing::{debug, trace};

use crate::{
    error::RegistryError,
    package::{files::find_version, revision},
    RegistryResult,
};

/// Finds the recipes of an owner matching `query`, formatted as
/// `name/version[@user/channel]`. `limit` caps the number of distinct recipes returned.
pub fn search_recipes(
    conn: &mut SqliteConnection,
    owner_id: i64,
    query: &RecipeSearchQuery,
    limit: Option<usize>,
) -> RegistryResult<BTreeSet<String>> {
    let mut properties = Vec::new();
    if let Some(user) = &query.user {
        properties.push((PROPERTY_RECIPE_USER, TextMatch::from_wildcard(user)));
    }
    if let Some(channel) = &query.channel {
        properties.push((PROPERTY_RECIPE_CHANNEL, TextMatch::from_wildcard(channel)));
    }

    let lead_files = FileRepository::search_lead(
        conn,
        &LeadFileSearch {
            owner_id,
            package_type: PackageType::Conan,
            name: query.name.as_deref().map(TextMatch::from_wildcard),
            version: query.version.as_deref().map(TextMatch::from_wildcard),
            properties,
        },
    )?;
    trace!("{} lead file(s) match {:?}", lead_files.len(), query);

    let mut recipes = BTreeSet::new();
    for lead in lead_files {
        let user = PropertyRepository::get_by_ref_and_name(
            conn,
            PropertyType::File,
            lead.file_id,
            PROPERTY_RECIPE_USER,
        )?
        .unwrap_or_default();
        let channel = PropertyRepository::get_by_ref_and_name(
            conn,
            PropertyType::File,
            lead.file_id,
            PROPERTY_RECIPE_CHANNEL,
        )?
        .unwrap_or_default();

        let recipe = if user.is_empty() || channel.is_empty() {
            format!("{}/{}", lead.package_name, lead.version)
        } else {
            format!("{}/{}@{}/{}", lead.package_name, lead.version, user, channel)
        };
        recipes.insert(recipe);
    }

    if let Some(limit) = limit.filter(|limit| recipes.len() > *limit) {
        debug!("truncating {} recipe(s) to {}", recipes.len(), limit);
        recipes = recipes.into_iter().take(limit).collect();
    }

    Ok(recipes)
}

/// Reads the stored `conaninfo.txt` of a package revision (the default revision when unset).
///
/// # Errors
///
/// * [`RegistryError::PackageNotExist`] if the package version does not exist.
/// * [`RegistryError::PackageReferenceNotExist`] if no info was recorded for the package.
pub fn get_package_info(
    conn: &mut SqliteConnection,
    owner_id: i64,
    pref: &PackageReference,
) -> RegistryResult<Conaninfo> {
    let rref = pref.recipe();
    let version = find_version(conn, owner_id, rref)?;

    let files = FileRepository::search(
        conn,
        &FileSearchOptions {
            version_id: Some(version.id),
            properties: vec![
                (PROPERTY_RECIPE_USER, rref.user()),
                (PROPERTY_RECIPE_CHANNEL, rref.channel()),
                (PROPERTY_RECIPE_REVISION, rref.revision_or_default()),
                (PROPERTY_PACKAGE_REFERENCE, pref.reference()),
                (PROPERTY_PACKAGE_REVISION, pref.revision_or_default()),
            ],
            ..Default::default()
        },
    )?;

    for file in files {
        if let Some(info) = PropertyRepository::get_by_ref_and_name(
            conn,
            PropertyType::File,
            file.id,
            PROPERTY_PACKAGE_INFO,
        )? {
            return Ok(serde_json::from_str(&info)?);
        }
    }

    Err(RegistryError::PackageReferenceNotExist(pref.to_string()))
}

/// Maps every binary package of a recipe to its build configuration.
///
/// With `all_revisions` the packages of every recipe revision are listed, otherwise only
/// those of the requested revision, or of the latest one when the reference has none. A
/// package id seen in a newer recipe revision shadows older ones. Each package is
/// described by its latest package revision.
pub fn search_packages(
    conn: &mut SqliteConnection,
    owner_id: i64,
    rref: &RecipeReference,
    all_revisions: bool,
) -> RegistryResult<BTreeMap<String, Conaninfo>> {
    let recipe_revisions: Vec<RecipeReference> = if all_revisions {
        revision::recipe_revisions(conn, owner_id, rref)?
            .into_iter()
            .map(|value| rref.with_revision(&value.value))
            .collect()
    } else if !rref.has_revision() {
        let latest = revision::last_recipe_revision(conn, owner_id, rref)?;
        vec![rref.with_revision(&latest.value)]
    } else {
        if !revision::recipe_exists(conn, owner_id, rref)? {
            return Err(RegistryError::RecipeReferenceNotExist(rref.coordinate()));
        }
        vec![rref.clone()]
    };

    let mut seen = HashSet::new();
    let mut packages = BTreeMap::new();
    for recipe in recipe_revisions {
        for reference in revision::package_references(conn, owner_id, &recipe)? {
            if !seen.insert(reference.value.clone()) {
                continue;
            }

            let pref = PackageReference::new(recipe.clone(), &reference.value, "")?;
            let last = revision::last_package_revision(conn, owner_id, &pref)?;
            let info = get_package_info(conn, owner_id, &pref.with_revision(&last.value))?;
            packages.insert(reference.value, info);
        }
    }

    debug!("{} package(s) found for {}", packages.len(), rref);
    Ok(packages)
}
