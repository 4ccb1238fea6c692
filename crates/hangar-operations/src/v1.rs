//! Operations of the v1 protocol. Revisions are implicit: references without a revision
//! address the default one, and deletions span every revision.

use std::collections::{BTreeMap, HashMap};

use hangar_conan::{
    constants::{is_package_file, is_recipe_file},
    Conaninfo, PackageReference, RecipeReference, RecipeSearchQuery,
};
use hangar_core::{
    package::{remove::DeleteOutcome, search},
    RegistryResult,
};
use tracing::debug;

use crate::{
    files::{self, package_files_url, recipe_files_url},
    RegistryContext, SearchResult, Snapshot, UrlMap,
};

/// Filename to MD5 digest of the recipe files.
pub fn recipe_snapshot(ctx: &RegistryContext, rref: &RecipeReference) -> RegistryResult<Snapshot> {
    files::snapshot(ctx, rref, &rref.as_key())
}

pub fn package_snapshot(ctx: &RegistryContext, pref: &PackageReference) -> RegistryResult<Snapshot> {
    files::snapshot(ctx, pref.recipe(), &pref.as_key())
}

pub fn recipe_download_urls(
    ctx: &RegistryContext,
    rref: &RecipeReference,
) -> RegistryResult<UrlMap> {
    files::download_urls(ctx, rref, &rref.as_key(), &recipe_files_url(ctx, rref))
}

pub fn package_download_urls(
    ctx: &RegistryContext,
    pref: &PackageReference,
) -> RegistryResult<UrlMap> {
    files::download_urls(
        ctx,
        pref.recipe(),
        &pref.as_key(),
        &package_files_url(ctx, pref),
    )
}

/// Upload URLs for the recipe files among `files` (filename to size).
pub fn recipe_upload_urls(
    ctx: &RegistryContext,
    rref: &RecipeReference,
    files: &HashMap<String, i64>,
) -> UrlMap {
    files::upload_urls(files.keys(), is_recipe_file, &recipe_files_url(ctx, rref))
}

/// Upload URLs for the package files among `files` (filename to size).
pub fn package_upload_urls(
    ctx: &RegistryContext,
    pref: &PackageReference,
    files: &HashMap<String, i64>,
) -> UrlMap {
    files::upload_urls(files.keys(), is_package_file, &package_files_url(ctx, pref))
}

/// Recipes matching a query such as `zlib/1.*@conan/*`, capped by the configured limit.
pub fn search_recipes(ctx: &RegistryContext, query: &str) -> RegistryResult<SearchResult> {
    let query = RecipeSearchQuery::parse(query);
    let limit = ctx.config().search_limit();

    let recipes = ctx
        .db()
        .with_conn(|conn| search::search_recipes(conn, ctx.owner_id(), &query, Some(limit)))?;
    debug!("{} recipe(s) match {:?}", recipes.len(), query);

    Ok(SearchResult {
        results: recipes.into_iter().collect(),
    })
}

/// Binary packages of every recipe revision.
pub fn search_packages(
    ctx: &RegistryContext,
    rref: &RecipeReference,
) -> RegistryResult<BTreeMap<String, Conaninfo>> {
    ctx.db()
        .with_conn(|conn| search::search_packages(conn, ctx.owner_id(), rref, true))
}

/// Deletes every revision of the recipe.
pub fn delete_recipe(ctx: &RegistryContext, rref: &RecipeReference) -> RegistryResult<DeleteOutcome> {
    ctx.remover().remove_recipe(rref, true)
}

/// Deletes the named packages, or all packages when `package_ids` is empty.
pub fn delete_packages(
    ctx: &RegistryContext,
    rref: &RecipeReference,
    package_ids: &[String],
) -> RegistryResult<DeleteOutcome> {
    ctx.remover().remove_package_ids(rref, package_ids)
}
