//! Operations of the v2 protocol, which addresses every revision explicitly.

use std::collections::BTreeMap;

use hangar_conan::{Conaninfo, PackageReference, RecipeReference};
use hangar_core::{
    error::RegistryError,
    package::{remove::DeleteOutcome, search},
    RegistryResult,
};
use tracing::debug;

use crate::{files, FileList, RegistryContext, RevisionInfo, RevisionList};

pub fn latest_recipe_revision(
    ctx: &RegistryContext,
    rref: &RecipeReference,
) -> RegistryResult<RevisionInfo> {
    ctx.resolver().last_recipe_revision(rref).map(Into::into)
}

pub fn latest_package_revision(
    ctx: &RegistryContext,
    pref: &PackageReference,
) -> RegistryResult<RevisionInfo> {
    ctx.resolver().last_package_revision(pref).map(Into::into)
}

/// Revisions of the recipe, newest first.
///
/// # Errors
///
/// [`RegistryError::RecipeReferenceNotExist`] if the recipe has no revision.
pub fn list_recipe_revisions(
    ctx: &RegistryContext,
    rref: &RecipeReference,
) -> RegistryResult<RevisionList> {
    let revisions = ctx.resolver().recipe_revisions(rref)?;
    if revisions.is_empty() {
        return Err(RegistryError::RecipeReferenceNotExist(rref.coordinate()));
    }

    Ok(RevisionList {
        reference: rref.coordinate(),
        revisions: revisions.into_iter().map(Into::into).collect(),
    })
}

/// Revisions of the package, newest first.
///
/// # Errors
///
/// [`RegistryError::PackageReferenceNotExist`] if the package has no revision.
pub fn list_package_revisions(
    ctx: &RegistryContext,
    pref: &PackageReference,
) -> RegistryResult<RevisionList> {
    let revisions = ctx.resolver().package_revisions(pref)?;
    if revisions.is_empty() {
        return Err(RegistryError::PackageReferenceNotExist(pref.to_string()));
    }

    Ok(RevisionList {
        reference: pref.to_string(),
        revisions: revisions.into_iter().map(Into::into).collect(),
    })
}

pub fn list_recipe_files(ctx: &RegistryContext, rref: &RecipeReference) -> RegistryResult<FileList> {
    files::file_list(ctx, rref, &rref.as_key())
}

pub fn list_package_files(
    ctx: &RegistryContext,
    pref: &PackageReference,
) -> RegistryResult<FileList> {
    files::file_list(ctx, pref.recipe(), &pref.as_key())
}

/// Binary packages of the requested recipe revision, or of the latest one.
pub fn search_packages(
    ctx: &RegistryContext,
    rref: &RecipeReference,
) -> RegistryResult<BTreeMap<String, Conaninfo>> {
    ctx.db()
        .with_conn(|conn| search::search_packages(conn, ctx.owner_id(), rref, false))
}

/// Deletes one recipe revision, or every revision when the reference has none.
pub fn delete_recipe(ctx: &RegistryContext, rref: &RecipeReference) -> RegistryResult<DeleteOutcome> {
    ctx.remover().remove_recipe(rref, !rref.has_revision())
}

/// Deletes one package (all of its revisions unless one is given), or every package of
/// the recipe revision.
pub fn delete_package(
    ctx: &RegistryContext,
    rref: &RecipeReference,
    pref: Option<&PackageReference>,
) -> RegistryResult<DeleteOutcome> {
    debug!(
        "deleting {} of {}",
        pref.map(|p| p.reference()).unwrap_or("all packages"),
        rref
    );
    ctx.remover().remove_packages(rref, pref)
}
