use hangar_conan::RecipeReference;
use hangar_core::{package::remove::DeleteOutcome, RegistryResult};
use hangar_operations::{v1, v2, RegistryContext};
use nu_ansi_term::Color::{Blue, Red};
use serde::Serialize;
use tracing::{debug, info};

use crate::utils::{package_reference, print_json, Colored};

#[derive(Serialize)]
struct RemoveReport {
    reference: String,
    files_removed: usize,
    version_deleted: bool,
}

pub fn remove(
    ctx: &RegistryContext,
    rref: &RecipeReference,
    packages: &[String],
    all_revisions: bool,
    json: bool,
) -> RegistryResult<()> {
    let outcome = if packages.is_empty() {
        if all_revisions {
            v1::delete_recipe(ctx, rref)?
        } else {
            v2::delete_recipe(ctx, rref)?
        }
    } else if all_revisions {
        let ids: Vec<String> = packages
            .iter()
            .map(|spec| spec.split_once('#').map_or(spec.as_str(), |(id, _)| id).to_string())
            .collect();
        v1::delete_packages(ctx, rref, &ids)?
    } else {
        let mut total = DeleteOutcome::default();
        for spec in packages {
            let pref = package_reference(rref, spec)?;
            debug!("removing {}", pref);
            total.merge(v2::delete_package(ctx, rref, Some(&pref))?);
        }
        total
    };

    if json {
        return print_json(&RemoveReport {
            reference: rref.to_string(),
            files_removed: outcome.files_removed,
            version_deleted: outcome.version_deleted,
        });
    }

    info!(
        "Removed {} file(s) of {}",
        Colored(Red, outcome.files_removed),
        Colored(Blue, rref)
    );
    if outcome.version_deleted {
        info!("{}/{} has no files left and was deleted", rref.name(), rref.version());
    }
    Ok(())
}
