use std::{fs, path::Path};

use hangar_conan::{PackageReference, RecipeReference};
use hangar_core::{
    error::{ErrorContext, RegistryError},
    package::upload::UploadOutcome,
    RegistryResult,
};
use hangar_operations::{files, RegistryContext};
use nu_ansi_term::Color::{Cyan, Green, Yellow};
use serde::Serialize;
use tracing::{debug, info};

use crate::utils::{print_json, Colored};

#[derive(Serialize)]
struct UploadedFile {
    file: String,
    stored: bool,
    replaced: bool,
    hash: Option<String>,
}

pub fn upload_files(
    ctx: &RegistryContext,
    rref: &RecipeReference,
    pref: Option<&PackageReference>,
    paths: &[String],
    json: bool,
) -> RegistryResult<()> {
    let mut uploaded = Vec::with_capacity(paths.len());

    for path in paths {
        let path = Path::new(path);
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| RegistryError::InvalidFilename(path.display().to_string()))?;
        let content = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        debug!("uploading {} ({} bytes)", path.display(), content.len());

        let outcome = match pref {
            Some(pref) => files::upload_package_file(ctx, pref, filename, &content)?,
            None => files::upload_recipe_file(ctx, rref, filename, &content)?,
        };

        let entry = match outcome {
            UploadOutcome::Ignored => {
                info!("{} {} (empty)", Colored(Yellow, "skipped"), filename);
                UploadedFile {
                    file: filename.to_string(),
                    stored: false,
                    replaced: false,
                    hash: None,
                }
            }
            UploadOutcome::Stored(stored) => {
                let action = if stored.replaced { "replaced" } else { "stored" };
                info!(
                    "{} {} as {}",
                    Colored(Green, action),
                    stored.name,
                    Colored(Cyan, &stored.composite_key)
                );
                UploadedFile {
                    file: stored.name,
                    stored: true,
                    replaced: stored.replaced,
                    hash: Some(stored.blob_hash),
                }
            }
        };
        uploaded.push(entry);
    }

    if json {
        print_json(&uploaded)?;
    }

    Ok(())
}
