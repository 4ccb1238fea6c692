use hangar_conan::{PackageReference, RecipeReference};
use hangar_core::RegistryResult;
use hangar_operations::{v1, v2, RegistryContext, RevisionInfo};
use nu_ansi_term::Color::{Blue, Cyan, Green, Yellow};
use tabled::{
    builder::Builder,
    settings::{peaker::PriorityMax, themes::BorderCorrection, Panel, Style, Width},
};
use tracing::info;

use crate::utils::{print_json, term_width, Colored};

fn render(mut builder: Builder, header: String) -> String {
    builder
        .build()
        .with(Panel::header(header))
        .with(Style::rounded())
        .with(BorderCorrection {})
        .with(Width::wrap(term_width()).priority(PriorityMax::default()))
        .to_string()
}

fn revision_row(info: &RevisionInfo) -> [String; 2] {
    [
        Colored(Cyan, &info.revision).to_string(),
        info.time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    ]
}

pub fn list_revisions(
    ctx: &RegistryContext,
    rref: &RecipeReference,
    pref: Option<&PackageReference>,
    json: bool,
) -> RegistryResult<()> {
    let list = match pref {
        Some(pref) => v2::list_package_revisions(ctx, pref)?,
        None => v2::list_recipe_revisions(ctx, rref)?,
    };

    if json {
        return print_json(&list);
    }

    let mut builder = Builder::new();
    builder.push_record(["Revision", "Time"]);
    for revision in &list.revisions {
        builder.push_record(revision_row(revision));
    }
    info!("\n{}", render(builder, list.reference));
    Ok(())
}

pub fn latest_revision(
    ctx: &RegistryContext,
    rref: &RecipeReference,
    pref: Option<&PackageReference>,
    json: bool,
) -> RegistryResult<()> {
    let latest = match pref {
        Some(pref) => v2::latest_package_revision(ctx, pref)?,
        None => v2::latest_recipe_revision(ctx, rref)?,
    };

    if json {
        return print_json(&latest);
    }

    let [revision, time] = revision_row(&latest);
    info!("{} ({})", revision, time);
    Ok(())
}

pub fn search_recipes(ctx: &RegistryContext, query: Option<&str>, json: bool) -> RegistryResult<()> {
    let result = v1::search_recipes(ctx, query.unwrap_or_default())?;

    if json {
        return print_json(&result);
    }

    if result.results.is_empty() {
        info!("No recipes found");
        return Ok(());
    }

    for recipe in &result.results {
        info!("{}", Colored(Blue, recipe));
    }
    info!(
        "{} recipe(s) found",
        Colored(Green, result.results.len())
    );
    Ok(())
}

fn join_pairs<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (&'a String, &'a String)>,
{
    pairs
        .into_iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn list_packages(
    ctx: &RegistryContext,
    rref: &RecipeReference,
    all_revisions: bool,
    json: bool,
) -> RegistryResult<()> {
    let packages = if all_revisions {
        v1::search_packages(ctx, rref)?
    } else {
        v2::search_packages(ctx, rref)?
    };

    if json {
        return print_json(&packages);
    }

    if packages.is_empty() {
        info!("No packages found for {}", rref);
        return Ok(());
    }

    let mut builder = Builder::new();
    builder.push_record(["Package", "Settings", "Options", "Requires"]);
    for (reference, info) in &packages {
        builder.push_record([
            Colored(Cyan, reference).to_string(),
            join_pairs(&info.settings),
            join_pairs(&info.options),
            info.requires.join("\n"),
        ]);
    }
    info!("\n{}", render(builder, rref.to_string()));
    Ok(())
}

pub fn list_files(
    ctx: &RegistryContext,
    rref: &RecipeReference,
    pref: Option<&PackageReference>,
    json: bool,
) -> RegistryResult<()> {
    let (title, snapshot, urls) = match pref {
        Some(pref) => (
            pref.to_string(),
            v1::package_snapshot(ctx, pref)?,
            v1::package_download_urls(ctx, pref)?,
        ),
        None => (
            rref.to_string(),
            v1::recipe_snapshot(ctx, rref)?,
            v1::recipe_download_urls(ctx, rref)?,
        ),
    };

    if json {
        return print_json(&snapshot);
    }

    let mut builder = Builder::new();
    builder.push_record(["File", "Hash", "URL"]);
    for (name, hash) in &snapshot {
        builder.push_record([
            Colored(Yellow, name).to_string(),
            hash.clone(),
            urls.get(name).cloned().unwrap_or_default(),
        ]);
    }
    info!("\n{}", render(builder, title));
    Ok(())
}
