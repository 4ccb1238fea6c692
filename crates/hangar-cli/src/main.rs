use std::{env, sync::Arc};

use clap::Parser;
use cli::{Args, Commands};
use hangar_conan::{PackageReference, RecipeReference};
use hangar_config::config::{self, generate_default_config, get_config, Config, CONFIG_PATH};
use hangar_core::{error::ErrorContext, RegistryResult};
use hangar_events::{ChannelSink, EventSinkHandle};
use hangar_operations::RegistryContext;
use hangar_utils::path::resolve_path;
use list::{latest_revision, list_files, list_packages, list_revisions, search_recipes};
use logging::setup_logging;
use remove::remove;
use tracing::{debug, info};
use upload::upload_files;
use utils::{disable_colors, package_reference};

mod cli;
mod list;
mod logging;
mod remove;
mod upload;
mod utils;

fn set_config_path(path: &str) -> RegistryResult<()> {
    let path = resolve_path(path)?;
    let path = if path.is_absolute() {
        path
    } else {
        env::current_dir()
            .with_context(|| "retrieving current directory".into())?
            .join(path)
    };
    let mut config_path = CONFIG_PATH.write()?;
    *config_path = path;
    Ok(())
}

fn handle_cli() -> RegistryResult<()> {
    let args = Args::parse();

    setup_logging(&args);

    if args.no_color {
        disable_colors();
    }

    if let Some(ref path) = args.config {
        set_config_path(path)?;
    }

    let command = match args.command {
        Commands::Config {
            generate,
        } => {
            if generate {
                generate_default_config()?;
            } else {
                info!("{}", Config::new()?.to_annotated_document()?);
            }
            return Ok(());
        }
        command => command,
    };

    config::init()?;
    let mut config = get_config();
    if let Commands::Upload {
        no_overwrite: true,
        ..
    } = command
    {
        config.allow_overwrite = Some(false);
    }

    let (sink, receiver) = ChannelSink::new();
    let events: EventSinkHandle = Arc::new(sink);
    let mut ctx = RegistryContext::open(&config)?.with_events(events);
    if let Some(owner) = args.owner {
        ctx = ctx.with_owner(owner);
    }
    debug!("acting as owner {}", ctx.owner_id());

    let json = args.json;
    let result = match command {
        Commands::Upload {
            reference,
            files,
            package,
            package_revision,
            ..
        } => {
            let rref = RecipeReference::parse(&reference)?;
            let pref = package
                .map(|id| {
                    PackageReference::new(
                        rref.clone(),
                        &id,
                        package_revision.as_deref().unwrap_or_default(),
                    )
                })
                .transpose()?;
            upload_files(&ctx, &rref, pref.as_ref(), &files, json)
        }
        Commands::Revisions {
            reference,
            package,
        } => {
            let rref = RecipeReference::parse(&reference)?;
            let pref = package
                .map(|spec| package_reference(&rref, &spec))
                .transpose()?;
            list_revisions(&ctx, &rref, pref.as_ref(), json)
        }
        Commands::Latest {
            reference,
            package,
        } => {
            let rref = RecipeReference::parse(&reference)?;
            let pref = package
                .map(|spec| package_reference(&rref, &spec))
                .transpose()?;
            latest_revision(&ctx, &rref, pref.as_ref(), json)
        }
        Commands::Search {
            query,
        } => search_recipes(&ctx, query.as_deref(), json),
        Commands::Packages {
            reference,
            all_revisions,
        } => {
            let rref = RecipeReference::parse(&reference)?;
            list_packages(&ctx, &rref, all_revisions, json)
        }
        Commands::Files {
            reference,
            package,
        } => {
            let rref = RecipeReference::parse(&reference)?;
            let pref = package
                .map(|spec| package_reference(&rref, &spec))
                .transpose()?;
            list_files(&ctx, &rref, pref.as_ref(), json)
        }
        Commands::Remove {
            reference,
            package,
            all_revisions,
        } => {
            let rref = RecipeReference::parse(&reference)?;
            remove(&ctx, &rref, &package, all_revisions, json)
        }
        Commands::Config {
            ..
        } => Ok(()),
    };

    for event in receiver.try_iter() {
        debug!("{:?}", event);
    }

    result
}

fn main() -> miette::Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))
    .ok();

    handle_cli()?;
    Ok(())
}
