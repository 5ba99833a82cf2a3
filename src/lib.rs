pub mod cache;
pub mod cli;
pub mod export;
pub mod loader;
pub mod normalize;
pub mod resolve;
pub mod search;
pub mod table;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use crate::cli::{Cli, Commands};
use crate::resolve::ResolveMode;

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("exp_search", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Resolve(args) => handle_resolve(&args),
        Commands::Search(args) => search::execute(&args),
    }
}

fn handle_resolve(args: &cli::ResolveArgs) -> Result<()> {
    let raw = loader::load_path(&args.input, args.delimiter)
        .with_context(|| format!("Loading table from {:?}", args.input))?;
    info!(
        "Loaded {} row(s) across {} column(s) from '{}'",
        raw.rows.len(),
        raw.headers.len(),
        args.input.display()
    );
    let mapping = resolve::resolve(&raw.headers, resolve_mode(args.positional_fallback))
        .with_context(|| format!("Resolving column roles for {:?}", args.input))?;

    let rows = mapping
        .entries()
        .into_iter()
        .map(|(role, column)| vec![role.label().to_string(), column.to_string()])
        .collect::<Vec<_>>();
    table::print_table(&["role", "column"], &rows);

    if let Some(path) = &args.mapping {
        mapping
            .save(path)
            .with_context(|| format!("Writing role mapping to {path:?}"))?;
        info!("Role mapping written to {path:?}");
    }
    Ok(())
}

pub(crate) fn resolve_mode(positional_fallback: bool) -> ResolveMode {
    if positional_fallback {
        ResolveMode::PositionalFallback
    } else {
        ResolveMode::Strict
    }
}
