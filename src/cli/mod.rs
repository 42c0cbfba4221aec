use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::ConfigLoader;
use crate::storage::EssayStore;

pub mod commands;

use self::commands::{
    ArgumentArgs, DeleteArgs, EditArgs, ExportArgs, NewArgs, ShowArgs, SynonymArgs,
};

#[derive(Parser, Debug)]
#[command(
    name = "redator",
    version,
    about = "Terminal notebook for drafting and keeping essays"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the config file location (takes precedence over REDATOR_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the data directory (takes precedence over REDATOR_DATA)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List saved essays, most recent first (default)
    List,
    /// Draft and save a new essay
    New(NewArgs),
    /// Print one essay in full
    Show(ShowArgs),
    /// Edit a saved essay in place
    Edit(EditArgs),
    /// Delete an essay by id
    Delete(DeleteArgs),
    /// Write an essay body to a text file
    Export(ExportArgs),
    /// Ask the remote service for argument ideas on a topic
    Arguments(ArgumentArgs),
    /// Look up the synonym dictionary, filtered locally
    Synonyms(SynonymArgs),
    /// List remote essay models usable with `new --model`
    Models,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        env::set_var("REDATOR_CONFIG", path);
    }
    if let Some(path) = &cli.data_dir {
        env::set_var("REDATOR_DATA", path);
    }

    let loader = ConfigLoader::discover()?;
    loader.paths().ensure_directories()?;
    init_tracing(&cli.log_level)
        .with_context(|| format!("initialising logging at level {}", cli.log_level))?;
    let config = loader.load_or_init()?;
    let store = EssayStore::open(&config.storage.store_path);

    let config = Arc::new(config);
    let command = cli.command.unwrap_or(Commands::List);
    match command {
        Commands::List => commands::list_essays(&store),
        Commands::New(args) => commands::new_essay(config, store, args),
        Commands::Show(args) => commands::show_essay(&store, args),
        Commands::Edit(args) => commands::edit_essay(&store, args),
        Commands::Delete(args) => commands::delete_essay(&store, args),
        Commands::Export(args) => commands::export_essay(config, &store, args),
        Commands::Arguments(args) => commands::generate_arguments(config, args),
        Commands::Synonyms(args) => commands::lookup_synonyms(config, args),
        Commands::Models => commands::list_models(config),
    }
}

fn init_tracing(level: &str) -> Result<()> {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_try_init(|| {
        let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
        fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
        Ok(())
    })
    .map(|_| ())
}
