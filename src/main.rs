use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use webvault::cli::{
    handle_backup_command, handle_cleanup_command, handle_config_command, handle_init_command,
    handle_list_command, handle_retrieve_command, BackupArgs, CleanupArgs, ListArgs, RetrieveArgs,
};
use webvault::config::{paths::VaultPaths, settings::Settings};
use webvault::models::RunContext;
use webvault::process::SystemRunner;
use webvault::store::open_backend;

#[derive(Parser)]
#[command(
    name = "webvault",
    version,
    about = "Back up a web application's database and site files to object storage",
    long_about = "webvault dumps the database and copies the site files with external \
                  commands, compresses each into one artifact, and uploads it to a \
                  filesystem or S3-compatible store. It also retrieves artifacts and \
                  prunes old ones."
)]
struct Cli {
    /// Settings file to use instead of <base>/config.json
    #[arg(long, global = true, env = "WEBVAULT_CONFIG")]
    config: Option<PathBuf>,

    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Back up the database, the site files, or both
    Backup(BackupArgs),

    /// Download a stored backup
    #[command(alias = "get")]
    Retrieve(RetrieveArgs),

    /// Delete all but the most recent backups
    #[command(alias = "prune")]
    Cleanup(CleanupArgs),

    /// List stored backups, newest first
    #[command(alias = "ls")]
    List(ListArgs),

    /// Write the settings file and create local directories
    Init,

    /// Show current configuration and paths
    Config,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    webvault::logging::init(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // VaultError messages already carry their cause
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    // Initialize paths and settings
    let mut paths = VaultPaths::new()?;
    let explicit_config = cli.config.is_some();
    if let Some(config) = cli.config {
        paths = paths.with_settings_file(config);
    }

    // `init` is how a named settings file gets created in the first place
    let settings = if explicit_config && !matches!(cli.command, Commands::Init) {
        Settings::load_existing(&paths)?
    } else {
        Settings::load_or_create(&paths)?
    };

    match cli.command {
        Commands::Init => return Ok(handle_init_command(&paths, &settings)?),
        Commands::Config => return Ok(handle_config_command(&paths, &settings)?),
        _ => {}
    }

    settings.validate()?;
    let backend = open_backend(&settings.storage, &paths)?;

    match cli.command {
        Commands::Backup(args) => handle_backup_command(
            &paths,
            &settings,
            backend.as_ref(),
            &SystemRunner,
            RunContext::now(),
            args,
        )?,
        Commands::Retrieve(args) => handle_retrieve_command(&settings, backend.as_ref(), args)?,
        Commands::Cleanup(args) => handle_cleanup_command(&settings, backend.as_ref(), args)?,
        Commands::List(args) => handle_list_command(&settings, backend.as_ref(), args)?,
        Commands::Init | Commands::Config => {}
    }

    Ok(())
}
