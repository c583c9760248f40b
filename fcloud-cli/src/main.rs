//! fcloud CLI
//!
//! Offload local files to cloud storage, leaving small link files (CFLs)
//! behind that record where the content lives.

mod commands;
mod config_file;

use clap::{ArgAction, Parser, Subcommand};
use console::style;
use fcloud_core::RemotePath;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "fcloud")]
#[command(author, version, about = "Offload files to the cloud behind local link files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file path (default: platform config dir, or $FCLOUD_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a file (or every file under a directory) to the cloud
    Add {
        /// Local path to a file or directory
        path: PathBuf,

        /// Keep the original file and create the link alongside it
        #[arg(short, long)]
        near: bool,

        /// Name under which the file is saved in the cloud
        #[arg(short, long)]
        filename: Option<String>,

        /// Remote folder to upload into (default: main folder from config)
        #[arg(short, long)]
        remote_path: Option<RemotePath>,
    },

    /// Download the file a link points at (or every link under a directory)
    Get {
        /// Link file, or a directory to scan for links
        cfl: PathBuf,

        /// Download next to the link instead of replacing it
        #[arg(short, long)]
        near: bool,

        /// Delete the cloud copy after downloading
        #[arg(long, default_value_t = true, action = ArgAction::Set)]
        remove_after: bool,
    },

    /// Show cloud metadata for a linked file
    Info {
        /// Link file
        cfl: PathBuf,
    },

    /// Delete the cloud copy of a linked file
    Remove {
        /// Link file, or a directory to scan
        cfl: PathBuf,

        /// Keep the local link file
        #[arg(short, long)]
        only_in_cloud: bool,
    },

    /// List files in a remote folder
    Files {
        /// Remote folder (default: main folder from config)
        #[arg(short, long)]
        remote_path: Option<RemotePath>,

        /// Hide directories from the listing
        #[arg(short, long)]
        only_files: bool,
    },

    /// Read or edit the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print one config value
    Get { section: String, key: String },
    /// Set one config value
    Set { section: String, key: String, value: String },
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("fcloud_core=debug,fcloud_providers=debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = cli.config.as_deref();

    let result = match cli.command {
        Commands::Add { path, near, filename, remote_path } => {
            commands::add(config, &path, near, filename, remote_path).await
        }
        Commands::Get { cfl, near, remove_after } => {
            commands::get(config, &cfl, near, remove_after).await
        }
        Commands::Info { cfl } => commands::info(config, &cfl).await,
        Commands::Remove { cfl, only_in_cloud } => {
            commands::remove(config, &cfl, only_in_cloud).await
        }
        Commands::Files { remote_path, only_files } => {
            commands::files(config, remote_path, only_files).await
        }
        Commands::Config { action } => match action {
            ConfigAction::Get { section, key } => commands::config_get(config, &section, &key),
            ConfigAction::Set { section, key, value } => {
                commands::config_set(config, &section, &key, &value)
            }
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e}", style(format!("{}:", e.title())).red().bold());
            ExitCode::FAILURE
        }
    }
}
