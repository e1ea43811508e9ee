use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::{RunOptions, cmd_config_init, cmd_config_path, cmd_config_show, cmd_run};
use crate::error::Result;

#[derive(Parser)]
#[command(name = "helpqueue")]
#[command(about = "Live help-ticket queue")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open the ticket queue at an interactive prompt
    Run {
        /// Config file (default: $HELPQUEUE_CONFIG or .helpqueue/config.yaml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Start signed in as this email
        #[arg(short, long)]
        user: Option<String>,

        /// Disable coloured output
        #[arg(long)]
        no_color: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show {
        /// Config file to read instead of the default
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the config file location
    Path,
    /// Write a config file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Run {
                config,
                user,
                no_color,
            } => {
                cmd_run(RunOptions {
                    config,
                    user,
                    no_color,
                })
                .await
            }

            Commands::Config { action } => match action {
                ConfigAction::Show { config, json } => cmd_config_show(config.as_deref(), json),
                ConfigAction::Path => cmd_config_path(),
                ConfigAction::Init { force } => cmd_config_init(force),
            },
        }
    }
}
