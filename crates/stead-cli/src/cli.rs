use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "stead")]
#[command(about = "Edit site drafts locally and sync them with the hosting service")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to the local draft database
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the stored draft for a site
    Show {
        /// Site slug
        site: String,
        /// Output the full draft as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set the site title
    Title {
        /// Site slug
        site: String,
        /// New title (may be empty to clear it)
        #[arg(trailing_var_arg = true)]
        text: Vec<String>,
    },
    /// Set the site description
    Describe {
        /// Site slug
        site: String,
        /// New description (may be empty to clear it)
        #[arg(trailing_var_arg = true)]
        text: Vec<String>,
    },
    /// Edit the block content document in $EDITOR
    Compose {
        /// Site slug
        site: String,
    },
    /// Run one sync round-trip with the hosting service
    Sync {
        /// Site slug
        site: String,
    },
    /// Keep a session open with background auto-sync
    Session {
        /// Site slug
        site: String,
        /// How long to stay attached
        #[arg(long, default_value = "60", value_name = "SECONDS")]
        seconds: u64,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
