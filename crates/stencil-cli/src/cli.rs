//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use stencil_core::Mode;

/// Stencil - keep generated project files in line with a declarative schema
#[derive(Parser, Debug)]
#[command(name = "stencil")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output (debug tracing on stderr)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Project root to reconcile
    #[arg(long, global = true, default_value = ".")]
    pub path: PathBuf,

    /// Schema manifest (TOML); the built-in schema is used when omitted
    #[arg(long, global = true, env = "STENCIL_SCHEMA")]
    pub schema: Option<PathBuf>,

    /// Output as JSON for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// First-time installation
    Install {
        /// Preview changes without applying them
        #[arg(long)]
        dry_run: bool,
    },

    /// Bring an existing installation up to date
    Upgrade {
        /// Preview changes without applying them
        #[arg(long)]
        dry_run: bool,
    },

    /// Remove tool-owned files; managed and shared files are left alone
    Uninstall {
        /// Preview changes without applying them
        #[arg(long)]
        dry_run: bool,
    },

    /// Remove tool-owned and managed files plus engine state
    UninstallFull {
        /// Preview changes without applying them
        #[arg(long)]
        dry_run: bool,
    },

    /// Report what an upgrade would do
    Check,

    /// Show the diff an upgrade would apply
    Diff,
}

impl Commands {
    /// Mode and dry-run flag for the mutating commands.
    pub fn mode(&self) -> Option<(Mode, bool)> {
        match *self {
            Self::Install { dry_run } => Some((Mode::Install, dry_run)),
            Self::Upgrade { dry_run } => Some((Mode::Upgrade, dry_run)),
            Self::Uninstall { dry_run } => Some((Mode::Uninstall, dry_run)),
            Self::UninstallFull { dry_run } => Some((Mode::UninstallFull, dry_run)),
            Self::Check | Self::Diff => None,
        }
    }
}
