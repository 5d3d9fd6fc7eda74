//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

/// Inventory kept in an AVL tree: load catalogs, inspect the tree, simulate stock depletion
#[derive(Parser, Debug)]
#[command(name = "stockavl")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    /// Directory holding .stockavl.toml (default: cwd)
    #[arg(short, long, global = true, value_hint = ValueHint::DirPath)]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load a catalog and consume random items until the tree is empty
    Simulate {
        /// Catalog file (default: from config)
        #[arg(value_hint = ValueHint::FilePath)]
        catalog: Option<PathBuf>,
        /// RNG seed for a reproducible run
        #[arg(long)]
        seed: Option<u64>,
        /// Pause between cycles in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,
        /// Stop after this many cycles
        #[arg(long)]
        max_cycles: Option<u64>,
        /// Export a DOT snapshot after every removal
        #[arg(long)]
        snapshots: bool,
        /// Event log file
        #[arg(long, value_hint = ValueHint::FilePath)]
        log: Option<PathBuf>,
        /// Output directory for DOT exports
        #[arg(short, long, value_hint = ValueHint::DirPath)]
        out: Option<PathBuf>,
    },

    /// Load a catalog and list its records in code order
    Load {
        /// Catalog file
        #[arg(value_hint = ValueHint::FilePath)]
        catalog: PathBuf,
    },

    /// Export the tree built from a catalog as Graphviz DOT
    Dot {
        /// Catalog file
        #[arg(value_hint = ValueHint::FilePath)]
        catalog: PathBuf,
        /// Output file (default: stdout)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Show the tree built from a catalog
    Tree {
        /// Catalog file
        #[arg(value_hint = ValueHint::FilePath)]
        catalog: PathBuf,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Create config template
    Init {
        /// Create global config
        #[arg(short, long)]
        global: bool,
    },

    /// Show config paths
    Path,
}
