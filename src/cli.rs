use clap::{Parser, Subcommand};
use homestream_common::FolderId;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "homestream")]
#[command(author, version, about = "Media library indexing engine")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan configured folders into the catalog
    Scan {
        /// Only scan this folder
        #[arg(long)]
        folder: Option<FolderId>,
    },

    /// Scan once, then keep the catalog in sync with filesystem changes
    Watch,

    /// List catalogued items of a folder
    List {
        #[arg(long, required = true)]
        folder: FolderId,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
