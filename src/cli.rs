//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ripr")]
#[command(author, version, about = "Reason-tagged IPv4 range storage over Redis")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file path (YAML); defaults apply when omitted
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug output)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Insert a range with an associated reason
    Insert {
        /// Range: <ip>, <ip>/<1-32>, or <ip> - <ip>
        range: String,
        /// Reason recorded for the range
        reason: String,
    },

    /// Remove a range
    Remove {
        /// Range: <ip>, <ip>/<1-32>, or <ip> - <ip>
        range: String,
    },

    /// Look up the reason applying to an IP
    Find {
        /// IPv4 address
        ip: String,
    },

    /// Replace the reason of the interval containing an IP
    Update {
        /// IPv4 address inside the interval
        ip: String,
        /// New reason
        reason: String,
    },

    /// List all stored intervals
    List,

    /// Import a blocklist file, one range per line
    Import {
        /// File with one range per line; blank lines and # comments skipped
        file: PathBuf,
        /// Reason recorded for every imported range
        #[arg(short, long)]
        reason: String,
    },

    /// Delete all content and recreate an empty database
    Reset,

    /// Delete all content including the sentinels (database unusable until reset)
    Flush,
}
