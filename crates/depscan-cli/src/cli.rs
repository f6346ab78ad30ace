//! CLI argument definitions for depscan.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "depscan",
    version,
    about = "Resolve the transitive dependency tree of a Maven project",
    long_about = "depscan reads a project's pom.xml, resolves every transitive compile and \
                  runtime dependency from the local repository, its cache and the configured \
                  remote repositories, and reports the mediated dependency tree."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan a project directory and print its dependency tree
    Scan {
        /// Project directory containing pom.xml
        dir: PathBuf,
        /// Print the report as JSON on stdout
        #[arg(long)]
        json: bool,
        /// Use only the local repository and cache
        #[arg(long)]
        offline: bool,
        /// Maximum tree depth to display
        #[arg(short, long)]
        depth: Option<usize>,
        /// Show version conflicts resolved by mediation
        #[arg(long)]
        conflicts: bool,
        /// Config file to use instead of ~/.depscan/config.toml
        #[arg(long, env = "DEPSCAN_CONFIG")]
        config: Option<PathBuf>,
    },
}

pub fn parse() -> Cli {
    Cli::parse()
}
