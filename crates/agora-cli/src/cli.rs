use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "agora",
    about = "Agora social core: config tooling and a concurrent traffic simulator",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Write a config file holding the default settings
    Init(InitArgs),
    /// Load a config file and show the settings it yields
    ConfigCheck(ConfigCheckArgs),
    /// Run random concurrent traffic against an in-memory core
    Simulate(SimulateArgs),
}

#[derive(Args)]
pub struct InitArgs {
    pub path: PathBuf,
    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct ConfigCheckArgs {
    pub path: PathBuf,
}

#[derive(Args, Clone, Debug)]
pub struct SimulateArgs {
    /// Config file to seed from; the next post id is written back to it
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    #[arg(long, default_value = "20")]
    pub users: usize,
    /// Interactions attempted per thread
    #[arg(long, default_value = "200")]
    pub ops: usize,
    #[arg(long, default_value = "4")]
    pub threads: usize,
    /// Probability that any given user follows any other
    #[arg(long, default_value = "0.3")]
    pub follow_ratio: f64,
    #[arg(long, default_value = "42")]
    pub seed: u64,
}
