use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "bindable",
    about = "Inspect chain notifications of observable JSON documents",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Model configuration file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the value at a chain
    Get(GetArgs),
    /// Write a value at a chain and show the notifications it fires
    Set(SetArgs),
    /// Show which chains a change would be published on
    Related(RelatedArgs),
}

#[derive(Args)]
pub struct GetArgs {
    pub file: PathBuf,
    /// Chain to read; the whole document when omitted
    pub chain: Option<String>,
}

#[derive(Args)]
pub struct SetArgs {
    pub file: PathBuf,
    pub chain: String,
    /// JSON value to write
    pub value: String,
    /// Chains to subscribe to before writing
    #[arg(short, long)]
    pub watch: Vec<String>,
    /// Write the resulting document back to the file
    #[arg(long)]
    pub in_place: bool,
}

#[derive(Args)]
pub struct RelatedArgs {
    pub chain: String,
    /// Chains to mark as observed first
    #[arg(short, long)]
    pub observe: Vec<String>,
}
