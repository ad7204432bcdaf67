use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pagevault")]
#[command(about = "pagevault CLI", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch every listed URL through the extraction API into the raw cache
    Fetch(FetchArgs),
}

#[derive(clap::Args, Debug)]
pub struct FetchArgs {
    /// Newline-separated URL list
    #[arg(long, default_value = "data/urls.txt")]
    pub urls: PathBuf,

    /// Configuration file (default: config/pagevault.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,
}
