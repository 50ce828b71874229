use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "lexis", about = "Lexis networked dictionary server and client", version)]
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
    /// Run the dictionary server until interrupted
    Serve(ServeArgs),
    /// Look up a word
    Search(WordArgs),
    /// Add a word with one or more meanings
    Add(AddArgs),
    /// Remove a word
    Remove(WordArgs),
    /// Append a meaning to an existing word
    AddMeaning(AddMeaningArgs),
    /// Replace one meaning of a word with another
    UpdateMeaning(UpdateMeaningArgs),
    /// Convert a snapshot file, or the default vocabulary, to another format
    Export(ExportArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// TOML config file; flags below override its values
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub bind: Option<SocketAddr>,
    /// Shorthand for binding 0.0.0.0 on this port
    #[arg(short, long, conflicts_with = "bind")]
    pub port: Option<u16>,
    #[arg(long)]
    pub snapshot: Option<PathBuf>,
    /// Connections served concurrently
    #[arg(long)]
    pub workers: Option<usize>,
    #[arg(long)]
    pub save_on_stop: bool,
}

/// Where a client command connects.
#[derive(Args)]
pub struct RemoteArgs {
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub addr: String,
}

#[derive(Args)]
pub struct WordArgs {
    pub word: String,
    #[command(flatten)]
    pub remote: RemoteArgs,
}

#[derive(Args)]
pub struct AddArgs {
    pub word: String,
    #[arg(required = true)]
    pub meanings: Vec<String>,
    #[command(flatten)]
    pub remote: RemoteArgs,
}

#[derive(Args)]
pub struct AddMeaningArgs {
    pub word: String,
    pub meaning: String,
    #[command(flatten)]
    pub remote: RemoteArgs,
}

#[derive(Args)]
pub struct UpdateMeaningArgs {
    pub word: String,
    pub old_meaning: String,
    pub new_meaning: String,
    #[command(flatten)]
    pub remote: RemoteArgs,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Snapshot to read; the default vocabulary is used when omitted
    #[arg(long)]
    pub input: Option<PathBuf>,
    /// Destination; `.json` selects JSON, anything else the text format
    pub output: PathBuf,
}
