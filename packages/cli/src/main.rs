mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{clear, edit, init, remote, show, ClearArgs, EditArgs, InitArgs, RemoteArgs, ShowArgs};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Outliner CLI - inspect and edit locally stored outliner documents
#[derive(Parser, Debug)]
#[command(name = "outliner")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Working directory holding outliner.config.json
    #[arg(long, global = true, default_value = ".")]
    dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a default outliner.config.json
    Init(InitArgs),

    /// Print the committed snapshot of a document
    Show(ShowArgs),

    /// Replace a document's content through an edit session
    Edit(EditArgs),

    /// Remove a stored document
    Clear(ClearArgs),

    /// Try to connect to a collaborative document
    Remote(RemoteArgs),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cwd = cli.dir;

    let result = match cli.command {
        Command::Init(args) => init(args, &cwd),
        Command::Show(args) => show(args, &cwd),
        Command::Edit(args) => edit(args, &cwd).await,
        Command::Clear(args) => clear(args, &cwd),
        Command::Remote(args) => remote(args).await,
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
