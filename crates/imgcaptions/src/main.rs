//! imgcaptions CLI - image caption filter.
//!
//! Provides commands for:
//! - `render`: Rewrite the images of a page file into figures
//! - `patterns`: Print the grammar rules and their patterns

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{PatternsArgs, RenderArgs};
use output::Output;

/// imgcaptions - wrap page images in figures with captions.
#[derive(Parser)]
#[command(name = "imgcaptions", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite the images of a page file into figures.
    Render(RenderArgs),
    /// Print every grammar rule and its pattern.
    Patterns(PatternsArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let verbose = matches!(&cli.command, Commands::Render(args) if args.verbose);
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Render(args) => args.execute(),
        Commands::Patterns(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
