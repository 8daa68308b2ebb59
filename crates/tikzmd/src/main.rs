//! tikzmd CLI - TikZ diagrams for Markdown.
//!
//! Provides commands for:
//! - `parse`: Print the segments and statements of a TikZ document
//! - `graph`: Print the node/edge graph of every `tikzpicture`
//! - `compile`: Compile a TikZ file to SVG or PDF
//! - `preview`: Compile the `tikz` fences of a Markdown file

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{CompileArgs, GraphArgs, ParseArgs, PreviewArgs};
use error::CliError;
use output::Output;

/// tikzmd - TikZ diagrams for Markdown.
#[derive(Parser)]
#[command(name = "tikzmd", version, about)]
struct Cli {
    /// Enable verbose output (compile timing and process logs).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a TikZ document and print its structure as JSON.
    Parse(ParseArgs),
    /// Build graphs from every tikzpicture and print them as JSON.
    Graph(GraphArgs),
    /// Compile a TikZ file and print the artifact path.
    Compile(CompileArgs),
    /// Compile the tikz fences of a Markdown file and print their HTML.
    Preview(PreviewArgs),
}

fn run_async<F>(future: F) -> Result<(), CliError>
where
    F: Future<Output = Result<(), CliError>>,
{
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(future)
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Parse(args) => args.execute(),
        Commands::Graph(args) => args.execute(),
        Commands::Compile(args) => run_async(args.execute()),
        Commands::Preview(args) => run_async(args.execute()),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
