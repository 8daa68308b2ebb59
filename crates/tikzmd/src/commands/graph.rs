//! `tikzmd graph` command implementation.

use std::path::PathBuf;

use clap::Args;
use serde_json::{Value, json};
use tikzmd_graph::picture_to_graph;
use tikzmd_parser::{ParsedEnvironment, parse_document};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the graph command.
#[derive(Args)]
pub(crate) struct GraphArgs {
    /// LaTeX/TikZ source file.
    file: PathBuf,
}

impl GraphArgs {
    /// Execute the graph command.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let source = std::fs::read_to_string(&self.file)?;
        let value = graphs_json(&source)?;
        Output::new().result(&serde_json::to_string_pretty(&value)?);
        Ok(())
    }
}

/// One graph per `tikzpicture`, tagged with its index among all pictures.
pub(crate) fn graphs_json(source: &str) -> Result<Value, CliError> {
    let pictures = parse_document(source).document.pictures();
    let mut graphs = Vec::new();
    for (index, picture) in pictures.iter().enumerate() {
        let ParsedEnvironment::Tikz(picture) = picture else {
            continue;
        };
        let graph = picture_to_graph(picture);
        graphs.push(json!({ "picture": index, "graph": serde_json::to_value(&graph)? }));
    }
    Ok(Value::Array(graphs))
}
