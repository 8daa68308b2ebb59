//! `tikzmd parse` command implementation.

use std::path::PathBuf;

use clap::Args;
use serde_json::{Value, json};
use tikzmd_parser::{Segment, parse_document};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the parse command.
#[derive(Args)]
pub(crate) struct ParseArgs {
    /// LaTeX/TikZ source file.
    file: PathBuf,
}

impl ParseArgs {
    /// Execute the parse command.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let source = std::fs::read_to_string(&self.file)?;
        let value = document_json(&source)?;
        Output::new().result(&serde_json::to_string_pretty(&value)?);
        Ok(())
    }
}

fn segment_json(segment: &Segment) -> Value {
    let range = segment.range();
    match segment {
        Segment::RawText { .. } => json!({ "kind": "RawText", "range": range }),
        Segment::Command { name, .. } => json!({ "kind": "Command", "name": name, "range": range }),
        Segment::Environment(block) => json!({
            "kind": "Environment",
            "env": block.env,
            "options": block.options_raw(),
            "range": range,
        }),
    }
}

/// Segment summary, parsed pictures and parse errors of `source`.
pub(crate) fn document_json(source: &str) -> Result<Value, CliError> {
    let parsed = parse_document(source);
    let segments: Vec<Value> = parsed.document.segments.iter().map(segment_json).collect();
    let errors: Vec<Value> = parsed
        .errors
        .iter()
        .map(|e| json!({ "message": e.message, "offset": e.offset }))
        .collect();

    Ok(json!({
        "segments": segments,
        "pictures": serde_json::to_value(parsed.document.pictures())?,
        "errors": errors,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_document_json() {
        let source = "Intro\n\\begin{tikzpicture}[scale=2]\\node (a) at (0,0) {A};\\end{tikzpicture}";
        let value = document_json(source).unwrap();

        assert_eq!(value["segments"][0]["kind"], "RawText");
        assert_eq!(value["segments"][0]["range"]["end"], 6);
        assert_eq!(value["segments"][1]["env"], "tikzpicture");
        assert_eq!(value["segments"][1]["options"], "[scale=2]");
        assert_eq!(value["pictures"][0]["env"], "tikzpicture");
        assert_eq!(value["errors"], json!([]));
    }

    #[test]
    fn test_unterminated_reported() {
        let value = document_json("x\\begin{circuitikz}").unwrap();
        assert_eq!(value["errors"][0]["offset"], 1);
    }
}
