//! `tikzmd compile` command implementation.

use std::path::PathBuf;

use clap::Args;
use tikzmd_render::{CompilationManager, CompileState, base_name};

use super::render_args::RenderArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the compile command.
#[derive(Args)]
pub(crate) struct CompileArgs {
    /// TikZ fragment or complete LaTeX document.
    file: PathBuf,

    /// Stop after the PDF; skip SVG conversion.
    #[arg(long)]
    pdf_only: bool,

    /// Recompile even if the artifact already exists.
    #[arg(long)]
    force: bool,

    #[command(flatten)]
    render: RenderArgs,
}

impl CompileArgs {
    /// Execute the compile command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, the file cannot be read, or
    /// compilation fails.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let content = tokio::fs::read_to_string(&self.file).await?;
        let settings = self.render.load_settings()?;

        let manager = CompilationManager::default().with_svg_output(!self.pdf_only);
        let key = manager.key_for(&content, &settings);

        let extension = if self.pdf_only { "pdf" } else { "svg" };
        let existing = settings
            .cache_dir
            .join(format!("{}.{extension}", base_name(&key)));
        if !self.force && existing.exists() {
            tracing::info!(key = %key, "Artifact up to date");
            output.artifact("Up to date", &existing);
            output.result(&existing.display().to_string());
            return Ok(());
        }

        manager.ensure_compilation(&key, &content, &settings, self.force);
        match manager.wait_settled(&key).await {
            CompileState::Resolved(path) => {
                output.artifact("Compiled", &path);
                output.result(&path.display().to_string());
                Ok(())
            }
            CompileState::Failed(message) => Err(CliError::Compile(message)),
            CompileState::Absent | CompileState::Pending => Err(CliError::Compile(format!(
                "compilation of {} did not settle",
                self.file.display()
            ))),
        }
    }
}
