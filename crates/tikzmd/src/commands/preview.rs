//! `tikzmd preview` command implementation.

use std::path::PathBuf;

use clap::Args;
use tikzmd_render::{CompilationManager, CompileState, extract_tikz_fences, render_fence_markup};

use super::render_args::RenderArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the preview command.
#[derive(Args)]
pub(crate) struct PreviewArgs {
    /// Markdown file containing ```tikz fences.
    markdown: PathBuf,

    /// Recompile every fence.
    #[arg(long)]
    force: bool,

    #[command(flatten)]
    render: RenderArgs,
}

impl PreviewArgs {
    /// Execute the preview command.
    ///
    /// Prints one HTML fragment per fence, in document order.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the file cannot be read.
    /// Failed fences are rendered as error markup, not returned as errors.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let markdown = tokio::fs::read_to_string(&self.markdown).await?;
        let settings = self.render.load_settings()?;

        let fences = extract_tikz_fences(&markdown);
        if fences.is_empty() {
            output.warning(&format!("No tikz fences in {}", self.markdown.display()));
            return Ok(());
        }

        let manager = CompilationManager::default();
        let mut refreshes = manager.subscribe();
        tokio::spawn(async move {
            while let Ok(event) = refreshes.recv().await {
                tracing::info!(settled = event.keys.len(), "Preview refresh");
            }
        });

        let keys: Vec<String> = fences
            .iter()
            .map(|fence| manager.key_for(&fence.content, &settings))
            .collect();
        for (fence, key) in fences.iter().zip(&keys) {
            manager.ensure_compilation(key, &fence.content, &settings, self.force);
        }

        let mut failed = 0;
        for (fence, key) in fences.iter().zip(&keys) {
            let state = manager.wait_settled(key).await;
            if let CompileState::Failed(message) = &state {
                failed += 1;
                tracing::warn!(offset = fence.range.start, error = %message, "Fence failed");
            }
            output.result(&render_fence_markup(key, &state));
        }

        let summary = format!("{} fence(s), {failed} failed", fences.len());
        if failed == 0 {
            output.success(&summary);
        } else {
            output.warning(&summary);
        }
        output.info(&format!("Artifacts in {}", settings.cache_dir.display()));
        Ok(())
    }
}
