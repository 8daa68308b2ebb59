//! Flags shared by commands that compile.

use std::path::PathBuf;

use clap::Args;
use tikzmd_config::{CliSettings, Config, Engine, RenderSettings, SvgTool};

use crate::error::CliError;

/// Render configuration overrides.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Path to configuration file (default: auto-discover tikzmd.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// LaTeX engine: pdflatex, lualatex, xelatex or tectonic (overrides config).
    #[arg(long)]
    engine: Option<Engine>,

    /// Engine executable (overrides config).
    #[arg(long)]
    engine_path: Option<String>,

    /// SVG converter: dvisvgm or pdftocairo (overrides config).
    #[arg(long)]
    svg_tool: Option<SvgTool>,

    /// SVG converter executable (overrides config).
    #[arg(long)]
    svg_tool_path: Option<String>,

    /// Artifact directory (overrides config).
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Process timeout in milliseconds, 0 to disable (overrides config).
    #[arg(long, env = "TIKZMD_TIMEOUT_MS")]
    timeout_ms: Option<u64>,
}

impl RenderArgs {
    /// Load config with these overrides applied.
    pub(crate) fn load_settings(self) -> Result<RenderSettings, CliError> {
        let cli_settings = CliSettings {
            engine: self.engine,
            engine_path: self.engine_path,
            svg_tool: self.svg_tool,
            svg_tool_path: self.svg_tool_path,
            cache_dir: self.cache_dir,
            timeout_ms: self.timeout_ms,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        if let Some(path) = &config.config_path {
            tracing::info!(path = %path.display(), "Loaded config");
        }
        Ok(config.render_resolved)
    }
}
