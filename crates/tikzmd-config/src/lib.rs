//! Configuration management for tikzmd.
//!
//! Parses `tikzmd.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Expansion
//!
//! `render.engine_path`, `render.svg_tool_path` and `render.cache_dir`
//! support `${VAR}` and `${VAR:-default}`; `render.cache_dir` additionally
//! expands a leading `~`.

mod expand;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "tikzmd.toml";

/// Cache directory name, relative to the config file directory.
const DEFAULT_CACHE_DIR: &str = ".tikz-cache";

/// Default per-invocation process timeout.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Upper bound accepted for `render.timeout_ms`.
const MAX_TIMEOUT_MS: u64 = 10 * 60 * 1000;

/// LaTeX engine used to produce the PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    #[default]
    Pdflatex,
    Lualatex,
    Xelatex,
    Tectonic,
}

impl Engine {
    /// Executable name, also the default `engine_path`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pdflatex => "pdflatex",
            Self::Lualatex => "lualatex",
            Self::Xelatex => "xelatex",
            Self::Tectonic => "tectonic",
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Engine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pdflatex" => Ok(Self::Pdflatex),
            "lualatex" => Ok(Self::Lualatex),
            "xelatex" => Ok(Self::Xelatex),
            "tectonic" => Ok(Self::Tectonic),
            other => Err(format!(
                "unknown engine '{other}', expected one of: pdflatex, lualatex, xelatex, tectonic"
            )),
        }
    }
}

/// PDF to SVG converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SvgTool {
    #[default]
    Dvisvgm,
    Pdftocairo,
}

impl SvgTool {
    /// Executable name, also the default `svg_tool_path`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dvisvgm => "dvisvgm",
            Self::Pdftocairo => "pdftocairo",
        }
    }
}

impl fmt::Display for SvgTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SvgTool {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dvisvgm" => Ok(Self::Dvisvgm),
            "pdftocairo" => Ok(Self::Pdftocairo),
            other => Err(format!(
                "unknown SVG tool '{other}', expected one of: dvisvgm, pdftocairo"
            )),
        }
    }
}

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    pub engine: Option<Engine>,
    pub engine_path: Option<String>,
    pub svg_tool: Option<SvgTool>,
    pub svg_tool_path: Option<String>,
    /// Used as given, not relative to the config directory.
    pub cache_dir: Option<PathBuf>,
    pub timeout_ms: Option<u64>,
}

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Render configuration (strings as parsed from TOML).
    render: RenderConfigRaw,

    /// Resolved render settings (set after loading).
    #[serde(skip)]
    pub render_resolved: RenderSettings,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Raw `[render]` section as parsed from TOML.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RenderConfigRaw {
    engine: Option<Engine>,
    engine_path: Option<String>,
    svg_tool: Option<SvgTool>,
    svg_tool_path: Option<String>,
    preamble: Option<Vec<String>>,
    cache_dir: Option<String>,
    timeout_ms: Option<u64>,
}

/// Resolved, immutable settings for one compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSettings {
    pub engine: Engine,
    pub engine_path: String,
    pub svg_tool: SvgTool,
    pub svg_tool_path: String,
    /// Extra preamble lines inserted before `\begin{document}`.
    pub preamble: Vec<String>,
    /// Directory holding compiled artifacts.
    pub cache_dir: PathBuf,
    /// Process timeout in milliseconds; `0` disables it.
    pub timeout_ms: u64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self::default_with_cache_dir(expand::data_dir().join("tikz-cache"))
    }
}

impl RenderSettings {
    /// Default settings writing artifacts to `cache_dir`.
    #[must_use]
    pub fn default_with_cache_dir(cache_dir: PathBuf) -> Self {
        Self {
            engine: Engine::default(),
            engine_path: Engine::default().as_str().to_owned(),
            svg_tool: SvgTool::default(),
            svg_tool_path: SvgTool::default().as_str().to_owned(),
            preamble: Vec::new(),
            cache_dir,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    /// Process timeout, `None` when disabled.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }

    /// Canonical JSON of every setting that affects compiled output.
    ///
    /// Two settings values produce the same signature exactly when they would
    /// compile identical sources to identical artifacts.
    #[must_use]
    pub fn signature(&self) -> String {
        serde_json::json!({
            "engine": self.engine,
            "engine_path": self.engine_path,
            "svg_tool": self.svg_tool,
            "svg_tool_path": self.svg_tool_path,
            "preamble": self.preamble,
        })
        .to_string()
    }

    /// Validate settings values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if a path is empty or the timeout is
    /// out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.engine_path, "render.engine_path")?;
        require_non_empty(&self.svg_tool_path, "render.svg_tool_path")?;
        if self.cache_dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "render.cache_dir cannot be empty".to_owned(),
            ));
        }
        if self.timeout_ms > MAX_TIMEOUT_MS {
            return Err(ConfigError::Validation(format!(
                "render.timeout_ms cannot exceed {MAX_TIMEOUT_MS}"
            )));
        }
        Ok(())
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`render.cache_dir`").
        field: String,
        /// Error message (e.g., "${`TEXBIN`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `tikzmd.toml` in current directory and parents.
    /// Without a config file the cache lives in the per-user data directory.
    ///
    /// CLI settings take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing or
    /// expansion fails, or the resulting settings are invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let path = match config_path {
            Some(path) if !path.exists() => {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Some(path) => Some(path.to_path_buf()),
            None => Self::discover_config(),
        };

        let mut config = match &path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };

        if let Some(settings) = cli_settings {
            config.render.apply_cli_settings(settings);
        }

        config.expand_env_vars()?;
        match &path {
            Some(path) => config.resolve(path.parent().unwrap_or(Path::new(".")))?,
            None => config.resolve_global(),
        }
        if let Some(cache_dir) = cli_settings.and_then(|s| s.cache_dir.as_ref()) {
            config.render_resolved.cache_dir.clone_from(cache_dir);
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.render_resolved.validate()
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Parse a specific file without resolving it.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        let render = &mut self.render;
        if let Some(ref path) = render.engine_path {
            render.engine_path = Some(expand::expand_env(path, "render.engine_path")?);
        }
        if let Some(ref path) = render.svg_tool_path {
            render.svg_tool_path = Some(expand::expand_env(path, "render.svg_tool_path")?);
        }
        Ok(())
    }

    /// Resolve settings with the cache directory relative to `config_dir`.
    fn resolve(&mut self, config_dir: &Path) -> Result<(), ConfigError> {
        let cache_dir = match &self.render.cache_dir {
            Some(dir) => config_dir.join(expand::expand_path(dir, "render.cache_dir")?),
            None => config_dir.join(DEFAULT_CACHE_DIR),
        };
        self.render_resolved = self.render.resolve(cache_dir);
        Ok(())
    }

    /// Resolve settings when no config file was found.
    fn resolve_global(&mut self) {
        self.render_resolved = self
            .render
            .resolve(expand::data_dir().join("tikz-cache"));
    }

    /// Render settings ready for compilation.
    #[must_use]
    pub fn render_settings(&self) -> &RenderSettings {
        &self.render_resolved
    }
}

impl RenderConfigRaw {
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(engine) = settings.engine {
            self.engine = Some(engine);
            // The path follows the engine unless overridden too.
            if settings.engine_path.is_none() {
                self.engine_path = None;
            }
        }
        if let Some(path) = &settings.engine_path {
            self.engine_path = Some(path.clone());
        }
        if let Some(tool) = settings.svg_tool {
            self.svg_tool = Some(tool);
            if settings.svg_tool_path.is_none() {
                self.svg_tool_path = None;
            }
        }
        if let Some(path) = &settings.svg_tool_path {
            self.svg_tool_path = Some(path.clone());
        }
        if let Some(timeout_ms) = settings.timeout_ms {
            self.timeout_ms = Some(timeout_ms);
        }
    }

    fn resolve(&self, cache_dir: PathBuf) -> RenderSettings {
        let engine = self.engine.unwrap_or_default();
        let svg_tool = self.svg_tool.unwrap_or_default();
        RenderSettings {
            engine,
            engine_path: self
                .engine_path
                .clone()
                .unwrap_or_else(|| engine.as_str().to_owned()),
            svg_tool,
            svg_tool_path: self
                .svg_tool_path
                .clone()
                .unwrap_or_else(|| svg_tool.as_str().to_owned()),
            preamble: self.preamble.clone().unwrap_or_default(),
            cache_dir,
            timeout_ms: self.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn resolved(toml: &str, config_dir: &Path) -> RenderSettings {
        let mut config: Config = toml::from_str(toml).unwrap();
        config.expand_env_vars().unwrap();
        config.resolve(config_dir).unwrap();
        config.render_resolved
    }

    /// Assert that validation fails with expected substrings in the error message.
    fn assert_validation_error(settings: &RenderSettings, expected_substrings: &[&str]) {
        let result = settings.validate();
        assert!(result.is_err(), "Expected validation to fail");
        let err = result.unwrap_err();
        assert!(
            matches!(err, ConfigError::Validation(_)),
            "Expected ConfigError::Validation, got {err:?}"
        );
        let msg = err.to_string();
        for s in expected_substrings {
            assert!(
                msg.contains(s),
                "Expected error to contain '{s}', got: {msg}"
            );
        }
    }

    #[test]
    fn test_parse_minimal_config() {
        let settings = resolved("", Path::new("/project"));
        assert_eq!(settings.engine, Engine::Pdflatex);
        assert_eq!(settings.engine_path, "pdflatex");
        assert_eq!(settings.svg_tool, SvgTool::Dvisvgm);
        assert_eq!(settings.svg_tool_path, "dvisvgm");
        assert!(settings.preamble.is_empty());
        assert_eq!(settings.cache_dir, PathBuf::from("/project/.tikz-cache"));
        assert_eq!(settings.timeout_ms, 30_000);
    }

    #[test]
    fn test_parse_render_config() {
        let toml = r#"
[render]
engine = "lualatex"
svg_tool = "pdftocairo"
svg_tool_path = "/usr/bin/pdftocairo"
preamble = ["\\usepackage{amsmath}"]
cache_dir = "build/tikz"
timeout_ms = 5000
"#;
        let settings = resolved(toml, Path::new("/project"));
        assert_eq!(settings.engine, Engine::Lualatex);
        assert_eq!(settings.engine_path, "lualatex");
        assert_eq!(settings.svg_tool, SvgTool::Pdftocairo);
        assert_eq!(settings.svg_tool_path, "/usr/bin/pdftocairo");
        assert_eq!(settings.preamble, vec!["\\usepackage{amsmath}".to_owned()]);
        assert_eq!(settings.cache_dir, PathBuf::from("/project/build/tikz"));
        assert_eq!(settings.timeout(), Some(Duration::from_millis(5000)));
    }

    #[test]
    fn test_absolute_cache_dir_kept() {
        let settings = resolved("[render]\ncache_dir = \"/var/cache/tikz\"", Path::new("/project"));
        assert_eq!(settings.cache_dir, PathBuf::from("/var/cache/tikz"));
    }

    #[test]
    fn test_unknown_engine_rejected() {
        let result: Result<Config, _> = toml::from_str("[render]\nengine = \"latexmk\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_engine_from_str_matches_serde_names() {
        for engine in [Engine::Pdflatex, Engine::Lualatex, Engine::Xelatex, Engine::Tectonic] {
            assert_eq!(engine.as_str().parse::<Engine>(), Ok(engine));
        }
        assert_eq!("pdftocairo".parse::<SvgTool>(), Ok(SvgTool::Pdftocairo));
        assert!("latex".parse::<Engine>().unwrap_err().contains("latex"));
    }

    #[test]
    fn test_unknown_render_key_rejected() {
        let result: Result<Config, _> = toml::from_str("[render]\nengien = \"xelatex\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_timeout_disables() {
        let settings = resolved("[render]\ntimeout_ms = 0", Path::new("/p"));
        assert_eq!(settings.timeout(), None);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_engine_path() {
        let settings = RenderSettings {
            engine_path: String::new(),
            ..RenderSettings::default_with_cache_dir(PathBuf::from("/c"))
        };
        assert_validation_error(&settings, &["render.engine_path", "empty"]);
    }

    #[test]
    fn test_validate_empty_svg_tool_path() {
        let settings = RenderSettings {
            svg_tool_path: "  ".to_owned(),
            ..RenderSettings::default_with_cache_dir(PathBuf::from("/c"))
        };
        assert_validation_error(&settings, &["render.svg_tool_path", "empty"]);
    }

    #[test]
    fn test_validate_timeout_too_high() {
        let settings = RenderSettings {
            timeout_ms: MAX_TIMEOUT_MS + 1,
            ..RenderSettings::default_with_cache_dir(PathBuf::from("/c"))
        };
        assert_validation_error(&settings, &["timeout_ms", "600000"]);
    }

    #[test]
    fn test_signature_ignores_cache_dir_and_timeout() {
        let a = RenderSettings::default_with_cache_dir(PathBuf::from("/a"));
        let b = RenderSettings {
            timeout_ms: 1,
            ..RenderSettings::default_with_cache_dir(PathBuf::from("/b"))
        };
        assert_eq!(a.signature(), b.signature());
    }

    #[test]
    fn test_signature_tracks_output_settings() {
        let base = RenderSettings::default_with_cache_dir(PathBuf::from("/a"));
        let variants = [
            RenderSettings {
                engine: Engine::Xelatex,
                ..base.clone()
            },
            RenderSettings {
                engine_path: "/opt/pdflatex".to_owned(),
                ..base.clone()
            },
            RenderSettings {
                svg_tool: SvgTool::Pdftocairo,
                ..base.clone()
            },
            RenderSettings {
                preamble: vec!["\\usepackage{x}".to_owned()],
                ..base.clone()
            },
        ];
        for variant in variants {
            assert_ne!(variant.signature(), base.signature());
        }
    }

    #[test]
    fn test_signature_is_json() {
        let settings = RenderSettings::default_with_cache_dir(PathBuf::from("/a"));
        let value: serde_json::Value = serde_json::from_str(&settings.signature()).unwrap();
        assert_eq!(value["engine"], "pdflatex");
        assert_eq!(value["svg_tool"], "dvisvgm");
    }

    #[test]
    fn test_cli_engine_resets_default_path() {
        let mut raw = RenderConfigRaw {
            engine: Some(Engine::Pdflatex),
            engine_path: Some("pdflatex".to_owned()),
            ..RenderConfigRaw::default()
        };
        raw.apply_cli_settings(&CliSettings {
            engine: Some(Engine::Tectonic),
            ..CliSettings::default()
        });
        let settings = raw.resolve(PathBuf::from("/c"));
        assert_eq!(settings.engine, Engine::Tectonic);
        assert_eq!(settings.engine_path, "tectonic");
    }

    #[test]
    fn test_cli_timeout_override() {
        let mut raw = RenderConfigRaw::default();
        raw.apply_cli_settings(&CliSettings {
            timeout_ms: Some(100),
            ..CliSettings::default()
        });
        assert_eq!(raw.resolve(PathBuf::from("/c")).timeout_ms, 100);
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tikzmd.toml");
        std::fs::write(&path, "[render]\nengine = \"xelatex\"\n").unwrap();

        let config = Config::load(Some(&path), None).unwrap();
        assert_eq!(config.config_path.as_deref(), Some(path.as_path()));
        let settings = config.render_settings();
        assert_eq!(settings.engine, Engine::Xelatex);
        assert_eq!(settings.cache_dir, dir.path().join(".tikz-cache"));
    }

    #[test]
    fn test_load_cli_cache_dir_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tikzmd.toml");
        std::fs::write(&path, "[render]\ncache_dir = \"cfg-cache\"\n").unwrap();

        let cli = CliSettings {
            cache_dir: Some(PathBuf::from("/tmp/cli-cache")),
            ..CliSettings::default()
        };
        let config = Config::load(Some(&path), Some(&cli)).unwrap();
        assert_eq!(config.render_resolved.cache_dir, PathBuf::from("/tmp/cli-cache"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Some(Path::new("/nonexistent/tikzmd.toml")), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tikzmd.toml");
        std::fs::write(&path, "[render\n").unwrap();
        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tikzmd.toml");
        std::fs::write(&path, "[render]\nengine_path = \"\"\n").unwrap();
        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }
}
