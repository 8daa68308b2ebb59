//! External process pipeline: LaTeX engine, then optional SVG conversion.
//!
//! # Files
//!
//! For a base name `B` in the cache directory:
//! - `B.tmp.tex` is written from the request source
//! - the engine produces `B.tmp.pdf` and `B.tmp.log`
//! - the SVG tool produces `B.tmp.svg`
//! - on full success the temp outputs are copied to `B.pdf` and `B.svg`

use std::ffi::OsString;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tikzmd_config::{Engine, RenderSettings, SvgTool};
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::sync::Semaphore;

use crate::error::{CompileError, CompileErrorKind};

/// One compilation job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileRequest {
    /// Complete LaTeX document.
    pub tex_source: String,
    /// File stem shared by every file of this job.
    pub base_name: String,
    pub cache_dir: PathBuf,
    /// Also convert the PDF to SVG.
    pub svg: bool,
}

/// Final artifact locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileResult {
    pub pdf: PathBuf,
    /// Present when SVG output was requested.
    pub svg: Option<PathBuf>,
    /// Engine log, which may not exist if the engine never ran.
    pub log: PathBuf,
}

/// Engine command-line arguments.
fn engine_args(engine: Engine, tex: &Path, out_dir: &Path) -> Vec<OsString> {
    match engine {
        Engine::Tectonic => vec![
            "-X".into(),
            "compile".into(),
            tex.into(),
            "--outdir".into(),
            out_dir.into(),
            "--keep-logs".into(),
            "--keep-intermediates".into(),
        ],
        Engine::Pdflatex | Engine::Lualatex | Engine::Xelatex => vec![
            "-interaction=nonstopmode".into(),
            "-halt-on-error".into(),
            "-output-directory".into(),
            out_dir.into(),
            tex.into(),
        ],
    }
}

/// SVG converter command-line arguments.
fn svg_args(tool: SvgTool, pdf: &Path, svg: &Path) -> Vec<OsString> {
    match tool {
        SvgTool::Dvisvgm => vec![
            "--pdf".into(),
            "--no-fonts".into(),
            "--exact".into(),
            pdf.into(),
            "-o".into(),
            svg.into(),
        ],
        SvgTool::Pdftocairo => vec!["-svg".into(), pdf.into(), svg.into()],
    }
}

/// Compilation service.
///
/// Holds no render configuration; settings are passed with every call. The
/// number of pipelines running at once is bounded.
#[derive(Debug, Clone)]
pub struct Compiler {
    permits: Arc<Semaphore>,
}

impl Default for Compiler {
    fn default() -> Self {
        let parallelism = std::thread::available_parallelism().map_or(1, NonZeroUsize::get);
        Self::with_max_concurrent(parallelism)
    }
}

impl Compiler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiler running at most `max` pipelines concurrently.
    #[must_use]
    pub fn with_max_concurrent(max: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max.max(1))),
        }
    }

    /// Run the engine and, if requested, the SVG tool.
    ///
    /// Every process is bounded by `settings.timeout()`; a process that
    /// exceeds it is killed and the call returns a `TimedOut` error.
    ///
    /// # Errors
    ///
    /// Returns `CompileError` if writing the source fails, a process cannot
    /// be started, exits unsuccessfully, times out, or leaves no output file.
    pub async fn compile(
        &self,
        request: &CompileRequest,
        settings: &RenderSettings,
    ) -> Result<CompileResult, CompileError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| CompileError::new(CompileErrorKind::Spawn, "compiler is shut down"))?;

        let start = Instant::now();
        let cache_dir = std::path::absolute(&request.cache_dir)
            .map_err(|e| CompileError::io("Failed to resolve cache directory", &e))?;
        tokio::fs::create_dir_all(&cache_dir)
            .await
            .map_err(|e| CompileError::io("Failed to create cache directory", &e))?;

        let base = &request.base_name;
        let tex = cache_dir.join(format!("{base}.tmp.tex"));
        let tmp_pdf = cache_dir.join(format!("{base}.tmp.pdf"));
        let tmp_svg = cache_dir.join(format!("{base}.tmp.svg"));
        let log = cache_dir.join(format!("{base}.tmp.log"));

        tokio::fs::write(&tex, &request.tex_source)
            .await
            .map_err(|e| CompileError::io("Failed to write TeX source", &e))?;

        let timeout = settings.timeout();
        run_process(
            &settings.engine_path,
            &engine_args(settings.engine, &tex, &cache_dir),
            &cache_dir,
            timeout,
        )
        .await
        .map_err(|e| attach_log_path(e, &log))?;
        require_output(&settings.engine_path, &tmp_pdf, &log).await?;

        if request.svg {
            run_process(
                &settings.svg_tool_path,
                &svg_args(settings.svg_tool, &tmp_pdf, &tmp_svg),
                &cache_dir,
                timeout,
            )
            .await
            .map_err(|e| attach_log_path(e, &log))?;
            require_output(&settings.svg_tool_path, &tmp_svg, &log).await?;
        }

        let pdf = cache_dir.join(format!("{base}.pdf"));
        copy_artifact(&tmp_pdf, &pdf).await?;
        let svg = if request.svg {
            let svg = cache_dir.join(format!("{base}.svg"));
            copy_artifact(&tmp_svg, &svg).await?;
            Some(svg)
        } else {
            None
        };

        tracing::info!(
            base = %base,
            engine = %settings.engine,
            svg = request.svg,
            elapsed_ms = start.elapsed().as_millis(),
            "Compiled TikZ"
        );

        Ok(CompileResult { pdf, svg, log })
    }
}

/// Spawn failures carry no stderr; point at the LaTeX log instead.
fn attach_log_path(err: CompileError, log: &Path) -> CompileError {
    if err.kind == CompileErrorKind::Spawn && err.log.is_none() {
        err.with_log(log.display().to_string())
    } else {
        err
    }
}

/// Run `program` to completion, capturing stderr.
async fn run_process(
    program: &str,
    args: &[OsString],
    cwd: &Path,
    timeout: Option<Duration>,
) -> Result<(), CompileError> {
    tracing::debug!(program, ?args, "Spawning process");

    let mut child = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            CompileError::new(
                CompileErrorKind::Spawn,
                format!("{program} failed to start: {e}"),
            )
        })?;

    let mut stderr_pipe = child.stderr.take();
    let mut stderr = Vec::new();

    let outcome = {
        let run = async {
            if let Some(pipe) = stderr_pipe.as_mut() {
                pipe.read_to_end(&mut stderr).await?;
            }
            child.wait().await
        };
        match timeout {
            Some(limit) => tokio::time::timeout(limit, run).await.ok(),
            None => Some(run.await),
        }
    };

    let captured = String::from_utf8_lossy(&stderr).into_owned();

    let Some(status) = outcome else {
        if let Err(e) = child.kill().await {
            tracing::warn!(program, error = %e, "Failed to kill timed out process");
        }
        let ms = timeout.map_or(0, |t| t.as_millis());
        return Err(CompileError::new(
            CompileErrorKind::TimedOut,
            format!("{program} timed out after {ms}ms"),
        )
        .with_log(captured));
    };

    let status: ExitStatus =
        status.map_err(|e| CompileError::io(&format!("{program} failed"), &e))?;
    if status.success() {
        return Ok(());
    }

    let code = status
        .code()
        .map_or_else(|| "unknown".to_owned(), |c| c.to_string());
    Err(CompileError::new(
        CompileErrorKind::ExitStatus,
        format!("{program} exited with code {code}"),
    )
    .with_log(captured))
}

/// A zero exit status is not enough; the output file must exist too.
async fn require_output(program: &str, output: &Path, log: &Path) -> Result<(), CompileError> {
    let exists = tokio::fs::try_exists(output)
        .await
        .map_err(|e| CompileError::io("Failed to check artifact", &e))?;
    if exists {
        return Ok(());
    }
    Err(CompileError::new(
        CompileErrorKind::MissingOutput,
        format!("{program} did not produce {}", output.display()),
    )
    .with_log(log.display().to_string()))
}

async fn copy_artifact(from: &Path, to: &Path) -> Result<(), CompileError> {
    tokio::fs::copy(from, to)
        .await
        .map(|_| ())
        .map_err(|e| CompileError::io("Failed to copy artifact", &e))
}

#[cfg(all(test, unix))]
pub(crate) mod test_support {
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    /// Write an executable `/bin/sh` script.
    pub(crate) fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    /// Fake pdflatex: `$5` is the `.tex` path. Appends a line to `runs.txt`
    /// next to the script on every invocation.
    pub(crate) fn fake_engine(dir: &Path) -> PathBuf {
        let runs = dir.join("runs.txt");
        script(
            dir,
            "fake-latex",
            &format!(
                "echo run >> '{}'\nprintf '%%PDF' > \"${{5%.tex}}.pdf\"\necho log > \"${{5%.tex}}.log\"",
                runs.display()
            ),
        )
    }

    /// Fake dvisvgm: `$6` is the output path.
    pub(crate) fn fake_svg_tool(dir: &Path) -> PathBuf {
        script(dir, "fake-svg", "echo '<svg/>' > \"$6\"")
    }
}
