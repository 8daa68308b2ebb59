//! Per-key compilation state and artifact cache.
//!
//! # Architecture
//!
//! Each cache key moves through `absent -> pending -> resolved | failed`.
//! [`CompilationManager::ensure_compilation`] is the only way into
//! `pending`; at most one pipeline runs per key, and concurrent callers for a
//! pending key are no-ops. Results and errors stay cached until a forced
//! rebuild or [`CompilationManager::clear`].
//!
//! Every settle schedules a debounced [`RefreshEvent`].

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tikzmd_config::RenderSettings;
use tokio::sync::{Notify, broadcast};

use crate::cache::{base_name, key_for};
use crate::compile::{CompileRequest, Compiler};
use crate::consts::REFRESH_DEBOUNCE;
use crate::debouncer::{RefreshDebouncer, RefreshEvent};
use crate::wrap::wrap_tikz_source;

/// Observable state of one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileState {
    /// Never requested, or cleared.
    Absent,
    /// A pipeline is running.
    Pending,
    /// Artifact path: the SVG when produced, otherwise the PDF.
    Resolved(PathBuf),
    /// Error message of the last attempt.
    Failed(String),
}

impl CompileState {
    /// Whether the key is neither pending nor absent.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Resolved(_) | Self::Failed(_))
    }
}

#[derive(Default)]
struct ManagerState {
    cache: HashMap<String, PathBuf>,
    errors: HashMap<String, String>,
    pending: HashSet<String>,
    /// Bumped by `clear`; results of older pipelines are discarded.
    epoch: u64,
}

impl ManagerState {
    fn state(&self, key: &str) -> CompileState {
        if let Some(path) = self.cache.get(key) {
            CompileState::Resolved(path.clone())
        } else if let Some(message) = self.errors.get(key) {
            CompileState::Failed(message.clone())
        } else if self.pending.contains(key) {
            CompileState::Pending
        } else {
            CompileState::Absent
        }
    }
}

struct Shared {
    state: Mutex<ManagerState>,
    settled: Notify,
    refresh: RefreshDebouncer,
}

/// Compilation manager.
///
/// Cheap to clone; clones share state. Methods that start work must be called
/// within a Tokio runtime.
#[derive(Clone)]
pub struct CompilationManager {
    compiler: Compiler,
    shared: Arc<Shared>,
    svg_output: bool,
}

impl Default for CompilationManager {
    fn default() -> Self {
        Self::new(Compiler::default())
    }
}

impl CompilationManager {
    #[must_use]
    pub fn new(compiler: Compiler) -> Self {
        Self::with_refresh_window(compiler, REFRESH_DEBOUNCE)
    }

    /// Manager coalescing refresh notifications over `window`.
    #[must_use]
    pub fn with_refresh_window(compiler: Compiler, window: Duration) -> Self {
        Self {
            compiler,
            shared: Arc::new(Shared {
                state: Mutex::new(ManagerState::default()),
                settled: Notify::new(),
                refresh: RefreshDebouncer::new(window),
            }),
            svg_output: true,
        }
    }

    /// Whether pipelines convert to SVG (default) or stop at the PDF.
    #[must_use]
    pub fn with_svg_output(mut self, svg: bool) -> Self {
        self.svg_output = svg;
        self
    }

    /// Cache key for `content` under `settings`.
    #[must_use]
    pub fn key_for(&self, content: &str, settings: &RenderSettings) -> String {
        key_for(content, settings)
    }

    /// Artifact path for a resolved key.
    #[must_use]
    pub fn get_cached_svg(&self, key: &str) -> Option<PathBuf> {
        self.shared.state.lock().unwrap().cache.get(key).cloned()
    }

    /// Error message for a failed key.
    #[must_use]
    pub fn get_error(&self, key: &str) -> Option<String> {
        self.shared.state.lock().unwrap().errors.get(key).cloned()
    }

    #[must_use]
    pub fn state(&self, key: &str) -> CompileState {
        self.shared.state.lock().unwrap().state(key)
    }

    /// Receive a [`RefreshEvent`] after each burst of settled keys.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<RefreshEvent> {
        self.shared.refresh.subscribe()
    }

    /// Start compiling `content` under `key` unless already done or running.
    ///
    /// With `force`, a cached result or error for `key` is dropped first; a
    /// pending pipeline is still never duplicated.
    pub fn ensure_compilation(
        &self,
        key: &str,
        content: &str,
        settings: &RenderSettings,
        force: bool,
    ) {
        let epoch = {
            let mut state = self.shared.state.lock().unwrap();
            if force {
                state.cache.remove(key);
                state.errors.remove(key);
            } else if state.cache.contains_key(key) || state.errors.contains_key(key) {
                return;
            }
            if !state.pending.insert(key.to_owned()) {
                tracing::debug!(key, "Compilation already pending");
                return;
            }
            state.epoch
        };

        let request = CompileRequest {
            tex_source: wrap_tikz_source(content, &settings.preamble),
            base_name: base_name(key),
            cache_dir: settings.cache_dir.clone(),
            svg: self.svg_output,
        };
        let settings = settings.clone();
        let compiler = self.compiler.clone();
        let shared = Arc::clone(&self.shared);
        let key = key.to_owned();

        tracing::debug!(key = %key, base = %request.base_name, "Starting compilation");
        tokio::spawn(async move {
            let outcome = compiler.compile(&request, &settings).await;
            {
                let mut state = shared.state.lock().unwrap();
                if state.epoch != epoch {
                    tracing::debug!(key = %key, "Discarding result from before clear");
                    return;
                }
                state.pending.remove(&key);
                match outcome {
                    Ok(result) => {
                        let artifact = result.svg.unwrap_or(result.pdf);
                        tracing::debug!(key = %key, artifact = %artifact.display(), "Compilation resolved");
                        state.errors.remove(&key);
                        state.cache.insert(key.clone(), artifact);
                    }
                    Err(err) => {
                        tracing::warn!(key = %key, error = %err, "Compilation failed");
                        state.errors.insert(key.clone(), err.message);
                    }
                }
            }
            shared.settled.notify_waiters();
            shared.refresh.schedule(Some(&key));
        });
    }

    /// Wait until `key` is no longer pending and return its state.
    pub async fn wait_settled(&self, key: &str) -> CompileState {
        loop {
            let notified = self.shared.settled.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let state = self.state(key);
            if state != CompileState::Pending {
                return state;
            }
            notified.await;
        }
    }

    /// Drop every cached result, error and pending marker.
    pub fn clear(&self) {
        {
            let mut state = self.shared.state.lock().unwrap();
            state.cache.clear();
            state.errors.clear();
            state.pending.clear();
            state.epoch += 1;
        }
        tracing::debug!("Cleared compilation cache");
        self.shared.settled.notify_waiters();
        self.shared.refresh.schedule(None);
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::compile::test_support::{fake_engine, fake_svg_tool, script};
    use pretty_assertions::assert_eq;
    use std::path::Path;

    fn settings(dir: &Path, engine: &Path) -> RenderSettings {
        RenderSettings {
            engine_path: engine.display().to_string(),
            svg_tool_path: fake_svg_tool(dir).display().to_string(),
            ..RenderSettings::default_with_cache_dir(dir.join("cache"))
        }
    }

    fn run_count(dir: &Path) -> usize {
        std::fs::read_to_string(dir.join("runs.txt"))
            .map(|s| s.lines().count())
            .unwrap_or(0)
    }

    #[tokio::test]
    async fn test_resolves_to_svg() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path(), &fake_engine(dir.path()));
        let manager = CompilationManager::default();
        let key = manager.key_for("\\draw (0,0) -- (1,1);", &settings);

        assert_eq!(manager.state(&key), CompileState::Absent);
        manager.ensure_compilation(&key, "\\draw (0,0) -- (1,1);", &settings, false);
        assert_eq!(manager.state(&key), CompileState::Pending);

        let state = manager.wait_settled(&key).await;
        let expected = dir
            .path()
            .join("cache")
            .join(format!("tikzmd-{}.svg", &key[..16]));
        assert_eq!(state, CompileState::Resolved(expected.clone()));
        assert_eq!(manager.get_cached_svg(&key), Some(expected));
        assert_eq!(manager.get_error(&key), None);
    }

    #[tokio::test]
    async fn test_concurrent_requests_spawn_once() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path(), &fake_engine(dir.path()));
        let manager = CompilationManager::default();
        let key = manager.key_for("x", &settings);

        manager.ensure_compilation(&key, "x", &settings, false);
        manager.clone().ensure_compilation(&key, "x", &settings, false);
        manager.ensure_compilation(&key, "x", &settings, true);
        manager.wait_settled(&key).await;

        assert_eq!(run_count(dir.path()), 1);
    }

    #[tokio::test]
    async fn test_resolved_key_is_not_recompiled() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path(), &fake_engine(dir.path()));
        let manager = CompilationManager::default();
        let key = manager.key_for("x", &settings);

        manager.ensure_compilation(&key, "x", &settings, false);
        manager.wait_settled(&key).await;
        manager.ensure_compilation(&key, "x", &settings, false);
        assert!(manager.state(&key).is_settled());
        assert_eq!(run_count(dir.path()), 1);

        manager.ensure_compilation(&key, "x", &settings, true);
        assert_eq!(manager.state(&key), CompileState::Pending);
        manager.wait_settled(&key).await;
        assert_eq!(run_count(dir.path()), 2);
    }

    #[tokio::test]
    async fn test_failure_is_cached() {
        let dir = tempfile::tempdir().unwrap();
        let runs = dir.path().join("runs.txt");
        let engine = script(
            dir.path(),
            "bad-latex",
            &format!("echo run >> '{}'\necho boom >&2\nexit 1", runs.display()),
        );
        let settings = settings(dir.path(), &engine);
        let manager = CompilationManager::default();
        let key = manager.key_for("x", &settings);

        manager.ensure_compilation(&key, "x", &settings, false);
        let state = manager.wait_settled(&key).await;
        let CompileState::Failed(message) = &state else {
            panic!("expected failure, got {state:?}");
        };
        assert!(message.contains("exited with code 1"));
        assert_eq!(manager.get_cached_svg(&key), None);

        manager.ensure_compilation(&key, "x", &settings, false);
        assert!(manager.state(&key).is_settled());
        assert_eq!(run_count(dir.path()), 1);
    }

    #[tokio::test]
    async fn test_clear_resets_state_and_refreshes() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path(), &fake_engine(dir.path()));
        let manager = CompilationManager::with_refresh_window(Compiler::new(), Duration::from_millis(10));
        let mut refreshes = manager.subscribe();
        let key = manager.key_for("x", &settings);

        manager.ensure_compilation(&key, "x", &settings, false);
        manager.wait_settled(&key).await;
        assert_eq!(refreshes.recv().await.unwrap().keys, vec![key.clone()]);

        manager.clear();
        assert_eq!(manager.state(&key), CompileState::Absent);
        assert_eq!(refreshes.recv().await.unwrap(), RefreshEvent::default());
    }

    #[tokio::test]
    async fn test_clear_discards_in_flight_result() {
        let dir = tempfile::tempdir().unwrap();
        let engine = script(dir.path(), "slow-latex", "sleep 1\nprintf x > \"${5%.tex}.pdf\"");
        let settings = settings(dir.path(), &engine);
        let manager = CompilationManager::default();
        let key = manager.key_for("x", &settings);

        manager.ensure_compilation(&key, "x", &settings, false);
        manager.clear();
        assert_eq!(manager.wait_settled(&key).await, CompileState::Absent);

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(manager.state(&key), CompileState::Absent);
    }

    #[tokio::test]
    async fn test_pdf_only_resolves_to_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path(), &fake_engine(dir.path()));
        let manager = CompilationManager::default().with_svg_output(false);
        let key = manager.key_for("x", &settings);

        manager.ensure_compilation(&key, "x", &settings, false);
        let CompileState::Resolved(path) = manager.wait_settled(&key).await else {
            panic!("expected resolved");
        };
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("pdf"));
    }

    #[test]
    fn test_settings_change_changes_key() {
        let manager = CompilationManager::default();
        let a = RenderSettings::default_with_cache_dir(PathBuf::from("/c"));
        let b = RenderSettings {
            preamble: vec!["\\usepackage{tikz-cd}".to_owned()],
            ..a.clone()
        };
        assert_ne!(manager.key_for("x", &a), manager.key_for("x", &b));
        assert_eq!(manager.key_for("x", &a), manager.key_for("x", &a.clone()));
    }
}
