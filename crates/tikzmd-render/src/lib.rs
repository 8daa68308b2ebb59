//! TikZ compilation for tikzmd.
//!
//! - [`Compiler`] runs the external pipeline: a LaTeX engine, then an
//!   optional PDF to SVG converter, each bounded by a timeout
//! - [`CompilationManager`] caches artifacts and errors per content key and
//!   guarantees one pipeline per key at a time
//! - [`extract_tikz_fences`] and [`render_fence_markup`] connect the manager
//!   to Markdown documents
//!
//! # Example
//!
//! ```no_run
//! use std::path::PathBuf;
//! use tikzmd_config::RenderSettings;
//! use tikzmd_render::{CompilationManager, CompileState};
//!
//! # async fn run() {
//! let settings = RenderSettings::default_with_cache_dir(PathBuf::from(".tikz-cache"));
//! let manager = CompilationManager::default();
//! let content = r"\draw (0,0) -- (1,1);";
//! let key = manager.key_for(content, &settings);
//! manager.ensure_compilation(&key, content, &settings, false);
//! if let CompileState::Resolved(svg) = manager.wait_settled(&key).await {
//!     println!("{}", svg.display());
//! }
//! # }
//! ```

mod cache;
mod compile;
mod consts;
mod debouncer;
mod error;
mod manager;
mod markdown;
mod wrap;

pub use cache::{TikzKey, base_name, key_for};
pub use compile::{CompileRequest, CompileResult, Compiler};
pub use consts::REFRESH_DEBOUNCE;
pub use debouncer::RefreshEvent;
pub use error::{CompileError, CompileErrorKind};
pub use manager::{CompilationManager, CompileState};
pub use markdown::{TikzFence, extract_tikz_fences, render_fence_markup};
pub use wrap::wrap_tikz_source;
