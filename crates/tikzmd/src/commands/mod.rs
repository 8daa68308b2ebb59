//! CLI command implementations.

mod compile;
mod graph;
mod parse;
mod preview;
mod render_args;

pub(crate) use compile::CompileArgs;
pub(crate) use graph::GraphArgs;
pub(crate) use parse::ParseArgs;
pub(crate) use preview::PreviewArgs;
