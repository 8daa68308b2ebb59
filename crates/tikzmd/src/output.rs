//! Colored terminal output utilities.
//!
//! Status lines go to stderr; stdout carries only command results (JSON,
//! paths, HTML) so it can be piped.

use std::path::Path;

use console::{Style, Term};

#[derive(Clone, Copy)]
enum Tone {
    Plain,
    Success,
    Warning,
    Error,
}

/// Terminal output formatter.
pub(crate) struct Output {
    term: Term,
    stdout: Term,
    green: Style,
    yellow: Style,
    red: Style,
    cyan_bold: Style,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            stdout: Term::stdout(),
            green: Style::new().green(),
            yellow: Style::new().yellow(),
            red: Style::new().red(),
            cyan_bold: Style::new().cyan().bold(),
        }
    }

    fn line(&self, tone: Tone, msg: &str) {
        let styled = match tone {
            Tone::Plain => msg.to_owned(),
            Tone::Success => self.green.apply_to(msg).to_string(),
            Tone::Warning => self.yellow.apply_to(msg).to_string(),
            Tone::Error => self.red.apply_to(msg).to_string(),
        };
        let _ = self.term.write_line(&styled);
    }

    pub(crate) fn info(&self, msg: &str) {
        self.line(Tone::Plain, msg);
    }

    pub(crate) fn success(&self, msg: &str) {
        self.line(Tone::Success, msg);
    }

    pub(crate) fn warning(&self, msg: &str) {
        self.line(Tone::Warning, msg);
    }

    pub(crate) fn error(&self, msg: &str) {
        self.line(Tone::Error, msg);
    }

    /// `label: path` with the path highlighted.
    pub(crate) fn artifact(&self, label: &str, path: &Path) {
        let path = self.cyan_bold.apply_to(path.display()).to_string();
        let _ = self.term.write_line(&format!("{label}: {path}"));
    }

    /// Command result on stdout, unstyled.
    pub(crate) fn result(&self, text: &str) {
        let _ = self.stdout.write_line(text);
    }
}
