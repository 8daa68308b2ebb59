//! Standalone document synthesis around TikZ fragments.

const DOCUMENT_CLASS: &str = "\\documentclass[tikz,border=2pt]{standalone}";
const TIKZ_LIBRARIES: &str = "\\usetikzlibrary{arrows.meta,positioning,calc,shapes,fit}";

/// Wrap `content` into a compilable LaTeX document.
///
/// Content that already contains `\begin{document}` is returned unchanged.
/// Otherwise a `standalone` document is built, with `preamble` lines inserted
/// verbatim before `\begin{document}`; the content is put inside a
/// `tikzpicture` unless it already opens one.
#[must_use]
pub fn wrap_tikz_source(content: &str, preamble: &[String]) -> String {
    if content.contains("\\begin{document}") {
        return content.to_owned();
    }

    let mut lines: Vec<&str> = vec![DOCUMENT_CLASS, TIKZ_LIBRARIES];
    lines.extend(preamble.iter().map(String::as_str));
    lines.push("\\begin{document}");
    if content.contains("\\begin{tikzpicture}") {
        lines.push(content);
    } else {
        lines.extend(["\\begin{tikzpicture}", content, "\\end{tikzpicture}"]);
    }
    lines.push("\\end{document}");
    lines.join("\n")
}
