//! Style name policy for diagram styles.
//!
//! Valid names are non-empty and consist of ASCII letters, digits and `:`
//! (used to namespace categories, e.g. `Circuit:Gate`).

use std::sync::LazyLock;

use regex::Regex;

static VALID_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9:]+$").unwrap());
static SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s_/.-]+").unwrap());
static DISALLOWED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9:]").unwrap());
static REPEATED_COLONS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r":{2,}").unwrap());

/// Fallback when nothing usable remains of a name.
pub const DEFAULT_STYLE_NAME: &str = "style";

/// Check a style name against the policy.
#[must_use]
pub fn is_valid_style_name(name: &str) -> bool {
    VALID_NAME.is_match(name)
}

/// Closest valid name to `name`.
///
/// Separator runs (whitespace, `_`, `/`, `.`, `-`) become a single `:`, other
/// disallowed characters are dropped, and one leading and trailing `:` is
/// trimmed.
#[must_use]
pub fn suggest_style_name(name: &str) -> String {
    let separated = SEPARATORS.replace_all(name, ":");
    let filtered = DISALLOWED.replace_all(&separated, "");
    let collapsed = REPEATED_COLONS.replace_all(&filtered, ":");
    let trimmed = collapsed.strip_prefix(':').unwrap_or(&collapsed);
    let trimmed = trimmed.strip_suffix(':').unwrap_or(trimmed);

    if trimmed.is_empty() {
        DEFAULT_STYLE_NAME.to_owned()
    } else {
        trimmed.to_owned()
    }
}
