//! Environment variable and home directory expansion for configuration strings.

use std::path::PathBuf;

use crate::ConfigError;

/// Expand `${VAR}` and `${VAR:-default}` references.
///
/// Unset variables without a default are an error. Bare `$VAR` is left as is.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, |var| -> Result<Option<String>, LookupError> {
        match std::env::var(var) {
            Ok(val) => Ok(Some(val)),
            Err(_) => Err(LookupError {
                var_name: var.to_owned(),
            }),
        }
    })
    .map(std::borrow::Cow::into_owned)
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{0}}} not set", e.cause.var_name),
    })
}

/// Expand environment variables, then a leading `~`.
pub(crate) fn expand_path(value: &str, field: &str) -> Result<PathBuf, ConfigError> {
    let expanded = expand_env(value, field)?;
    Ok(PathBuf::from(shellexpand::tilde(&expanded).into_owned()))
}

/// Per-user data directory: `$XDG_DATA_HOME`, else `~/.local/share`.
pub(crate) fn data_dir() -> PathBuf {
    match std::env::var("XDG_DATA_HOME") {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => PathBuf::from(shellexpand::tilde("~/.local/share").into_owned()),
    }
}

struct LookupError {
    var_name: String,
}
