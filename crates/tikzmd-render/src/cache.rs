//! Cache key computation.

use sha2::{Digest, Sha256};
use tikzmd_config::RenderSettings;

use crate::consts::{BASE_NAME_KEY_LEN, BASE_NAME_PREFIX};

/// Inputs identifying one compiled artifact.
#[derive(Debug)]
pub struct TikzKey<'a> {
    /// Raw fence or picture content, before wrapping.
    pub content: &'a str,
    /// Canonical settings signature, see [`RenderSettings::signature`].
    pub signature: &'a str,
}

impl<'a> TikzKey<'a> {
    #[must_use]
    pub fn new(content: &'a str, signature: &'a str) -> Self {
        Self { content, signature }
    }

    /// SHA-256 over content followed by signature, hex encoded.
    #[must_use]
    pub fn compute_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.content.as_bytes());
        hasher.update(self.signature.as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Cache key for `content` compiled with `settings`.
#[must_use]
pub fn key_for(content: &str, settings: &RenderSettings) -> String {
    let signature = settings.signature();
    TikzKey::new(content, &signature).compute_hash()
}

/// Artifact base file name for a key.
#[must_use]
pub fn base_name(key: &str) -> String {
    let prefix = key.get(..BASE_NAME_KEY_LEN).unwrap_or(key);
    format!("{BASE_NAME_PREFIX}{prefix}")
}
