//! Internal constants for TikZ compilation.

use std::time::Duration;

/// Window in which settled compilations are coalesced into one refresh.
pub const REFRESH_DEBOUNCE: Duration = Duration::from_millis(150);

/// Prefix of artifact file names in the cache directory.
pub(crate) const BASE_NAME_PREFIX: &str = "tikzmd-";

/// Number of key characters used in artifact file names.
pub(crate) const BASE_NAME_KEY_LEN: usize = 16;

/// Capacity of the refresh broadcast channel.
pub(crate) const REFRESH_CHANNEL_CAPACITY: usize = 16;
