//! Refresh notification debouncing.
//!
//! Coalesces settle notifications arriving within one window into a single
//! [`RefreshEvent`], so consumers re-render once per burst instead of once
//! per compilation.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::consts::REFRESH_CHANNEL_CAPACITY;

/// Emitted once per debounce window.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RefreshEvent {
    /// Keys that settled during the window, in settle order. Empty after a
    /// cache clear.
    pub keys: Vec<String>,
}

#[derive(Default)]
struct DebounceState {
    timer: Option<JoinHandle<()>>,
    keys: Vec<String>,
}

/// Single-timer debouncer.
///
/// At most one timer is pending; scheduling while one is pending only records
/// the key.
pub(crate) struct RefreshDebouncer {
    state: Arc<Mutex<DebounceState>>,
    sender: broadcast::Sender<RefreshEvent>,
    window: Duration,
}

impl RefreshDebouncer {
    pub fn new(window: Duration) -> Self {
        let (sender, _) = broadcast::channel(REFRESH_CHANNEL_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(DebounceState::default())),
            sender,
            window,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RefreshEvent> {
        self.sender.subscribe()
    }

    /// Record a notification, starting the timer if none is pending.
    ///
    /// Must be called within a Tokio runtime.
    pub fn schedule(&self, key: Option<&str>) {
        let mut state = self.state.lock().unwrap();
        if let Some(key) = key
            && !state.keys.iter().any(|k| k == key)
        {
            state.keys.push(key.to_owned());
        }
        if state.timer.is_some() {
            return;
        }

        let shared = Arc::clone(&self.state);
        let sender = self.sender.clone();
        let window = self.window;
        state.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;
            let keys = {
                let mut state = shared.lock().unwrap();
                state.timer = None;
                std::mem::take(&mut state.keys)
            };
            tracing::debug!(keys = keys.len(), "Sending refresh");
            // No receivers is fine.
            let _ = sender.send(RefreshEvent { keys });
        }));
    }

    /// Abort the pending timer, dropping its notifications.
    pub fn cancel(&self) {
        let mut state = self.state.lock().unwrap();
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        state.keys.clear();
    }
}

impl Drop for RefreshDebouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
