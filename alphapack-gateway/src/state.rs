//! Shared application state.
//!
//! One context object constructed at startup and passed by `Arc` into every
//! component; the mutable bits are atomics rather than hidden globals.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tokio::sync::Semaphore;

use alphapack_core::Settings;

/// Shared application state
pub struct AppState {
    /// Settings loaded at startup.
    pub settings: Settings,
    /// Whether the bot currently reacts to commands; flipped by operators,
    /// read on every message.
    bot_enabled: AtomicBool,
    /// Per-user tasks currently running across all requests.
    in_flight: AtomicUsize,
    /// Process-wide cap on simultaneous image downloads.
    pub download_limiter: Arc<Semaphore>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let enabled = settings.discord.enabled;
        let concurrency = settings.processing.download_concurrency.max(1);
        Self {
            settings,
            bot_enabled: AtomicBool::new(enabled),
            in_flight: AtomicUsize::new(0),
            download_limiter: Arc::new(Semaphore::new(concurrency)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.bot_enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.bot_enabled.store(enabled, Ordering::Relaxed);
    }

    /// Record a per-user task start.
    pub fn task_started(&self) {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
    }

    /// Record a per-user task completion.
    pub fn task_finished(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    /// Currently executing per-user tasks.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_flight_tracks_starts_and_finishes() {
        let state = AppState::new(Settings::default());
        assert_eq!(state.in_flight(), 0);
        state.task_started();
        state.task_started();
        assert_eq!(state.in_flight(), 2);
        state.task_finished();
        assert_eq!(state.in_flight(), 1);
    }

    #[test]
    fn enabled_flag_follows_settings_and_toggles() {
        let state = AppState::new(Settings::default());
        assert!(state.is_enabled());
        state.set_enabled(false);
        assert!(!state.is_enabled());
    }
}
