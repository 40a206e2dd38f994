//! Reference-counted per-channel typing indicator.
//!
//! Every in-flight task for a channel holds one reference; the periodic
//! ping task exists exactly while the count is non-zero. All transitions for
//! a channel happen under one lock, so start/stop interleavings from many
//! tasks cannot leak a pinger or double-spawn one.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::debug;

/// Interval between activity pings; Discord's indicator lasts ~10 s, so 5 s
/// keeps it lit continuously.
const TYPING_INTERVAL: Duration = Duration::from_secs(5);

/// Sends one "typing" activity ping to a channel.
#[async_trait]
pub trait TypingPing: Send + Sync + 'static {
    async fn ping(&self, channel_id: u64);
}

struct ChannelTyper {
    refs: usize,
    handle: JoinHandle<()>,
}

/// Reference-counted typing indicator manager.
pub struct TypingManager {
    pinger: Arc<dyn TypingPing>,
    channels: tokio::sync::Mutex<HashMap<u64, ChannelTyper>>,
}

impl TypingManager {
    pub fn new(pinger: Arc<dyn TypingPing>) -> Self {
        Self {
            pinger,
            channels: tokio::sync::Mutex::new(HashMap::new()),
        }
    }

    /// Add one reference for `channel_id`; 0 -> 1 spawns the pinger.
    pub async fn start(&self, channel_id: u64) {
        let mut channels = self.channels.lock().await;
        if let Some(typer) = channels.get_mut(&channel_id) {
            typer.refs += 1;
            return;
        }

        debug!(channel_id, "Starting typing indicator");
        let pinger = Arc::clone(&self.pinger);
        let handle = tokio::spawn(async move {
            let mut ticker = interval(TYPING_INTERVAL);
            loop {
                ticker.tick().await;
                pinger.ping(channel_id).await;
            }
        });
        channels.insert(channel_id, ChannelTyper { refs: 1, handle });
    }

    /// Drop one reference for `channel_id`; 1 -> 0 cancels the pinger.
    pub async fn stop(&self, channel_id: u64) {
        let mut channels = self.channels.lock().await;
        let Some(typer) = channels.get_mut(&channel_id) else {
            return;
        };

        typer.refs -= 1;
        if typer.refs == 0 {
            debug!(channel_id, "Stopping typing indicator");
            if let Some(typer) = channels.remove(&channel_id) {
                typer.handle.abort();
            }
        }
    }

    /// Number of channels with a live indicator.
    pub async fn active_channels(&self) -> usize {
        self.channels.lock().await.len()
    }
}

impl Drop for TypingManager {
    fn drop(&mut self) {
        // Tasks hold only the pinger; abort them rather than letting them
        // ping forever if the manager goes away mid-run.
        if let Ok(channels) = self.channels.try_lock() {
            for typer in channels.values() {
                typer.handle.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingPing {
        pings: AtomicUsize,
    }

    #[async_trait]
    impl TypingPing for CountingPing {
        async fn ping(&self, _channel_id: u64) {
            self.pings.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn manager() -> (TypingManager, Arc<CountingPing>) {
        let pinger = Arc::new(CountingPing {
            pings: AtomicUsize::new(0),
        });
        (
            TypingManager::new(Arc::clone(&pinger) as Arc<dyn TypingPing>),
            pinger,
        )
    }

    #[tokio::test]
    async fn refcount_spawns_once_and_stops_at_zero() {
        let (manager, _pinger) = manager();

        manager.start(1).await;
        manager.start(1).await;
        assert_eq!(manager.active_channels().await, 1);

        manager.stop(1).await;
        assert_eq!(manager.active_channels().await, 1);

        manager.stop(1).await;
        assert_eq!(manager.active_channels().await, 0);
    }

    #[tokio::test]
    async fn channels_are_independent() {
        let (manager, _pinger) = manager();

        manager.start(1).await;
        manager.start(2).await;
        assert_eq!(manager.active_channels().await, 2);

        manager.stop(1).await;
        assert_eq!(manager.active_channels().await, 1);

        manager.stop(2).await;
        assert_eq!(manager.active_channels().await, 0);
    }

    #[tokio::test]
    async fn stop_without_start_is_a_no_op() {
        let (manager, _pinger) = manager();
        manager.stop(9).await;
        assert_eq!(manager.active_channels().await, 0);
    }

    #[tokio::test]
    async fn pinger_fires_while_running() {
        let (manager, pinger) = manager();
        manager.start(1).await;

        // First tick of `interval` fires immediately.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(pinger.pings.load(Ordering::SeqCst) >= 1);

        manager.stop(1).await;
        let after_stop = pinger.pings.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(pinger.pings.load(Ordering::SeqCst), after_stop);
    }
}
