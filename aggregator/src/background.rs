//! Lifetime of the aggregator's background work.
//!
//! At most one activity ticker runs at a time; installing a new one cancels
//! its predecessor. Stopping broadcasts to every subscriber (the HTTP server
//! among them) and cancels the ticker. Once stopped, nothing restarts.

use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{broadcast, Mutex};
use tracing::debug;

use crate::activity::ActivityTicker;

pub struct BackgroundTasks {
    stop_tx: broadcast::Sender<()>,
    ticker: Mutex<Option<ActivityTicker>>,
    stopped: AtomicBool,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        let (stop_tx, _) = broadcast::channel(1);
        Self {
            stop_tx,
            ticker: Mutex::new(None),
            stopped: AtomicBool::new(false),
        }
    }

    /// A receiver notified when [`stop_all`](Self::stop_all) runs.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.stop_tx.subscribe()
    }

    /// Install `ticker`, cancelling the one it replaces.
    ///
    /// Returns whether a previous ticker was replaced. After `stop_all` the
    /// new ticker is cancelled instead of installed.
    pub async fn replace_ticker(&self, ticker: ActivityTicker) -> bool {
        let mut slot = self.ticker.lock().await;
        if self.is_stopped() {
            debug!("background tasks stopped, discarding activity ticker");
            ticker.cancel();
            return false;
        }
        match slot.replace(ticker) {
            Some(previous) => {
                previous.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel the running ticker, if any.
    pub async fn stop_ticker(&self) -> bool {
        match self.ticker.lock().await.take() {
            Some(ticker) => {
                ticker.cancel();
                true
            }
            None => false,
        }
    }

    pub async fn ticker_running(&self) -> bool {
        self.ticker
            .lock()
            .await
            .as_ref()
            .is_some_and(|ticker| !ticker.is_finished())
    }

    /// Notify every subscriber and cancel the ticker.
    pub async fn stop_all(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        let _ = self.stop_tx.send(());
        self.stop_ticker().await;
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

impl Default for BackgroundTasks {
    fn default() -> Self {
        Self::new()
    }
}
