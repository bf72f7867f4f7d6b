//! Shutdown coordination for the collector.
//!
//! The HTTP server listens on the broadcast channel for its graceful stop;
//! housekeeping tasks (the rate limiter sweep) are spawned through
//! [`Shutdown::spawn_background`] so the server can wait for them on exit.

use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Graceful shutdown coordinator.
///
/// Cheap to clone; clones share the channel and the task list. Subscribers
/// treat a dropped coordinator as a shutdown, so one clone must outlive the
/// server.
#[derive(Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
    background: Arc<Mutex<Vec<(&'static str, JoinHandle<()>)>>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            tx,
            background: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Run `task` until it completes or shutdown fires.
    pub fn spawn_background<F>(&self, name: &'static str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut stop = self.subscribe();
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = task => {}
                _ = stop.recv() => tracing::debug!(task = name, "Background task stopped"),
            }
        });

        self.background
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((name, handle));
    }

    /// Trigger shutdown and wait for every background task to finish.
    pub async fn drain(&self) {
        self.trigger();

        let tasks = std::mem::take(
            &mut *self
                .background
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        );

        for (name, handle) in tasks {
            if let Err(e) = handle.await {
                tracing::warn!(task = name, error = %e, "Background task ended abnormally");
            }
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
