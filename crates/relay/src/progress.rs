//! Upload progress, carried from the blocking upload worker back to the task
//! that owns the user's status message.
//!
//! The worker holds a [`ProgressReporter`] and never touches the chat. Reports
//! travel over a bounded channel to a single [`ProgressBridge`], which owns the
//! rate-limit state and is the only writer of the status message.

use std::{sync::Arc, time::Duration};

use {
    async_trait::async_trait,
    tokio::{
        sync::mpsc::{self, error::TrySendError},
        time::Instant,
    },
    tracing::debug,
};

pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(1500);
pub const BAR_SEGMENTS: u8 = 10;

/// Intermediate reports beyond this backlog are dropped; the bridge only
/// ever renders the latest one anyway.
const CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub bytes_sent: u64,
    pub bytes_total: u64,
}

impl ProgressUpdate {
    /// Whole percent transferred, clamped to `0..=100`. Zero when the total is
    /// unknown.
    #[must_use]
    pub fn percentage(&self) -> u8 {
        if self.bytes_total == 0 {
            return 0;
        }
        let pct = u128::from(self.bytes_sent) * 100 / u128::from(self.bytes_total);
        pct.min(100) as u8
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.bytes_total > 0 && self.bytes_sent >= self.bytes_total
    }
}

#[must_use]
pub fn render_bar(percentage: u8) -> String {
    let filled = percentage.min(100) / BAR_SEGMENTS;
    let mut bar = String::with_capacity(usize::from(BAR_SEGMENTS) * 3);
    for i in 0..BAR_SEGMENTS {
        bar.push(if i < filled { '█' } else { '░' });
    }
    bar
}

#[must_use]
pub fn render_status(update: ProgressUpdate) -> String {
    let pct = update.percentage();
    format!("Uploading… [{}] {pct}%", render_bar(pct))
}

/// Somewhere to show a single, repeatedly edited line of status text.
#[async_trait]
pub trait StatusSink: Send + Sync {
    async fn set_status(&self, text: &str) -> anyhow::Result<()>;
}

/// Create the reporter/receiver pair for one relay operation.
#[must_use]
pub fn progress_channel() -> (ProgressReporter, mpsc::Receiver<ProgressUpdate>) {
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    (ProgressReporter { tx }, rx)
}

/// Worker-side handle. Safe to call from a blocking thread.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    tx: mpsc::Sender<ProgressUpdate>,
}

impl ProgressReporter {
    /// Never blocks on intermediate reports. The completion report waits for
    /// channel capacity so the final state always reaches the bridge.
    pub fn report(&self, bytes_sent: u64, bytes_total: u64) {
        let update = ProgressUpdate {
            bytes_sent,
            bytes_total,
        };
        match self.tx.try_send(update) {
            Ok(()) | Err(TrySendError::Closed(_)) => {},
            Err(TrySendError::Full(update)) if update.is_complete() => {
                // Only reached on the upload worker thread, outside the runtime.
                let _ = self.tx.blocking_send(update);
            },
            Err(TrySendError::Full(_)) => {},
        }
    }
}

/// Rate-limit bookkeeping for one relay operation.
#[derive(Debug, Default)]
pub struct ProgressState {
    bytes_sent: u64,
    bytes_total: u64,
    last_emitted_at: Option<Instant>,
    completed: bool,
}

impl ProgressState {
    /// Record `update` and decide whether it should be displayed.
    pub fn observe(&mut self, update: ProgressUpdate, now: Instant, min_interval: Duration) -> bool {
        if self.completed || update.bytes_sent < self.bytes_sent {
            return false;
        }
        self.bytes_sent = update.bytes_sent;
        self.bytes_total = update.bytes_total;

        let due = update.is_complete()
            || self
                .last_emitted_at
                .is_none_or(|last| now.duration_since(last) >= min_interval);
        if due {
            self.last_emitted_at = Some(now);
            self.completed = update.is_complete();
        }
        due
    }

    #[must_use]
    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    #[must_use]
    pub fn bytes_total(&self) -> u64 {
        self.bytes_total
    }
}

/// Single consumer of a progress channel.
pub struct ProgressBridge {
    sink: Arc<dyn StatusSink>,
    min_interval: Duration,
    state: ProgressState,
}

impl ProgressBridge {
    pub fn new(sink: Arc<dyn StatusSink>, min_interval: Duration) -> Self {
        Self {
            sink,
            min_interval,
            state: ProgressState::default(),
        }
    }

    /// Drain `rx` until every reporter is dropped. Returns how many updates
    /// were rendered.
    pub async fn run(mut self, mut rx: mpsc::Receiver<ProgressUpdate>) -> usize {
        let mut rendered = 0;
        while let Some(update) = rx.recv().await {
            if !self.state.observe(update, Instant::now(), self.min_interval) {
                continue;
            }
            rendered += 1;
            if let Err(e) = self.sink.set_status(&render_status(update)).await {
                debug!(error = %e, "progress display failed");
            }
        }
        rendered
    }
}
