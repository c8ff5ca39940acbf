//! Telemetry Sinks
//!
//! Best-effort destinations for cache events. Recording never blocks the
//! request path: file I/O happens on a background writer.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::telemetry::CacheOperationEvent;

/// Events buffered between request handlers and the writer
pub const TELEMETRY_QUEUE_CAPACITY: usize = 1024;

// == Telemetry Error ==
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Telemetry I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Telemetry serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Telemetry queue full, event dropped")]
    QueueFull,

    #[error("Telemetry writer stopped")]
    Closed,
}

// == Telemetry Trait ==
/// Receives cache events.
///
/// Must return promptly. Errors are reported to the caller, which logs and
/// drops them; a sink failure never changes a cache decision.
pub trait Telemetry: Send + Sync {
    fn record(&self, event: &CacheOperationEvent) -> Result<(), TelemetryError>;
}

// == Null Telemetry ==
/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTelemetry;

impl Telemetry for NullTelemetry {
    fn record(&self, _event: &CacheOperationEvent) -> Result<(), TelemetryError> {
        Ok(())
    }
}

// == NDJSON Telemetry ==
/// Appends one JSON object per line to a daily file under `dir`.
///
/// `record` only enqueues; a writer on the blocking pool does the file
/// I/O. When the queue is full the event is dropped.
#[derive(Debug, Clone)]
pub struct NdjsonTelemetry {
    dir: PathBuf,
    sender: mpsc::Sender<CacheOperationEvent>,
}

impl NdjsonTelemetry {
    /// Starts the writer; requires a tokio runtime.
    ///
    /// The writer drains the queue and finishes once every clone of the
    /// sink is dropped; await the handle to flush on shutdown.
    pub fn spawn(dir: impl Into<PathBuf>) -> (Self, JoinHandle<()>) {
        Self::spawn_with_capacity(dir, TELEMETRY_QUEUE_CAPACITY)
    }

    pub fn spawn_with_capacity(dir: impl Into<PathBuf>, capacity: usize) -> (Self, JoinHandle<()>) {
        let dir = dir.into();
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let writer_dir = dir.clone();
        let handle = tokio::task::spawn_blocking(move || run_writer(&writer_dir, receiver));
        (Self { dir, sender }, handle)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File receiving today's events.
    pub fn current_file(&self) -> PathBuf {
        daily_file(&self.dir)
    }
}

impl Telemetry for NdjsonTelemetry {
    fn record(&self, event: &CacheOperationEvent) -> Result<(), TelemetryError> {
        self.sender.try_send(event.clone()).map_err(|e| match e {
            TrySendError::Full(_) => TelemetryError::QueueFull,
            TrySendError::Closed(_) => TelemetryError::Closed,
        })
    }
}

/// `{dir}/telemetry_YYYYMMDD.ndjson` for the current UTC day.
fn daily_file(dir: &Path) -> PathBuf {
    let day = chrono::Utc::now().format("%Y%m%d");
    dir.join(format!("telemetry_{}.ndjson", day))
}

fn append_event(dir: &Path, event: &CacheOperationEvent) -> Result<(), TelemetryError> {
    let mut line = serde_json::to_string(event)?;
    line.push('\n');

    fs::create_dir_all(dir)?;
    let path = daily_file(dir);
    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    file.write_all(line.as_bytes())?;

    trace!("Telemetry event {} written to {}", event.event_id, path.display());
    Ok(())
}

// == Writer ==
fn run_writer(dir: &Path, mut receiver: mpsc::Receiver<CacheOperationEvent>) {
    while let Some(event) = receiver.blocking_recv() {
        if let Err(e) = append_event(dir, &event) {
            warn!("Dropping telemetry event {}: {}", event.event_id, e);
        }
    }
    debug!("Telemetry writer for {} stopped", dir.display());
}
