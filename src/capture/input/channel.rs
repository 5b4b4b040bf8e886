//! Single-writer sample funnel
//!
//! Two producers feed cursor samples during a recording: a periodic position
//! sampler and an asynchronous click hook. Neither touches shared storage.
//! Both push into one unbounded channel through a [`SampleSink`], and a
//! single collector task owns the growing sample list. Freezing the tracker
//! closes the channel, drains whatever is still queued and hands back an
//! immutable [`SampleStore`].

use crate::capture::input::store::SampleStore;
use crate::capture::input::types::CursorSample;
use crate::recorder::channel::{RecordingError, RecordingResult};
use parking_lot::Mutex as ParkingMutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Something that can report the current pointer location
pub trait CursorPositionSource: Send + Sync + 'static {
    fn cursor_position(&self) -> Option<(f64, f64)>;
}

impl<F> CursorPositionSource for F
where
    F: Fn() -> Option<(f64, f64)> + Send + Sync + 'static,
{
    fn cursor_position(&self) -> Option<(f64, f64)> {
        self()
    }
}

/// Last known pointer location, updated by an OS hook and read by the sampler
#[derive(Debug, Clone, Default)]
pub struct SharedCursorPosition {
    inner: Arc<ParkingMutex<Option<(f64, f64)>>>,
}

impl SharedCursorPosition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&self, x: f64, y: f64) {
        *self.inner.lock() = Some((x, y));
    }
}

impl CursorPositionSource for SharedCursorPosition {
    fn cursor_position(&self) -> Option<(f64, f64)> {
        *self.inner.lock()
    }
}

/// Producer handle into the funnel
///
/// Cheap to clone. Every producer gets its own copy; timestamps are taken
/// relative to the shared recording start.
#[derive(Debug, Clone)]
pub struct SampleSink {
    tx: mpsc::UnboundedSender<CursorSample>,
    started: Instant,
}

impl SampleSink {
    /// Time since recording start
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Push a sample; returns false once the tracker has been frozen
    pub fn record(&self, sample: CursorSample) -> bool {
        self.tx.send(sample).is_ok()
    }

    pub fn record_position(&self, x: f64, y: f64) -> bool {
        self.record(CursorSample::position(x, y, self.elapsed()))
    }

    pub fn record_click(&self, x: f64, y: f64) -> bool {
        self.record(CursorSample::click(x, y, self.elapsed()))
    }
}

/// Shortest period the position sampler runs at
pub const MIN_SAMPLE_INTERVAL: Duration = Duration::from_micros(100);

pub struct InputTracker {
    sink: SampleSink,
    stop_tx: watch::Sender<bool>,
    sampler: Option<JoinHandle<()>>,
    freeze_tx: Option<oneshot::Sender<()>>,
    collector: JoinHandle<Vec<CursorSample>>,
}

impl InputTracker {
    /// Start the collector and a position sampler polling `source` every `interval`
    ///
    /// Intervals shorter than [`MIN_SAMPLE_INTERVAL`] are raised to it.
    pub fn start(source: Arc<dyn CursorPositionSource>, interval: Duration) -> Self {
        let interval = interval.max(MIN_SAMPLE_INTERVAL);
        let (tx, rx) = mpsc::unbounded_channel();
        let (freeze_tx, freeze_rx) = oneshot::channel();
        let (stop_tx, stop_rx) = watch::channel(false);

        let sink = SampleSink {
            tx,
            started: Instant::now(),
        };

        let collector = tokio::spawn(collect(rx, freeze_rx));
        let sampler = tokio::spawn(sample_positions(source, sink.clone(), interval, stop_rx));

        tracing::info!("Input tracking started (interval={:?})", interval);

        Self {
            sink,
            stop_tx,
            sampler: Some(sampler),
            freeze_tx: Some(freeze_tx),
            collector,
        }
    }

    /// Handle for additional producers such as a click hook
    pub fn sink(&self) -> SampleSink {
        self.sink.clone()
    }

    /// Stop the periodic sampler and wait for it to finish
    pub async fn stop_sampling(&mut self) {
        self.stop_tx.send_replace(true);
        if let Some(sampler) = self.sampler.take() {
            if let Err(e) = sampler.await {
                tracing::warn!("Position sampler ended abnormally: {}", e);
            }
        }
    }

    /// Close the funnel and return every sample received so far
    ///
    /// Sinks held elsewhere stay valid but their sends are rejected.
    pub async fn freeze(mut self) -> RecordingResult<SampleStore> {
        self.stop_sampling().await;

        if let Some(freeze_tx) = self.freeze_tx.take() {
            let _ = freeze_tx.send(());
        }

        let samples = self
            .collector
            .await
            .map_err(|e| RecordingError::CaptureError(format!("sample collector failed: {e}")))?;

        let store = SampleStore::from_samples(samples);
        tracing::info!(
            "Input tracking frozen (samples={}, clicks={})",
            store.len(),
            store.clicks().count()
        );
        Ok(store)
    }
}

async fn collect(
    mut rx: mpsc::UnboundedReceiver<CursorSample>,
    mut freeze: oneshot::Receiver<()>,
) -> Vec<CursorSample> {
    let mut samples = Vec::new();

    loop {
        tokio::select! {
            biased;
            _ = &mut freeze => break,
            received = rx.recv() => match received {
                Some(sample) => samples.push(sample),
                None => break,
            },
        }
    }

    rx.close();
    while let Ok(sample) = rx.try_recv() {
        samples.push(sample);
    }

    samples
}

async fn sample_positions(
    source: Arc<dyn CursorPositionSource>,
    sink: SampleSink,
    interval: Duration,
    mut stop: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Some((x, y)) = source.cursor_position() {
                    if !sink.record_position(x, y) {
                        break;
                    }
                }
            }
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    break;
                }
            }
        }
    }
}
