//! Frozen cursor sample record
//!
//! A [`SampleStore`] is produced exactly once per recording, when the input
//! tracker is frozen after the capture process has exited. It is read-only
//! from then on and is the sole input of path smoothing and timeline
//! construction.

use crate::capture::input::types::{CursorSample, SampleKind};
use crate::error::ProcessingResult;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<CursorSample>", into = "Vec<CursorSample>")]
pub struct SampleStore {
    samples: Vec<CursorSample>,
}

impl SampleStore {
    /// Build a store, ordering samples by time
    ///
    /// The sort is stable so samples that share a timestamp keep the order
    /// in which they were received.
    pub fn from_samples(mut samples: Vec<CursorSample>) -> Self {
        samples.sort_by(|a, b| a.t.cmp(&b.t));
        Self { samples }
    }

    pub fn samples(&self) -> &[CursorSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clicks(&self) -> impl Iterator<Item = &CursorSample> + '_ {
        self.samples.iter().filter(|s| s.kind == SampleKind::Click)
    }

    pub fn positions(&self) -> impl Iterator<Item = &CursorSample> + '_ {
        self.samples.iter().filter(|s| s.kind == SampleKind::Position)
    }

    pub fn first_time(&self) -> Option<Duration> {
        self.samples.first().map(|s| s.t)
    }

    pub fn last_time(&self) -> Option<Duration> {
        self.samples.last().map(|s| s.t)
    }

    /// Time between the first and last sample
    pub fn duration(&self) -> Duration {
        match (self.first_time(), self.last_time()) {
            (Some(first), Some(last)) => last.saturating_sub(first),
            _ => Duration::ZERO,
        }
    }

    pub fn load_json(path: &Path) -> ProcessingResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let store: SampleStore = serde_json::from_str(&content)?;
        tracing::debug!("Loaded {} cursor samples from {:?}", store.len(), path);
        Ok(store)
    }

    pub fn save_json(&self, path: &Path) -> ProcessingResult<()> {
        let data = serde_json::to_vec_pretty(self)?;
        std::fs::write(path, data)?;
        Ok(())
    }
}

impl From<Vec<CursorSample>> for SampleStore {
    fn from(samples: Vec<CursorSample>) -> Self {
        Self::from_samples(samples)
    }
}

impl From<SampleStore> for Vec<CursorSample> {
    fn from(store: SampleStore) -> Self {
        store.samples
    }
}
