//! Effect timeline construction
//!
//! Turns the clicks (and optionally fast cursor movement) of a frozen
//! [`SampleStore`] into per-effect lists of [`EffectWindow`]s. Raw windows
//! are merged into the minimal sorted, disjoint cover of their union.

use crate::capture::input::{CursorSample, Point, SampleStore};
use crate::error::ProcessingResult;
use crate::project::schema::{EffectConfig, EffectsConfig};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// The three supported effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EffectKind {
    Follow,
    Zoom,
    Blur,
}

impl EffectKind {
    /// Order in which stages are rendered; each stage consumes the previous output
    pub const PIPELINE_ORDER: [EffectKind; 3] = [EffectKind::Follow, EffectKind::Zoom, EffectKind::Blur];
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EffectKind::Follow => write!(f, "follow"),
            EffectKind::Zoom => write!(f, "zoom"),
            EffectKind::Blur => write!(f, "blur"),
        }
    }
}

/// Peak parameters of a window, one variant per effect
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EffectParams {
    /// Crop scale of the cursor-following view
    Follow { scale: f64 },
    /// Zoom factor reached at the plateau of the window
    Zoom { factor: f64 },
    /// Box blur radius in pixels
    Blur { radius: u32 },
}

impl EffectParams {
    pub fn kind(&self) -> EffectKind {
        match self {
            EffectParams::Follow { .. } => EffectKind::Follow,
            EffectParams::Zoom { .. } => EffectKind::Zoom,
            EffectParams::Blur { .. } => EffectKind::Blur,
        }
    }

    /// Interpret a configured peak value for `kind`
    pub fn from_peak(kind: EffectKind, peak: f64) -> Self {
        match kind {
            EffectKind::Follow => EffectParams::Follow { scale: peak },
            EffectKind::Zoom => EffectParams::Zoom { factor: peak },
            EffectKind::Blur => EffectParams::Blur {
                radius: peak.round().max(1.0) as u32,
            },
        }
    }
}

/// A span of the recording during which one effect is active
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectWindow {
    /// Seconds from recording start
    pub start: f64,
    pub end: f64,
    #[serde(flatten)]
    pub params: EffectParams,
    /// Screen point the effect is centred on
    pub anchor: Point,
}

impl EffectWindow {
    pub fn kind(&self) -> EffectKind {
        self.params.kind()
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Merge overlapping or touching windows
///
/// Windows are stably sorted by start and swept once. A merged window keeps
/// the parameters and anchor of its earliest member. The result is sorted,
/// pairwise disjoint, and unchanged by a second merge.
pub fn merge_windows(mut windows: Vec<EffectWindow>) -> Vec<EffectWindow> {
    windows.sort_by(|a, b| a.start.total_cmp(&b.start));

    let mut merged: Vec<EffectWindow> = Vec::with_capacity(windows.len());
    for window in windows {
        match merged.last_mut() {
            Some(current) if window.start <= current.end => {
                current.end = current.end.max(window.end);
            }
            _ => merged.push(window),
        }
    }

    merged
}

/// Merged windows for every effect, ready for rendering
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeline {
    pub follow: Vec<EffectWindow>,
    pub zoom: Vec<EffectWindow>,
    pub blur: Vec<EffectWindow>,
}

impl Timeline {
    pub fn windows(&self, kind: EffectKind) -> &[EffectWindow] {
        match kind {
            EffectKind::Follow => &self.follow,
            EffectKind::Zoom => &self.zoom,
            EffectKind::Blur => &self.blur,
        }
    }

    fn windows_mut(&mut self, kind: EffectKind) -> &mut Vec<EffectWindow> {
        match kind {
            EffectKind::Follow => &mut self.follow,
            EffectKind::Zoom => &mut self.zoom,
            EffectKind::Blur => &mut self.blur,
        }
    }

    /// Stages in rendering order, including empty ones
    pub fn stages(&self) -> impl Iterator<Item = (EffectKind, &[EffectWindow])> + '_ {
        EffectKind::PIPELINE_ORDER
            .into_iter()
            .map(move |kind| (kind, self.windows(kind)))
    }

    pub fn window_count(&self) -> usize {
        self.follow.len() + self.zoom.len() + self.blur.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window_count() == 0
    }

    pub fn load_json(path: &Path) -> ProcessingResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut timeline: Timeline = serde_json::from_str(&content)?;
        // Hand-edited files may be unsorted or overlapping
        for kind in EffectKind::PIPELINE_ORDER {
            let windows = std::mem::take(timeline.windows_mut(kind));
            *timeline.windows_mut(kind) = merge_windows(windows);
        }
        Ok(timeline)
    }

    pub fn save_json(&self, path: &Path) -> ProcessingResult<()> {
        let data = serde_json::to_vec_pretty(self)?;
        std::fs::write(path, data)?;
        Ok(())
    }
}

/// Builds a [`Timeline`] from recorded samples
#[derive(Debug, Clone)]
pub struct TimelineBuilder {
    config: EffectsConfig,
}

impl TimelineBuilder {
    /// Fails with `InvalidConfig` on negative rolls or out-of-range peaks
    pub fn new(config: &EffectsConfig) -> ProcessingResult<Self> {
        config.validate()?;
        Ok(Self { config: *config })
    }

    pub fn build(&self, samples: &SampleStore) -> Timeline {
        let mut timeline = Timeline::default();
        for kind in EffectKind::PIPELINE_ORDER {
            *timeline.windows_mut(kind) = self.windows_for(kind, samples);
        }

        tracing::info!(
            "Built effect timeline: follow={}, zoom={}, blur={}",
            timeline.follow.len(),
            timeline.zoom.len(),
            timeline.blur.len()
        );
        timeline
    }

    /// Merged windows of a single effect
    pub fn windows_for(&self, kind: EffectKind, samples: &SampleStore) -> Vec<EffectWindow> {
        let config = self.config.get(kind);
        if !config.enabled {
            return Vec::new();
        }

        let params = EffectParams::from_peak(kind, config.peak_parameter);
        let clicks: Vec<&CursorSample> = samples.clicks().collect();

        let mut raw = click_windows(&clicks, config, params);
        if let Some(threshold) = config.movement_threshold {
            raw.extend(movement_windows(samples, &clicks, threshold, params));
        }

        let merged = merge_windows(raw);
        tracing::debug!("{} timeline: {} merged windows", kind, merged.len());
        merged
    }
}

fn click_windows(
    clicks: &[&CursorSample],
    config: &EffectConfig,
    params: EffectParams,
) -> Vec<EffectWindow> {
    clicks
        .iter()
        .map(|click| {
            let t = click.t_secs();
            EffectWindow {
                start: (t - config.pre_roll_seconds).max(0.0),
                end: t + config.post_roll_seconds,
                params,
                anchor: click.point(),
            }
        })
        .collect()
}

/// Windows spanning consecutive position samples whose speed exceeds `threshold` px/s
fn movement_windows(
    samples: &SampleStore,
    clicks: &[&CursorSample],
    threshold: f64,
    params: EffectParams,
) -> Vec<EffectWindow> {
    let positions: Vec<&CursorSample> = samples.positions().collect();

    positions
        .windows(2)
        .filter_map(|pair| {
            let (from, to) = (pair[0], pair[1]);
            let dt = to.t_secs() - from.t_secs();
            if dt <= 0.0 {
                return None;
            }

            let speed = from.point().distance(&to.point()) / dt;
            if speed <= threshold {
                return None;
            }

            let anchor = governing_click(clicks, from.t_secs())
                .map(|click| click.point())
                .unwrap_or_else(|| to.point());

            Some(EffectWindow {
                start: from.t_secs(),
                end: to.t_secs(),
                params,
                anchor,
            })
        })
        .collect()
}

/// Latest click at or before `t`; among clicks sharing that time, the first recorded
fn governing_click<'a>(clicks: &[&'a CursorSample], t: f64) -> Option<&'a CursorSample> {
    let preceding = clicks.partition_point(|c| c.t_secs() <= t);
    let latest = clicks.get(preceding.checked_sub(1)?)?;
    let first_at_time = clicks.partition_point(|c| c.t < latest.t);
    clicks.get(first_at_time).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProcessingError;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::time::Duration;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn zoom_only(pre: f64, post: f64) -> EffectsConfig {
        let mut config = EffectsConfig::none();
        config.zoom = EffectConfig {
            enabled: true,
            pre_roll_seconds: pre,
            post_roll_seconds: post,
            peak_parameter: 1.5,
            movement_threshold: None,
        };
        config
    }

    fn window(start: f64, end: f64) -> EffectWindow {
        EffectWindow {
            start,
            end,
            params: EffectParams::Zoom { factor: 1.5 },
            anchor: Point::new(start, end),
        }
    }

    /// Deterministic pseudo-random windows
    fn scattered_windows(count: usize, seed: u64) -> Vec<EffectWindow> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..count)
            .map(|_| {
                let start = rng.gen_range(0.0..60.0);
                window(start, start + rng.gen_range(0.0..5.0))
            })
            .collect()
    }

    #[test]
    fn test_close_clicks_merge_into_one_window() {
        let samples = SampleStore::from_samples(vec![
            CursorSample::position(0.0, 0.0, ms(0)),
            CursorSample::click(100.0, 200.0, ms(1000)),
            CursorSample::click(300.0, 400.0, ms(1400)),
        ]);

        let timeline = TimelineBuilder::new(&zoom_only(1.0, 2.0))
            .unwrap()
            .build(&samples);

        assert_eq!(timeline.zoom.len(), 1);
        let merged = timeline.zoom[0];
        assert_eq!(merged.start, 0.0);
        assert!((merged.end - 3.4).abs() < 1e-9);
        assert_eq!(merged.anchor, Point::new(100.0, 200.0));
        assert!(timeline.follow.is_empty());
        assert!(timeline.blur.is_empty());
    }

    #[test]
    fn test_distant_clicks_stay_separate() {
        let samples = SampleStore::from_samples(vec![
            CursorSample::click(1.0, 1.0, ms(2000)),
            CursorSample::click(2.0, 2.0, ms(10_000)),
        ]);

        let windows = TimelineBuilder::new(&zoom_only(1.0, 2.0))
            .unwrap()
            .windows_for(EffectKind::Zoom, &samples);

        assert_eq!(windows.len(), 2);
        assert_eq!((windows[0].start, windows[0].end), (1.0, 4.0));
        assert_eq!((windows[1].start, windows[1].end), (9.0, 12.0));
        assert_eq!(windows[1].anchor, Point::new(2.0, 2.0));
    }

    #[test]
    fn test_merge_is_idempotent() {
        for seed in 1..20 {
            let once = merge_windows(scattered_windows(40, seed));
            let twice = merge_windows(once.clone());
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_merge_output_sorted_and_disjoint() {
        for seed in 1..20 {
            let raw = scattered_windows(40, seed);
            let merged = merge_windows(raw.clone());

            for pair in merged.windows(2) {
                assert!(pair[0].start <= pair[0].end);
                assert!(pair[0].end < pair[1].start);
            }
            // Every raw window is covered by exactly one merged window
            for w in &raw {
                let covering = merged
                    .iter()
                    .filter(|m| m.start <= w.start && w.end <= m.end)
                    .count();
                assert_eq!(covering, 1);
            }
        }
    }

    #[test]
    fn test_touching_windows_merge() {
        let merged = merge_windows(vec![window(2.0, 3.0), window(0.0, 2.0)]);
        assert_eq!(merged.len(), 1);
        assert_eq!((merged[0].start, merged[0].end), (0.0, 3.0));
        assert_eq!(merged[0].anchor, Point::new(0.0, 2.0));
    }

    #[test]
    fn test_empty_clicks_yield_empty_timeline() {
        let samples = SampleStore::from_samples(vec![
            CursorSample::position(0.0, 0.0, ms(0)),
            CursorSample::position(1.0, 1.0, ms(16)),
        ]);
        let timeline = TimelineBuilder::new(&EffectsConfig::default())
            .unwrap()
            .build(&samples);
        assert!(timeline.is_empty());
    }

    #[test]
    fn test_negative_roll_is_invalid() {
        let result = TimelineBuilder::new(&zoom_only(-1.0, 2.0));
        assert!(matches!(result, Err(ProcessingError::InvalidConfig(_))));
    }

    #[test]
    fn test_fast_movement_opens_window() {
        let mut config = EffectsConfig::none();
        config.blur = EffectConfig {
            movement_threshold: Some(1000.0),
            ..EffectConfig::default_for(EffectKind::Blur)
        };

        // 10 px in 100 ms is slow; 500 px in 100 ms is 5000 px/s
        let samples = SampleStore::from_samples(vec![
            CursorSample::position(0.0, 0.0, ms(0)),
            CursorSample::position(10.0, 0.0, ms(100)),
            CursorSample::position(510.0, 0.0, ms(200)),
            CursorSample::position(515.0, 0.0, ms(300)),
        ]);

        let windows = TimelineBuilder::new(&config)
            .unwrap()
            .windows_for(EffectKind::Blur, &samples);

        assert_eq!(windows.len(), 1);
        assert!((windows[0].start - 0.1).abs() < 1e-9);
        assert!((windows[0].end - 0.2).abs() < 1e-9);
        assert_eq!(windows[0].params, EffectParams::Blur { radius: 5 });
        assert_eq!(windows[0].anchor, Point::new(510.0, 0.0));
    }

    #[test]
    fn test_movement_anchor_uses_preceding_click() {
        let mut config = EffectsConfig::none();
        config.blur = EffectConfig {
            pre_roll_seconds: 0.0,
            post_roll_seconds: 0.0,
            movement_threshold: Some(1000.0),
            ..EffectConfig::default_for(EffectKind::Blur)
        };

        let samples = SampleStore::from_samples(vec![
            CursorSample::click(7.0, 7.0, ms(50)),
            CursorSample::click(8.0, 8.0, ms(50)),
            CursorSample::position(0.0, 0.0, ms(100)),
            CursorSample::position(900.0, 0.0, ms(200)),
        ]);

        let windows = TimelineBuilder::new(&config)
            .unwrap()
            .windows_for(EffectKind::Blur, &samples);

        let movement = windows.iter().find(|w| w.start > 0.09).unwrap();
        assert_eq!(movement.anchor, Point::new(7.0, 7.0));
    }

    #[test]
    fn test_timeline_json_is_normalized_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timeline.json");

        let timeline = Timeline {
            zoom: vec![window(5.0, 6.0), window(1.0, 5.5)],
            ..Timeline::default()
        };
        timeline.save_json(&path).unwrap();

        let loaded = Timeline::load_json(&path).unwrap();
        assert_eq!(loaded.zoom.len(), 1);
        assert_eq!((loaded.zoom[0].start, loaded.zoom[0].end), (1.0, 6.0));
    }
}
