//! Cursor path smoothing for post-recording processing
//!
//! Raw samples are interpolated with a centripetal Catmull-Rom spline, and
//! the spline value at each output frame becomes the moving target of a
//! 2D spring. The spring output is the smoothed path, one point per frame.

use crate::capture::input::SampleStore;
use crate::error::ProcessingResult;
use crate::processing::spline::CentripetalSpline;
use crate::processing::spring::{Spring2D, SpringParams};
use crate::project::schema::SmoothingConfig;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

/// Smoothed cursor position for one output frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmoothedPoint {
    pub x: f64,
    pub y: f64,
    /// Milliseconds from recording start
    pub t_ms: f64,
}

/// Number of frames emitted for a trace lasting `span`
///
/// The span is taken from integer timestamps, so a trace of exactly
/// `n / frame_rate` seconds always yields `n + 1` frames.
pub fn frame_count(span: Duration, frame_rate: f64) -> usize {
    (span.as_secs_f64() * frame_rate).floor().max(0.0) as usize + 1
}

#[derive(Debug, Clone)]
pub struct PathSmoother {
    config: SmoothingConfig,
    params: SpringParams,
}

impl PathSmoother {
    /// Fails with `InvalidConfig` when a control is outside `[0, 1]` or the
    /// frame rate is not positive
    pub fn new(config: SmoothingConfig) -> ProcessingResult<Self> {
        config.validate()?;
        Ok(Self {
            params: SpringParams::from_perceptual(config.responsiveness, config.smoothness),
            config,
        })
    }

    pub fn spring_params(&self) -> SpringParams {
        self.params
    }

    /// Smooth a frozen trace
    ///
    /// Frame `i` sits at `t_first + i / frame_rate`. Frame 0 is the spline
    /// start; every later frame retargets the spring and advances it by one
    /// frame interval. The spring is created fresh for every call.
    pub fn smooth(&self, samples: &SampleStore) -> ProcessingResult<Vec<SmoothedPoint>> {
        let spline = CentripetalSpline::through(samples.samples(), self.config.alpha)?;

        let first = samples.first_time().unwrap_or_default();

        let frame_rate = self.config.frame_rate;
        let dt = 1.0 / frame_rate;
        let count = frame_count(samples.duration(), frame_rate);

        let origin = spline.sample_at(first.as_secs_f64());
        let mut spring = Spring2D::new(origin.x, origin.y, self.params);
        let mut path = Vec::with_capacity(count);

        for frame in 0..count {
            let t = (first + Duration::from_secs_f64(frame as f64 / frame_rate)).as_secs_f64();
            if frame > 0 {
                let target = spline.sample_at(t);
                spring.set_target(target.x, target.y);
                spring.step(dt);
            }

            let (x, y) = spring.position();
            path.push(SmoothedPoint { x, y, t_ms: t * 1000.0 });
        }

        tracing::debug!(
            "Smoothed {} samples into {} frames at {}fps (stiffness={:.1}, damping={:.1})",
            samples.len(),
            path.len(),
            frame_rate,
            self.params.stiffness,
            self.params.damping
        );

        Ok(path)
    }
}

/// Write a smoothed path as `x,y,t_ms` rows
pub fn export_path_csv(path: &Path, points: &[SmoothedPoint]) -> ProcessingResult<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    writeln!(writer, "x,y,t_ms")?;
    for p in points {
        writeln!(writer, "{:.3},{:.3},{:.3}", p.x, p.y, p.t_ms)?;
    }
    writer.flush()?;
    Ok(())
}
