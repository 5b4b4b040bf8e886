//! Centripetal Catmull-Rom interpolation of cursor samples
//!
//! Each segment between two consecutive samples is shaped by four control
//! points whose knot values grow by `|Δp|^alpha`. Evaluation uses the
//! Barry-Goldman pyramid of linear blends on those non-uniform knots.
//! Wall-clock time inside a segment maps linearly onto its knot interval.

use crate::capture::input::{CursorSample, Point};
use crate::error::{ProcessingError, ProcessingResult};

/// Samples required before a path can be interpolated
pub const MIN_SPLINE_SAMPLES: usize = 4;

/// Smallest knot spacing; coincident points would otherwise divide by zero
const KNOT_EPSILON: f64 = 1e-4;

/// Knot increment between two points
pub fn knot_spacing(a: &Point, b: &Point, alpha: f64) -> f64 {
    a.distance(b).powf(alpha).max(KNOT_EPSILON)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlPoint {
    pub position: Point,
    pub knot: f64,
}

/// One curve piece between `controls[1]` and `controls[2]`
#[derive(Debug, Clone, PartialEq)]
pub struct SplineSegment {
    pub controls: [ControlPoint; 4],
    /// Recording time of `controls[1]`, in seconds
    pub start_secs: f64,
    /// Recording time of `controls[2]`, in seconds
    pub end_secs: f64,
}

impl SplineSegment {
    fn new(points: [Point; 4], start_secs: f64, end_secs: f64, alpha: f64) -> Self {
        let mut knot = 0.0;
        let controls = [0, 1, 2, 3].map(|i| {
            if i > 0 {
                knot += knot_spacing(&points[i - 1], &points[i], alpha);
            }
            ControlPoint {
                position: points[i],
                knot,
            }
        });

        Self {
            controls,
            start_secs,
            end_secs,
        }
    }

    /// Curve position at recording time `time` (clamped to the segment)
    pub fn evaluate(&self, time: f64) -> Point {
        let span = self.end_secs - self.start_secs;
        let u = if span > 0.0 {
            ((time - self.start_secs) / span).clamp(0.0, 1.0)
        } else {
            1.0
        };

        let [c0, c1, c2, c3] = self.controls;
        let (t0, t1, t2, t3) = (c0.knot, c1.knot, c2.knot, c3.knot);
        let t = t1 + u * (t2 - t1);

        let a1 = blend(c0.position, c1.position, t0, t1, t);
        let a2 = blend(c1.position, c2.position, t1, t2, t);
        let a3 = blend(c2.position, c3.position, t2, t3, t);

        let b1 = blend(a1, a2, t0, t2, t);
        let b2 = blend(a2, a3, t1, t3, t);

        blend(b1, b2, t1, t2, t)
    }
}

/// Linear blend of `p` at knot `ta` and `q` at knot `tb`, evaluated at `t`
fn blend(p: Point, q: Point, ta: f64, tb: f64, t: f64) -> Point {
    let w = (t - ta) / (tb - ta);
    Point::new(p.x + (q.x - p.x) * w, p.y + (q.y - p.y) * w)
}

/// Interpolating curve through every sample of a trace
#[derive(Debug, Clone)]
pub struct CentripetalSpline {
    segments: Vec<SplineSegment>,
}

impl CentripetalSpline {
    /// Build one segment per consecutive sample pair
    ///
    /// The first and last samples are duplicated as phantom control points.
    /// Samples must be ordered by time.
    pub fn through(samples: &[CursorSample], alpha: f64) -> ProcessingResult<Self> {
        if samples.len() < MIN_SPLINE_SAMPLES {
            return Err(ProcessingError::InsufficientData {
                required: MIN_SPLINE_SAMPLES,
                actual: samples.len(),
            });
        }

        let last = samples.len() - 1;
        let segments = (0..last)
            .map(|i| {
                let points = [
                    samples[i.saturating_sub(1)].point(),
                    samples[i].point(),
                    samples[i + 1].point(),
                    samples[(i + 2).min(last)].point(),
                ];
                SplineSegment::new(points, samples[i].t_secs(), samples[i + 1].t_secs(), alpha)
            })
            .collect();

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[SplineSegment] {
        &self.segments
    }

    /// Curve position at recording time `time` in seconds
    pub fn sample_at(&self, time: f64) -> Point {
        let index = self
            .segments
            .partition_point(|s| s.end_secs < time)
            .min(self.segments.len() - 1);
        self.segments[index].evaluate(time)
    }
}
