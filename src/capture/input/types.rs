use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A screen coordinate in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// What produced a cursor sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SampleKind {
    /// Periodic position poll
    Position,
    /// Mouse button press reported by the input hook
    Click,
}

/// One observation of the cursor
///
/// `t` is the offset from recording start. It is serialized as fractional
/// milliseconds under `timeMs`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorSample {
    pub x: f64,
    pub y: f64,
    #[serde(rename = "timeMs", with = "duration_ms")]
    pub t: Duration,
    pub kind: SampleKind,
}

impl CursorSample {
    pub fn position(x: f64, y: f64, t: Duration) -> Self {
        Self {
            x,
            y,
            t,
            kind: SampleKind::Position,
        }
    }

    pub fn click(x: f64, y: f64, t: Duration) -> Self {
        Self {
            x,
            y,
            t,
            kind: SampleKind::Click,
        }
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Timestamp in seconds since recording start
    pub fn t_secs(&self) -> f64 {
        self.t.as_secs_f64()
    }

    pub fn is_click(&self) -> bool {
        self.kind == SampleKind::Click
    }
}

mod duration_ms {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64() * 1000.0)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let ms = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(ms / 1000.0)
            .map_err(|_| D::Error::custom(format!("invalid sample time {ms}ms")))
    }
}
