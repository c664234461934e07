//! Compiled-in recording policy.
use constants::capture::{MAX_FRAMES, MIN_POINTS, STRIDE, THROTTLE_INTERVAL_MS};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecorderConfig {
    /// Capacity of the snapshot store.
    pub max_frames: usize,
    /// Clouds with `vertex_count <= min_points` are dropped.
    pub min_points: usize,
    /// Depth pixel sampling step.
    pub stride: usize,
    /// Minimum time between two admitted frames.
    #[serde(with = "duration_ms")]
    pub throttle_interval: Duration,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            max_frames: MAX_FRAMES,
            min_points: MIN_POINTS,
            stride: STRIDE,
            throttle_interval: Duration::from_millis(THROTTLE_INTERVAL_MS),
        }
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}
