//! Point cloud coordinate bounds tracking
use crate::frame::PointCloudFrame;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Records per parallel chunk when scanning a cloud
const BOUNDS_CHUNK_SIZE: usize = 4_096;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudBounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
    pub min_z: f32,
    pub max_z: f32,
    /// Records that contributed, sentinels excluded
    pub valid_points: usize,
}

impl CloudBounds {
    /// Create new bounds initialised to infinity values
    pub fn new() -> Self {
        Self {
            min_x: f32::INFINITY,
            max_x: f32::NEG_INFINITY,
            min_y: f32::INFINITY,
            max_y: f32::NEG_INFINITY,
            min_z: f32::INFINITY,
            max_z: f32::NEG_INFINITY,
            valid_points: 0,
        }
    }

    /// Scan every non-sentinel record of `frame` in parallel chunks
    pub fn from_frame(frame: &PointCloudFrame) -> Self {
        frame
            .records
            .par_chunks(BOUNDS_CHUNK_SIZE)
            .map(|chunk| {
                let mut local_bounds = CloudBounds::new();
                for record in chunk.iter().filter(|r| !r.is_sentinel()) {
                    local_bounds.update(record.x, record.y, record.z);
                }
                local_bounds
            })
            .reduce_with(CloudBounds::merge)
            .unwrap_or_default()
    }

    /// Update bounds with a new point
    pub fn update(&mut self, x: f32, y: f32, z: f32) {
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
        self.min_z = self.min_z.min(z);
        self.max_z = self.max_z.max(z);
        self.valid_points += 1;
    }

    /// Combine two partial bounds
    pub fn merge(mut self, other: Self) -> Self {
        self.min_x = self.min_x.min(other.min_x);
        self.max_x = self.max_x.max(other.max_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_y = self.max_y.max(other.max_y);
        self.min_z = self.min_z.min(other.min_z);
        self.max_z = self.max_z.max(other.max_z);
        self.valid_points += other.valid_points;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.valid_points == 0
    }

    /// Extent along each axis
    pub fn dimensions(&self) -> (f32, f32, f32) {
        (
            self.max_x - self.min_x,
            self.max_y - self.min_y,
            self.max_z - self.min_z,
        )
    }
}

impl Default for CloudBounds {
    fn default() -> Self {
        Self::new()
    }
}
