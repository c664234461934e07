//! Raw frame snapshots and the point clouds projected from them.
use crate::error::{RecorderError, Result};
use constants::capture::BYTES_PER_PIXEL;

/// Sensor-relative 3D point in metres. The coordinate mapper writes infinite
/// coordinates for depth pixels without a valid reading.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CameraSpacePoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl CameraSpacePoint {
    pub const INVALID: Self = Self {
        x: f32::NEG_INFINITY,
        y: f32::NEG_INFINITY,
        z: f32::NEG_INFINITY,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// True when no axis is positive or negative infinity. NaN axes pass.
    pub fn has_no_infinite_axis(&self) -> bool {
        !(self.x.is_infinite() || self.y.is_infinite() || self.z.is_infinite())
    }
}

/// Position of a depth pixel in the colour image, possibly out of frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ColorSpacePoint {
    pub x: f32,
    pub y: f32,
}

impl ColorSpacePoint {
    pub const INVALID: Self = Self {
        x: f32::NEG_INFINITY,
        y: f32::NEG_INFINITY,
    };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Nearest colour pixel using round-half-up, so 2.5 becomes 3.
    /// Rounded in f64 so the half-step addition is exact.
    /// Non-finite coordinates have no pixel.
    pub fn nearest_pixel(&self) -> Option<(i64, i64)> {
        if !(self.x.is_finite() && self.y.is_finite()) {
            return None;
        }
        Some((
            (f64::from(self.x) + 0.5).floor() as i64,
            (f64::from(self.y) + 0.5).floor() as i64,
        ))
    }
}

/// Depth and colour resolution a snapshot was captured at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameDimensions {
    pub depth_width: usize,
    pub depth_height: usize,
    pub color_width: usize,
    pub color_height: usize,
}

impl FrameDimensions {
    pub fn depth_pixels(&self) -> usize {
        self.depth_width * self.depth_height
    }

    pub fn color_bytes(&self) -> usize {
        self.color_width * self.color_height * BYTES_PER_PIXEL
    }
}

/// One retained raw capture. Owns all of its buffers and is read-only once built.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSnapshot {
    camera_points: Vec<CameraSpacePoint>,
    color_mapping: Vec<ColorSpacePoint>,
    color_buffer: Vec<u8>,
    dimensions: FrameDimensions,
    timestamp_ms: u64,
}

impl FrameSnapshot {
    /// Build a snapshot, rejecting buffers whose lengths disagree with `dimensions`.
    pub fn new(
        camera_points: Vec<CameraSpacePoint>,
        color_mapping: Vec<ColorSpacePoint>,
        color_buffer: Vec<u8>,
        dimensions: FrameDimensions,
        timestamp_ms: u64,
    ) -> Result<Self> {
        check_len("camera_points", dimensions.depth_pixels(), camera_points.len())?;
        check_len("color_mapping", dimensions.depth_pixels(), color_mapping.len())?;
        check_len("color_buffer", dimensions.color_bytes(), color_buffer.len())?;

        Ok(Self {
            camera_points,
            color_mapping,
            color_buffer,
            dimensions,
            timestamp_ms,
        })
    }

    pub fn camera_points(&self) -> &[CameraSpacePoint] {
        &self.camera_points
    }

    pub fn color_mapping(&self) -> &[ColorSpacePoint] {
        &self.color_mapping
    }

    /// BGRA bytes of the full colour frame.
    pub fn color_buffer(&self) -> &[u8] {
        &self.color_buffer
    }

    pub fn dimensions(&self) -> FrameDimensions {
        self.dimensions
    }

    /// Session-clock time of admission.
    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }
}

fn check_len(field: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(RecorderError::SnapshotShape {
            field,
            expected,
            actual,
        })
    }
}

/// A single vertex of an encoded cloud.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointRecord {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub timestamp_ms: u64,
}

impl PointRecord {
    /// Record emitted for depth pixels without valid geometry.
    pub const SENTINEL: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        r: 0,
        g: 0,
        b: 0,
        timestamp_ms: 0,
    };

    pub fn is_sentinel(&self) -> bool {
        *self == Self::SENTINEL
    }
}

/// Coloured, timestamped points of one frame in row-major sampling order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloudFrame {
    pub records: Vec<PointRecord>,
}

impl PointCloudFrame {
    /// Number of emitted records, sentinels included.
    pub fn vertex_count(&self) -> usize {
        self.records.len()
    }
}
