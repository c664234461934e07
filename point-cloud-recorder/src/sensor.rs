//! Interface to the depth sensor: frame types, the coordinate mapper and the
//! sensor lifecycle.
use crate::color_convert::yuy2_to_bgra;
use crate::error::Result;
use crate::frame::{CameraSpacePoint, ColorSpacePoint};
use constants::capture::BYTES_PER_PIXEL;
use crossbeam_channel::Receiver;
use std::sync::Arc;

/// Width and height a frame source reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameDescription {
    pub width: usize,
    pub height: usize,
}

impl FrameDescription {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }
}

/// Raw pixel layout of a colour frame as delivered by the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorImageFormat {
    /// 4 bytes per pixel: blue, green, red, padding.
    Bgra,
    /// 2 bytes per pixel, packed Y0 U Y1 V.
    Yuy2,
}

impl ColorImageFormat {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            Self::Bgra => BYTES_PER_PIXEL,
            Self::Yuy2 => 2,
        }
    }
}

/// Depth readings in millimetres, 0 where the sensor saw nothing.
#[derive(Debug, Clone)]
pub struct DepthFrame {
    pub description: FrameDescription,
    pub data: Vec<u16>,
}

#[derive(Debug, Clone)]
pub struct ColorFrame {
    pub description: FrameDescription,
    pub format: ColorImageFormat,
    pub data: Vec<u8>,
}

impl ColorFrame {
    /// Copy the frame into `bgra`, converting from the raw format if needed.
    /// Returns false and leaves `bgra` untouched when the payload is short.
    pub fn copy_to_bgra(&self, bgra: &mut [u8]) -> bool {
        let pixels = self.description.pixel_count();
        if self.data.len() < pixels * self.format.bytes_per_pixel()
            || bgra.len() != pixels * BYTES_PER_PIXEL
        {
            return false;
        }

        match self.format {
            ColorImageFormat::Bgra => bgra.copy_from_slice(&self.data[..bgra.len()]),
            ColorImageFormat::Yuy2 => yuy2_to_bgra(&self.data[..pixels * 2], bgra),
        }
        true
    }
}

/// Per-pixel body segmentation, one byte per depth pixel.
#[derive(Debug, Clone)]
pub struct BodyIndexFrame {
    pub description: FrameDescription,
    pub data: Vec<u8>,
}

/// One "frames ready" notification. Any of the sub-frames may be missing.
#[derive(Debug, Clone, Default)]
pub struct MultiSourceFrame {
    pub depth: Option<DepthFrame>,
    pub color: Option<ColorFrame>,
    pub body_index: Option<BodyIndexFrame>,
}

/// Projects depth pixels into camera space and colour space.
pub trait CoordinateMapper: Send + Sync {
    /// Fill `camera_points` with one point per depth pixel. Pixels without a
    /// valid depth reading map to infinite coordinates.
    fn map_depth_frame_to_camera_space(&self, depth: &[u16], camera_points: &mut [CameraSpacePoint]);

    /// Fill `color_points` with the colour image position of each depth pixel.
    fn map_depth_frame_to_color_space(&self, depth: &[u16], color_points: &mut [ColorSpacePoint]);
}

/// A combined depth/colour/body-index sensor.
pub trait Sensor {
    /// Start streaming frames to the reader.
    fn open(&mut self) -> Result<()>;

    /// Stop streaming and release the device.
    fn close(&mut self);

    fn is_open(&self) -> bool;

    fn depth_frame_description(&self) -> FrameDescription;

    fn color_frame_description(&self) -> FrameDescription;

    fn body_index_frame_description(&self) -> FrameDescription;

    /// Source of "frames ready" notifications for depth, colour and body index.
    fn open_reader(&mut self) -> Receiver<MultiSourceFrame>;

    fn coordinate_mapper(&self) -> Arc<dyn CoordinateMapper>;
}
