//! Built-in sensor producing a procedural scene, used when no vendor runtime
//! is linked, plus a pinhole coordinate mapper.
use crate::error::{RecorderError, Result};
use crate::frame::{CameraSpacePoint, ColorSpacePoint};
use crate::sensor::{
    BodyIndexFrame, ColorFrame, ColorImageFormat, CoordinateMapper, DepthFrame, FrameDescription,
    MultiSourceFrame, Sensor,
};
use constants::capture::BYTES_PER_PIXEL;
use constants::sensor::{
    COLOR_CX, COLOR_CY, COLOR_F, COLOR_HEIGHT, COLOR_WIDTH, DEPTH_CX, DEPTH_CY, DEPTH_FX,
    DEPTH_FY, DEPTH_HEIGHT, DEPTH_UNITS_PER_METRE, DEPTH_WIDTH, NO_BODY_INDEX,
    SYNTHETIC_FRAME_PERIOD_MS,
};
use crossbeam_channel::{Receiver, Sender, TrySendError};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

/// Maps depth pixels through a pinhole model. The colour camera shares the
/// depth camera's origin and orientation.
#[derive(Debug, Clone, PartialEq)]
pub struct PinholeMapper {
    depth_width: usize,
    depth_fx: f32,
    depth_fy: f32,
    depth_cx: f32,
    depth_cy: f32,
    color_f: f32,
    color_cx: f32,
    color_cy: f32,
}

impl PinholeMapper {
    /// Intrinsics scaled from the reference resolutions to the given ones.
    pub fn for_resolution(depth: FrameDescription, color: FrameDescription) -> Self {
        let depth_scale = depth.width as f32 / DEPTH_WIDTH as f32;
        let color_scale = color.width as f32 / COLOR_WIDTH as f32;

        Self {
            depth_width: depth.width,
            depth_fx: DEPTH_FX * depth_scale,
            depth_fy: DEPTH_FY * depth_scale,
            depth_cx: DEPTH_CX * depth_scale,
            depth_cy: DEPTH_CY * depth.height as f32 / DEPTH_HEIGHT as f32,
            color_f: COLOR_F * color_scale,
            color_cx: COLOR_CX * color_scale,
            color_cy: COLOR_CY * color.height as f32 / COLOR_HEIGHT as f32,
        }
    }

    fn unproject(&self, index: usize, depth_mm: u16) -> CameraSpacePoint {
        if depth_mm == 0 {
            return CameraSpacePoint::INVALID;
        }
        let u = (index % self.depth_width) as f32;
        let v = (index / self.depth_width) as f32;
        let z = depth_mm as f32 / DEPTH_UNITS_PER_METRE;

        // Camera space is right-handed with +y up.
        CameraSpacePoint::new(
            (u - self.depth_cx) * z / self.depth_fx,
            (self.depth_cy - v) * z / self.depth_fy,
            z,
        )
    }
}

impl Default for PinholeMapper {
    fn default() -> Self {
        Self::for_resolution(
            FrameDescription::new(DEPTH_WIDTH, DEPTH_HEIGHT),
            FrameDescription::new(COLOR_WIDTH, COLOR_HEIGHT),
        )
    }
}

impl CoordinateMapper for PinholeMapper {
    fn map_depth_frame_to_camera_space(&self, depth: &[u16], camera_points: &mut [CameraSpacePoint]) {
        for (index, (&d, point)) in depth.iter().zip(camera_points.iter_mut()).enumerate() {
            *point = self.unproject(index, d);
        }
    }

    fn map_depth_frame_to_color_space(&self, depth: &[u16], color_points: &mut [ColorSpacePoint]) {
        for (index, (&d, point)) in depth.iter().zip(color_points.iter_mut()).enumerate() {
            let p = self.unproject(index, d);
            *point = if p.has_no_infinite_axis() {
                ColorSpacePoint::new(
                    self.color_f * p.x / p.z + self.color_cx,
                    self.color_cy - self.color_f * p.y / p.z,
                )
            } else {
                ColorSpacePoint::INVALID
            };
        }
    }
}

/// Procedural scene: a back wall, a sphere drifting across it and an invalid
/// border band where the "sensor" sees nothing.
#[derive(Debug, Clone)]
pub struct SceneGenerator {
    depth: FrameDescription,
    color: FrameDescription,
    color_format: ColorImageFormat,
}

impl SceneGenerator {
    const WALL_MM: f32 = 2500.0;
    const SPHERE_MM: f32 = 1500.0;

    pub fn new(depth: FrameDescription, color: FrameDescription, color_format: ColorImageFormat) -> Self {
        Self {
            depth,
            color,
            color_format,
        }
    }

    pub fn frame(&self, frame_number: u64) -> MultiSourceFrame {
        let (depth, body_index) = self.depth_and_body_index(frame_number);
        MultiSourceFrame {
            depth: Some(DepthFrame {
                description: self.depth,
                data: depth,
            }),
            color: Some(ColorFrame {
                description: self.color,
                format: self.color_format,
                data: self.color_data(frame_number),
            }),
            body_index: Some(BodyIndexFrame {
                description: self.depth,
                data: body_index,
            }),
        }
    }

    fn depth_and_body_index(&self, frame_number: u64) -> (Vec<u16>, Vec<u8>) {
        let (w, h) = (self.depth.width, self.depth.height);
        let border = w / 32;
        let radius = (h as f32 / 5.0).max(1.0);
        let travel = (w as f32 - 2.0 * radius).max(1.0);
        let centre_x = radius + (frame_number as f32 * 2.0) % travel;
        let centre_y = h as f32 / 2.0;

        let mut depth = vec![0u16; w * h];
        let mut body_index = vec![NO_BODY_INDEX; w * h];

        for y in 0..h {
            for x in 0..w {
                let i = y * w + x;
                if x < border || x >= w - border {
                    continue;
                }
                let dx = x as f32 - centre_x;
                let dy = y as f32 - centre_y;
                let r2 = (dx * dx + dy * dy) / (radius * radius);
                depth[i] = if r2 < 1.0 {
                    body_index[i] = 0;
                    (Self::SPHERE_MM - (1.0 - r2).sqrt() * 300.0) as u16
                } else {
                    (Self::WALL_MM + y as f32) as u16
                };
            }
        }
        (depth, body_index)
    }

    fn color_data(&self, frame_number: u64) -> Vec<u8> {
        let (w, h) = (self.color.width, self.color.height);
        let shift = (frame_number % 256) as usize;

        match self.color_format {
            ColorImageFormat::Bgra => {
                let mut data = Vec::with_capacity(w * h * BYTES_PER_PIXEL);
                for y in 0..h {
                    for x in 0..w {
                        data.extend_from_slice(&[
                            (((x + shift) * 255 / w.max(1)) % 256) as u8,
                            (y * 255 / h.max(1)) as u8,
                            (shift as u8).wrapping_mul(3),
                            u8::MAX,
                        ]);
                    }
                }
                data
            }
            ColorImageFormat::Yuy2 => {
                let mut data = Vec::with_capacity(w * h * 2);
                for y in 0..h {
                    for x in (0..w).step_by(2) {
                        let luma = (16 + (x + y + shift) * 219 / (w + h).max(1)).min(235) as u8;
                        data.extend_from_slice(&[luma, 128, luma, 128]);
                    }
                }
                data
            }
        }
    }
}

/// A sensor that streams procedurally generated frames from a background thread.
pub struct SyntheticSensor {
    depth: FrameDescription,
    color: FrameDescription,
    frame_period: Duration,
    generator: SceneGenerator,
    mapper: Arc<PinholeMapper>,
    sender: Option<Sender<MultiSourceFrame>>,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl SyntheticSensor {
    pub fn new(
        depth: FrameDescription,
        color: FrameDescription,
        color_format: ColorImageFormat,
        frame_period: Duration,
    ) -> Self {
        Self {
            depth,
            color,
            frame_period,
            generator: SceneGenerator::new(depth, color, color_format),
            mapper: Arc::new(PinholeMapper::for_resolution(depth, color)),
            sender: None,
            running: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    fn produce(
        generator: SceneGenerator,
        sender: Sender<MultiSourceFrame>,
        running: Arc<AtomicBool>,
        frame_period: Duration,
    ) {
        let mut frame_number = 0u64;
        while running.load(Ordering::Relaxed) {
            match sender.try_send(generator.frame(frame_number)) {
                Ok(()) => {}
                // A busy consumer misses frames, as with a real device.
                Err(TrySendError::Full(_)) => log::trace!("Synthetic frame {frame_number} dropped"),
                Err(TrySendError::Disconnected(_)) => break,
            }
            frame_number += 1;
            std::thread::sleep(frame_period);
        }
        log::debug!("Synthetic sensor stopped after {frame_number} frames");
    }
}

impl Default for SyntheticSensor {
    fn default() -> Self {
        Self::new(
            FrameDescription::new(DEPTH_WIDTH, DEPTH_HEIGHT),
            FrameDescription::new(COLOR_WIDTH, COLOR_HEIGHT),
            ColorImageFormat::Bgra,
            Duration::from_millis(SYNTHETIC_FRAME_PERIOD_MS),
        )
    }
}

impl Sensor for SyntheticSensor {
    fn open(&mut self) -> Result<()> {
        if self.is_open() {
            return Ok(());
        }
        let sender = self
            .sender
            .clone()
            .ok_or_else(|| RecorderError::SensorOpen("no frame reader opened".into()))?;

        self.running.store(true, Ordering::Relaxed);
        let running = self.running.clone();
        let generator = self.generator.clone();
        let frame_period = self.frame_period;

        let worker = std::thread::Builder::new()
            .name("synthetic-sensor".to_string())
            .spawn(move || Self::produce(generator, sender, running, frame_period))
            .map_err(|e| RecorderError::SensorOpen(format!("failed to spawn sensor thread: {e}")))?;
        self.worker = Some(worker);

        log::info!(
            "Synthetic sensor open: depth {}x{}, colour {}x{}",
            self.depth.width,
            self.depth.height,
            self.color.width,
            self.color.height
        );
        Ok(())
    }

    fn close(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        self.sender = None;
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::warn!("Synthetic sensor thread panicked");
            }
        }
    }

    fn is_open(&self) -> bool {
        self.worker.is_some()
    }

    fn depth_frame_description(&self) -> FrameDescription {
        self.depth
    }

    fn color_frame_description(&self) -> FrameDescription {
        self.color
    }

    fn body_index_frame_description(&self) -> FrameDescription {
        self.depth
    }

    fn open_reader(&mut self) -> Receiver<MultiSourceFrame> {
        let (sender, receiver) = crossbeam_channel::bounded(2);
        self.sender = Some(sender);
        receiver
    }

    fn coordinate_mapper(&self) -> Arc<dyn CoordinateMapper> {
        self.mapper.clone()
    }
}

impl Drop for SyntheticSensor {
    fn drop(&mut self) {
        self.close();
    }
}

/// The sensor used by the recorder binary.
pub fn default_sensor() -> Result<SyntheticSensor> {
    Ok(SyntheticSensor::default())
}
