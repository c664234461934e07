//! Rate-limited admission of sensor frames into the snapshot store.
use crate::frame::{CameraSpacePoint, ColorSpacePoint, FrameDimensions, FrameSnapshot};
use crate::sensor::{CoordinateMapper, FrameDescription, MultiSourceFrame};
use crate::snapshot_store::SnapshotStore;
use constants::capture::BYTES_PER_PIXEL;
use std::time::{Duration, Instant};

/// What happened to a single "frames ready" notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionOutcome {
    /// Recording is finished, the notification was a no-op.
    Ignored,
    /// Arrived sooner than the throttle interval after the last admission.
    Throttled,
    /// A sub-frame was missing or had unexpected dimensions.
    Incomplete,
    /// Stored at `index` in the snapshot store.
    Admitted { index: usize },
}

/// Decides which sensor frames are recorded and copies them into the store.
///
/// The controller owns a set of scratch buffers sized once from the sensor's
/// frame descriptions. They are reused by every notification and never handed
/// out: each admitted snapshot receives its own copy.
pub struct AdmissionController {
    throttle_interval: Duration,
    /// Started once at construction, never reset.
    session_clock: Instant,
    /// Reset on every notification that passes the throttle.
    frame_clock: Instant,
    finished: bool,

    depth_description: FrameDescription,
    color_description: FrameDescription,
    body_index_description: FrameDescription,

    depth_data: Vec<u16>,
    color_data: Vec<u8>,
    body_index_data: Vec<u8>,
    camera_points: Vec<CameraSpacePoint>,
    color_points: Vec<ColorSpacePoint>,
}

impl AdmissionController {
    /// Allocate scratch buffers for the given frame descriptions and start
    /// both clocks at `start`.
    pub fn new(
        depth_description: FrameDescription,
        color_description: FrameDescription,
        body_index_description: FrameDescription,
        throttle_interval: Duration,
        start: Instant,
    ) -> Self {
        let depth_pixels = depth_description.pixel_count();

        Self {
            throttle_interval,
            session_clock: start,
            frame_clock: start,
            finished: false,
            depth_description,
            color_description,
            body_index_description,
            depth_data: vec![0; depth_pixels],
            color_data: vec![0; color_description.pixel_count() * BYTES_PER_PIXEL],
            body_index_data: vec![0; body_index_description.pixel_count()],
            camera_points: vec![CameraSpacePoint::default(); depth_pixels],
            color_points: vec![ColorSpacePoint::default(); depth_pixels],
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Close admission. Later notifications become no-ops.
    pub fn finish(&mut self) {
        self.finished = true;
    }

    /// Body segmentation of the most recently acquired frame.
    pub fn body_index_data(&self) -> &[u8] {
        &self.body_index_data
    }

    /// Handle one "frames ready" notification arriving at `now`.
    pub fn on_frame_ready(
        &mut self,
        now: Instant,
        frame: &MultiSourceFrame,
        mapper: &dyn CoordinateMapper,
        store: &mut SnapshotStore,
    ) -> AdmissionOutcome {
        if self.finished {
            return AdmissionOutcome::Ignored;
        }

        if now.saturating_duration_since(self.frame_clock) < self.throttle_interval {
            return AdmissionOutcome::Throttled;
        }
        self.frame_clock = now;

        if !self.acquire(frame) {
            log::trace!("Dropped incomplete frame");
            return AdmissionOutcome::Incomplete;
        }

        mapper.map_depth_frame_to_color_space(&self.depth_data, &mut self.color_points);
        mapper.map_depth_frame_to_camera_space(&self.depth_data, &mut self.camera_points);

        let dimensions = FrameDimensions {
            depth_width: self.depth_description.width,
            depth_height: self.depth_description.height,
            color_width: self.color_description.width,
            color_height: self.color_description.height,
        };
        let timestamp_ms = now.saturating_duration_since(self.session_clock).as_millis() as u64;

        // The scratch buffers are overwritten by the next notification, so the
        // snapshot gets owned copies.
        let snapshot = match FrameSnapshot::new(
            self.camera_points.clone(),
            self.color_points.clone(),
            self.color_data.clone(),
            dimensions,
            timestamp_ms,
        ) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                log::warn!("Discarding malformed snapshot: {err}");
                return AdmissionOutcome::Incomplete;
            }
        };

        let outcome = match store.push(snapshot) {
            Ok(index) => {
                log::debug!("Recorded frame {index} at {timestamp_ms} ms");
                AdmissionOutcome::Admitted { index }
            }
            Err(_) => AdmissionOutcome::Ignored,
        };

        if store.is_full() {
            log::info!(
                "Snapshot store full ({} frames), recording finished",
                store.capacity()
            );
            self.finished = true;
        }

        outcome
    }

    /// Copy every sub-frame into the scratch buffers. A sub-frame that is
    /// absent or sized differently from the buffers is skipped, and the frame
    /// as a whole then counts as incomplete.
    fn acquire(&mut self, frame: &MultiSourceFrame) -> bool {
        let mut depth_processed = false;
        let mut color_processed = false;
        let mut body_index_processed = false;

        if let Some(depth) = &frame.depth {
            if depth.description == self.depth_description
                && depth.data.len() == self.depth_data.len()
            {
                self.depth_data.copy_from_slice(&depth.data);
                depth_processed = true;
            }
        }

        if let Some(color) = &frame.color {
            if color.description == self.color_description {
                color_processed = color.copy_to_bgra(&mut self.color_data);
            }
        }

        if let Some(body_index) = &frame.body_index {
            if body_index.description == self.body_index_description
                && body_index.data.len() == self.body_index_data.len()
            {
                self.body_index_data.copy_from_slice(&body_index.data);
                body_index_processed = true;
            }
        }

        depth_processed && color_processed && body_index_processed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::{BodyIndexFrame, ColorFrame, ColorImageFormat, DepthFrame};

    /// Camera space is (column, row, depth) and colour space mirrors the depth grid.
    struct GridMapper {
        depth_width: usize,
    }

    impl CoordinateMapper for GridMapper {
        fn map_depth_frame_to_camera_space(&self, depth: &[u16], out: &mut [CameraSpacePoint]) {
            for (i, (&d, point)) in depth.iter().zip(out.iter_mut()).enumerate() {
                *point = if d == 0 {
                    CameraSpacePoint::INVALID
                } else {
                    CameraSpacePoint::new(
                        (i % self.depth_width) as f32,
                        (i / self.depth_width) as f32,
                        d as f32,
                    )
                };
            }
        }

        fn map_depth_frame_to_color_space(&self, depth: &[u16], out: &mut [ColorSpacePoint]) {
            for (i, point) in out.iter_mut().enumerate().take(depth.len()) {
                *point = ColorSpacePoint::new(
                    (i % self.depth_width) as f32,
                    (i / self.depth_width) as f32,
                );
            }
        }
    }

    const DEPTH: FrameDescription = FrameDescription {
        width: 2,
        height: 2,
    };
    const COLOR: FrameDescription = FrameDescription {
        width: 2,
        height: 2,
    };
    const INTERVAL: Duration = Duration::from_millis(41);

    fn controller(start: Instant) -> AdmissionController {
        AdmissionController::new(DEPTH, COLOR, DEPTH, INTERVAL, start)
    }

    fn mapper() -> GridMapper {
        GridMapper { depth_width: 2 }
    }

    fn complete_frame(depth_value: u16, color_value: u8) -> MultiSourceFrame {
        MultiSourceFrame {
            depth: Some(DepthFrame {
                description: DEPTH,
                data: vec![depth_value; 4],
            }),
            color: Some(ColorFrame {
                description: COLOR,
                format: ColorImageFormat::Bgra,
                data: vec![color_value; 16],
            }),
            body_index: Some(BodyIndexFrame {
                description: DEPTH,
                data: vec![0xff; 4],
            }),
        }
    }

    #[test]
    fn admits_complete_frame_after_interval() {
        let start = Instant::now();
        let mut controller = controller(start);
        let mut store = SnapshotStore::with_capacity(10);

        let outcome = controller.on_frame_ready(
            start + Duration::from_millis(50),
            &complete_frame(1000, 7),
            &mapper(),
            &mut store,
        );

        assert_eq!(outcome, AdmissionOutcome::Admitted { index: 0 });
        let snapshot = &store.as_slice()[0];
        assert_eq!(snapshot.timestamp_ms(), 50);
        assert_eq!(snapshot.camera_points()[3], CameraSpacePoint::new(1.0, 1.0, 1000.0));
        assert!(snapshot.color_buffer().iter().all(|&b| b == 7));
        assert_eq!(snapshot.dimensions().color_width, 2);
    }

    #[test]
    fn throttles_frames_arriving_too_soon() {
        let start = Instant::now();
        let mut controller = controller(start);
        let mut store = SnapshotStore::with_capacity(10);

        let outcome = controller.on_frame_ready(
            start + Duration::from_millis(40),
            &complete_frame(1000, 0),
            &mapper(),
            &mut store,
        );

        assert_eq!(outcome, AdmissionOutcome::Throttled);
        assert!(store.is_empty());
    }

    #[test]
    fn burst_admission_is_bounded_by_elapsed_time() {
        let start = Instant::now();
        let mut controller = controller(start);
        let mut store = SnapshotStore::with_capacity(1000);
        let burst_start = start + INTERVAL;

        // One signal per millisecond over 200 ms.
        let elapsed = Duration::from_millis(200);
        for ms in 0..=elapsed.as_millis() as u64 {
            controller.on_frame_ready(
                burst_start + Duration::from_millis(ms),
                &complete_frame(1000, 0),
                &mapper(),
                &mut store,
            );
        }

        let bound = (elapsed.as_millis() / INTERVAL.as_millis()) as usize + 1;
        assert!(store.frame_count() <= bound);
        assert_eq!(store.frame_count(), 5);
        assert_eq!(store.timestamps(), vec![41, 82, 123, 164, 205]);
    }

    #[test]
    fn missing_sub_frame_drops_the_notification() {
        let start = Instant::now();
        let mut controller = controller(start);
        let mut store = SnapshotStore::with_capacity(10);
        let mut frame = complete_frame(1000, 0);
        frame.body_index = None;

        let outcome =
            controller.on_frame_ready(start + INTERVAL, &frame, &mapper(), &mut store);

        assert_eq!(outcome, AdmissionOutcome::Incomplete);
        assert!(store.is_empty());
        assert!(!controller.is_finished());
    }

    #[test]
    fn dimension_mismatch_drops_the_notification() {
        let start = Instant::now();
        let mut controller = controller(start);
        let mut store = SnapshotStore::with_capacity(10);
        let mut frame = complete_frame(1000, 0);
        frame.color = Some(ColorFrame {
            description: FrameDescription::new(4, 1),
            format: ColorImageFormat::Bgra,
            data: vec![0; 16],
        });

        let outcome =
            controller.on_frame_ready(start + INTERVAL, &frame, &mapper(), &mut store);
        assert_eq!(outcome, AdmissionOutcome::Incomplete);
    }

    #[test]
    fn dropped_notification_still_resets_frame_clock() {
        let start = Instant::now();
        let mut controller = controller(start);
        let mut store = SnapshotStore::with_capacity(10);

        let empty = MultiSourceFrame::default();
        let at = start + INTERVAL;
        assert_eq!(
            controller.on_frame_ready(at, &empty, &mapper(), &mut store),
            AdmissionOutcome::Incomplete
        );
        assert_eq!(
            controller.on_frame_ready(
                at + Duration::from_millis(1),
                &complete_frame(1000, 0),
                &mapper(),
                &mut store
            ),
            AdmissionOutcome::Throttled
        );
    }

    #[test]
    fn stored_snapshots_do_not_alias_scratch_buffers() {
        let start = Instant::now();
        let mut controller = controller(start);
        let mut store = SnapshotStore::with_capacity(10);

        for (i, (depth, color)) in [(500u16, 10u8), (1500, 20), (2500, 30)].into_iter().enumerate() {
            let at = start + INTERVAL * (i as u32 + 1);
            controller.on_frame_ready(at, &complete_frame(depth, color), &mapper(), &mut store);
        }

        assert_eq!(store.frame_count(), 3);
        let depths: Vec<f32> = store
            .as_slice()
            .iter()
            .map(|s| s.camera_points()[0].z)
            .collect();
        let colors: Vec<u8> = store.as_slice().iter().map(|s| s.color_buffer()[0]).collect();
        assert_eq!(depths, vec![500.0, 1500.0, 2500.0]);
        assert_eq!(colors, vec![10, 20, 30]);
    }

    #[test]
    fn reaching_capacity_finishes_recording() {
        let start = Instant::now();
        let mut controller = controller(start);
        let mut store = SnapshotStore::with_capacity(2);

        for i in 1..=10u32 {
            controller.on_frame_ready(
                start + INTERVAL * i,
                &complete_frame(1000, 0),
                &mapper(),
                &mut store,
            );
        }

        assert_eq!(store.frame_count(), 2);
        assert!(controller.is_finished());
        assert_eq!(
            controller.on_frame_ready(
                start + INTERVAL * 20,
                &complete_frame(1000, 0),
                &mapper(),
                &mut store
            ),
            AdmissionOutcome::Ignored
        );
    }

    #[test]
    fn finish_turns_notifications_into_no_ops() {
        let start = Instant::now();
        let mut controller = controller(start);
        let mut store = SnapshotStore::with_capacity(10);
        controller.finish();

        let outcome = controller.on_frame_ready(
            start + INTERVAL,
            &complete_frame(1000, 0),
            &mapper(),
            &mut store,
        );
        assert_eq!(outcome, AdmissionOutcome::Ignored);
        assert!(store.is_empty());
    }

    #[test]
    fn body_index_is_kept_in_scratch_only() {
        let start = Instant::now();
        let mut controller = controller(start);
        let mut store = SnapshotStore::with_capacity(10);

        controller.on_frame_ready(start + INTERVAL, &complete_frame(1000, 0), &mapper(), &mut store);
        assert_eq!(controller.body_index_data(), &[0xff; 4]);
    }
}
