//! Recording session: capture, conversion and packaging of one recording.
use crate::admission::{AdmissionController, AdmissionOutcome};
use crate::archive::{ArchiveSink, ZipArchiveSink, write_clouds};
use crate::config::RecorderConfig;
use crate::converter::{CloudConverter, ConvertedClouds};
use crate::error::{RecorderError, Result};
use crate::manifest::{ManifestGenerator, RecordingManifest};
use crate::progress::progress_bar;
use crate::sensor::{CoordinateMapper, MultiSourceFrame, Sensor};
use crate::snapshot_store::SnapshotStore;
use crossbeam_channel::{Receiver, select};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Phase of a recording session. Phases only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Constructed,
    Recording,
    Converting,
    Finished,
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Constructed => "constructed",
            Self::Recording => "recording",
            Self::Converting => "converting",
            Self::Finished => "finished",
        }
    }
}

/// Why the recording loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The snapshot store reached `max_frames`.
    StoreFull,
    /// A stop request arrived, or every stop sender went away.
    Requested,
    /// The sensor stopped delivering frames.
    SensorDisconnected,
}

/// One recording, driven through `record`, `convert` and `write_archive` in order.
pub struct RecordingSession {
    config: RecorderConfig,
    state: SessionState,
    store: SnapshotStore,
    converted: Option<ConvertedClouds>,
}

impl RecordingSession {
    pub fn new(config: RecorderConfig) -> Self {
        Self {
            store: SnapshotStore::with_capacity(config.max_frames),
            config,
            state: SessionState::Constructed,
            converted: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Clouds produced by `convert`, if it has run.
    pub fn converted(&self) -> Option<&ConvertedClouds> {
        self.converted.as_ref()
    }

    fn expect_state(&self, expected: SessionState, operation: &'static str) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(RecorderError::InvalidState {
                operation,
                state: self.state.name(),
            })
        }
    }

    /// Open `sensor` and admit frames until the store is full, `stop` fires or
    /// the sensor goes quiet. The sensor is closed again before returning.
    pub fn record(&mut self, sensor: &mut dyn Sensor, stop: &Receiver<()>) -> Result<StopReason> {
        self.expect_state(SessionState::Constructed, "record")?;

        // Session time counts from before the sensor is opened.
        let session_start = Instant::now();
        let frames = sensor.open_reader();
        sensor.open()?;
        if !sensor.is_open() {
            return Err(RecorderError::SensorNotOpen);
        }

        let mapper = sensor.coordinate_mapper();
        let controller = AdmissionController::new(
            sensor.depth_frame_description(),
            sensor.color_frame_description(),
            sensor.body_index_frame_description(),
            self.config.throttle_interval,
            session_start,
        );

        let reason = self.record_frames(controller, &frames, mapper.as_ref(), stop);
        sensor.close();
        Ok(reason)
    }

    fn record_frames(
        &mut self,
        mut controller: AdmissionController,
        frames: &Receiver<MultiSourceFrame>,
        mapper: &dyn CoordinateMapper,
        stop: &Receiver<()>,
    ) -> StopReason {
        self.state = SessionState::Recording;
        log::info!(
            "Recording up to {} frames, one every {} ms at most",
            self.config.max_frames,
            self.config.throttle_interval.as_millis()
        );

        let pb = progress_bar(self.config.max_frames, "frames", "Recording");
        let mut incomplete = 0usize;

        let reason = loop {
            select! {
                recv(frames) -> frame => match frame {
                    Ok(frame) => {
                        match controller.on_frame_ready(Instant::now(), &frame, mapper, &mut self.store) {
                            AdmissionOutcome::Admitted { index } => pb.set_position(index as u64 + 1),
                            AdmissionOutcome::Incomplete => incomplete += 1,
                            AdmissionOutcome::Throttled | AdmissionOutcome::Ignored => {}
                        }
                        if controller.is_finished() {
                            break StopReason::StoreFull;
                        }
                    }
                    Err(_) => break StopReason::SensorDisconnected,
                },
                recv(stop) -> _ => break StopReason::Requested,
            }
        };
        controller.finish();

        pb.finish_with_message("Recording stopped");
        if incomplete > 0 {
            log::debug!("{incomplete} incomplete frames skipped");
        }
        match reason {
            StopReason::SensorDisconnected => log::warn!("Sensor stopped delivering frames"),
            _ => log::info!("Recording stopped ({reason:?})"),
        }
        println!("Recorded {} frames", self.store.frame_count());

        self.state = SessionState::Converting;
        reason
    }

    /// Project and encode every recorded frame.
    pub fn convert(&mut self) -> Result<&ConvertedClouds> {
        self.expect_state(SessionState::Converting, "convert")?;
        if self.converted.is_some() {
            return Err(RecorderError::InvalidState {
                operation: "convert",
                state: "converted",
            });
        }

        let converted = CloudConverter::from_config(&self.config).convert(self.store.as_slice())?;
        let converted: &ConvertedClouds = self.converted.insert(converted);
        Ok(converted)
    }

    /// Write the converted clouds to `sink` and finish the session.
    pub fn write_archive(&mut self, sink: &mut dyn ArchiveSink) -> Result<usize> {
        self.expect_state(SessionState::Converting, "write the archive")?;
        let converted = self.converted.as_ref().ok_or(RecorderError::InvalidState {
            operation: "write the archive",
            state: "not converted",
        })?;

        write_clouds(sink, &converted.clouds)?;
        self.state = SessionState::Finished;
        Ok(converted.len())
    }

    /// Manifest describing this session's archive.
    pub fn manifest(&self, archive_name: &str) -> RecordingManifest {
        let source_frames = self
            .converted
            .as_ref()
            .map(|c| c.source_frames.clone())
            .unwrap_or_default();
        RecordingManifest::new(archive_name, self.config, self.store.timestamps(), source_frames)
    }
}

/// Files produced by a complete recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingOutput {
    pub archive_path: PathBuf,
    pub manifest_path: PathBuf,
    pub frames_recorded: usize,
    pub clouds_written: usize,
}

/// Record from `sensor` until stopped, then write `archive_name` and its
/// manifest into `output_dir`.
pub fn run(
    sensor: &mut dyn Sensor,
    config: RecorderConfig,
    output_dir: &Path,
    archive_name: &str,
    stop: &Receiver<()>,
) -> Result<RecordingOutput> {
    let mut session = RecordingSession::new(config);
    session.record(sensor, stop)?;
    session.convert()?;

    let archive_path = output_dir.join(archive_name);
    let file = File::create(&archive_path)?;
    let mut sink = ZipArchiveSink::new(BufWriter::new(file));
    let clouds_written = session.write_archive(&mut sink)?;
    if let Some(mut writer) = sink.into_inner() {
        writer.flush()?;
    }
    println!("Saved {} ({} clouds)", archive_path.display(), clouds_written);

    let archive_stem = archive_name.strip_suffix(".zip").unwrap_or(archive_name);
    let manifest_path =
        ManifestGenerator::new(output_dir, archive_stem).write(&session.manifest(archive_name))?;

    Ok(RecordingOutput {
        archive_path,
        manifest_path,
        frames_recorded: session.store().frame_count(),
        clouds_written,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::read_clouds;
    use crate::sensor::{ColorImageFormat, FrameDescription};
    use crate::synthetic::SyntheticSensor;
    use std::io::Cursor;
    use std::time::Duration;

    fn small_config(max_frames: usize) -> RecorderConfig {
        RecorderConfig {
            max_frames,
            min_points: 10,
            stride: 4,
            throttle_interval: Duration::from_millis(5),
        }
    }

    fn small_sensor() -> SyntheticSensor {
        SyntheticSensor::new(
            FrameDescription::new(64, 53),
            FrameDescription::new(240, 135),
            ColorImageFormat::Yuy2,
            Duration::from_millis(2),
        )
    }

    /// Synthetic sensor that takes a while to open.
    struct SlowOpenSensor {
        inner: SyntheticSensor,
        open_delay: Duration,
    }

    impl Sensor for SlowOpenSensor {
        fn open(&mut self) -> Result<()> {
            std::thread::sleep(self.open_delay);
            self.inner.open()
        }

        fn close(&mut self) {
            self.inner.close()
        }

        fn is_open(&self) -> bool {
            self.inner.is_open()
        }

        fn depth_frame_description(&self) -> FrameDescription {
            self.inner.depth_frame_description()
        }

        fn color_frame_description(&self) -> FrameDescription {
            self.inner.color_frame_description()
        }

        fn body_index_frame_description(&self) -> FrameDescription {
            self.inner.body_index_frame_description()
        }

        fn open_reader(&mut self) -> Receiver<MultiSourceFrame> {
            self.inner.open_reader()
        }

        fn coordinate_mapper(&self) -> std::sync::Arc<dyn CoordinateMapper> {
            self.inner.coordinate_mapper()
        }
    }

    #[test]
    fn timestamps_include_sensor_open_time() {
        let mut session = RecordingSession::new(RecorderConfig {
            throttle_interval: Duration::from_millis(41),
            ..small_config(1)
        });
        let mut sensor = SlowOpenSensor {
            inner: small_sensor(),
            open_delay: Duration::from_millis(60),
        };

        session
            .record(&mut sensor, &crossbeam_channel::never())
            .unwrap();

        // Frames arriving right after open are already past the throttle.
        let timestamps = session.store().timestamps();
        assert_eq!(timestamps.len(), 1);
        assert!(timestamps[0] >= 60, "first frame at {} ms", timestamps[0]);
    }

    #[test]
    fn out_of_order_calls_are_rejected() {
        let mut session = RecordingSession::new(small_config(2));
        assert!(matches!(
            session.convert(),
            Err(RecorderError::InvalidState { state: "constructed", .. })
        ));

        let mut sink = ZipArchiveSink::new(Cursor::new(Vec::new()));
        assert!(matches!(
            session.write_archive(&mut sink),
            Err(RecorderError::InvalidState { .. })
        ));
        assert_eq!(session.state(), SessionState::Constructed);
    }

    #[test]
    fn records_until_store_is_full() {
        let mut session = RecordingSession::new(small_config(3));
        let mut sensor = small_sensor();

        let reason = session
            .record(&mut sensor, &crossbeam_channel::never())
            .unwrap();

        assert_eq!(reason, StopReason::StoreFull);
        assert_eq!(session.state(), SessionState::Converting);
        assert_eq!(session.store().frame_count(), 3);
        assert!(!sensor.is_open());

        let timestamps = session.store().timestamps();
        assert!(timestamps.windows(2).all(|w| w[1] - w[0] >= 5));
    }

    #[test]
    fn stop_request_ends_recording() {
        let mut session = RecordingSession::new(small_config(1000));
        let mut sensor = small_sensor();
        let (stop_tx, stop_rx) = crossbeam_channel::bounded(1);
        stop_tx.send(()).unwrap();

        let reason = session.record(&mut sensor, &stop_rx).unwrap();
        assert_eq!(reason, StopReason::Requested);
        assert!(session.store().frame_count() < 1000);
    }

    #[test]
    fn full_lifecycle_writes_every_accepted_cloud() {
        let mut session = RecordingSession::new(small_config(2));
        let mut sensor = small_sensor();
        session
            .record(&mut sensor, &crossbeam_channel::never())
            .unwrap();

        // 64x53 at stride 4 samples 16x14 pixels.
        let converted = session.convert().unwrap();
        assert_eq!(converted.len(), 2);
        assert!(converted.clouds[0].contains("element vertex 224\n"));

        assert!(matches!(
            session.convert(),
            Err(RecorderError::InvalidState { state: "converted", .. })
        ));

        let mut sink = ZipArchiveSink::new(Cursor::new(Vec::new()));
        assert_eq!(session.write_archive(&mut sink).unwrap(), 2);
        assert_eq!(session.state(), SessionState::Finished);

        let mut buffer = sink.into_inner().unwrap();
        buffer.set_position(0);
        let names: Vec<String> = read_clouds(buffer)
            .unwrap()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, ["cloud0.ply", "cloud1.ply"]);

        let manifest = session.manifest("cloud08-06-2015.zip");
        assert_eq!(manifest.frames_recorded, 2);
        assert_eq!(manifest.source_frames, vec![0, 1]);
    }
}
