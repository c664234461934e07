//! Depth sensor recorder: buffers throttled depth and colour captures, then
//! converts them into timestamped, coloured PLY point clouds packed in a zip.
pub mod admission;
pub mod archive;
pub mod bounds;
pub mod color_convert;
pub mod config;
pub mod converter;
pub mod error;
pub mod frame;
pub mod image_export;
pub mod manifest;
pub mod ply;
pub mod ply_reader;
pub mod progress;
pub mod projector;
pub mod recorder;
pub mod sensor;
pub mod snapshot_store;
pub mod synthetic;

pub use archive::{ArchiveSink, ZipArchiveSink};
pub use config::RecorderConfig;
pub use error::{RecorderError, Result};
pub use frame::{FrameSnapshot, PointCloudFrame, PointRecord};
pub use recorder::{RecordingSession, SessionState, run};
pub use sensor::{CoordinateMapper, Sensor};
