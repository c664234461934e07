//! Conversion of buffered snapshots into encoded point clouds.
use crate::config::RecorderConfig;
use crate::error::Result;
use crate::frame::FrameSnapshot;
use crate::ply::encode;
use crate::progress::progress_bar;
use crate::projector::project;
use rayon::prelude::*;

/// Encoded clouds of one recording, in ascending frame order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ConvertedClouds {
    /// PLY text of every accepted frame.
    pub clouds: Vec<String>,
    /// Store index of the frame each cloud came from.
    pub source_frames: Vec<usize>,
    /// Frames dropped for having too few vertices.
    pub dropped_frames: usize,
}

impl ConvertedClouds {
    pub fn len(&self) -> usize {
        self.clouds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clouds.is_empty()
    }
}

/// Projects and encodes snapshots with a fixed stride and size threshold.
pub struct CloudConverter {
    stride: usize,
    min_points: usize,
}

impl CloudConverter {
    pub fn new(stride: usize, min_points: usize) -> Self {
        Self { stride, min_points }
    }

    pub fn from_config(config: &RecorderConfig) -> Self {
        Self::new(config.stride, config.min_points)
    }

    /// Project, filter and encode one snapshot.
    pub fn convert_one(&self, snapshot: &FrameSnapshot) -> Result<Option<String>> {
        let frame = project(snapshot, self.stride)?;
        Ok(encode(&frame, self.min_points))
    }

    /// Convert every snapshot in parallel. Output order follows input order.
    pub fn convert(&self, snapshots: &[FrameSnapshot]) -> Result<ConvertedClouds> {
        println!(
            "Converting {} frames to point clouds (stride {}, more than {} points)...",
            snapshots.len(),
            self.stride,
            self.min_points
        );

        let pb = progress_bar(snapshots.len(), "frames", "Projecting frames");

        let encoded = snapshots
            .par_iter()
            .map(|snapshot| {
                let cloud = self.convert_one(snapshot);
                pb.inc(1);
                cloud
            })
            .collect::<Result<Vec<Option<String>>>>()?;

        pb.finish_with_message("Frames projected");

        let mut converted = ConvertedClouds::default();
        for (frame_index, cloud) in encoded.into_iter().enumerate() {
            match cloud {
                Some(text) => {
                    log::debug!(
                        "Flushing cloud {} of {}",
                        frame_index + 1,
                        snapshots.len()
                    );
                    converted.clouds.push(text);
                    converted.source_frames.push(frame_index);
                }
                None => {
                    log::debug!("Dropped frame {frame_index}: too few points");
                    converted.dropped_frames += 1;
                }
            }
        }

        println!(
            "Converted {} of {} frames ({} dropped)",
            converted.len(),
            snapshots.len(),
            converted.dropped_frames
        );
        Ok(converted)
    }
}
