//! Recording manifest written next to the cloud archive.
use crate::config::RecorderConfig;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Summary of one recording session.
/// Lets a consumer check capture rate and filtering without unpacking the archive.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RecordingManifest {
    /// File name of the cloud archive this manifest describes.
    pub archive: String,
    /// Capture settings the session ran with.
    pub config: RecorderConfig,
    /// Frames admitted into the snapshot store.
    pub frames_recorded: usize,
    /// Clouds written to the archive after size filtering.
    pub clouds_accepted: usize,
    /// Store index of the frame behind each archived cloud, in archive order.
    pub source_frames: Vec<usize>,
    /// Session-clock admission time of every recorded frame.
    pub timestamps_ms: Vec<u64>,
    /// Frames per second across the recording, absent with fewer than two frames.
    pub effective_fps: Option<f64>,
}

impl RecordingManifest {
    pub fn new(
        archive: &str,
        config: RecorderConfig,
        timestamps_ms: Vec<u64>,
        source_frames: Vec<usize>,
    ) -> Self {
        Self {
            archive: archive.to_string(),
            config,
            frames_recorded: timestamps_ms.len(),
            clouds_accepted: source_frames.len(),
            effective_fps: effective_fps(&timestamps_ms),
            source_frames,
            timestamps_ms,
        }
    }
}

/// Recorded frames over the span between the first and last admission.
pub fn effective_fps(timestamps_ms: &[u64]) -> Option<f64> {
    let (first, last) = (timestamps_ms.first()?, timestamps_ms.last()?);
    let span_ms = last.checked_sub(*first).filter(|span| *span > 0)?;
    Some(timestamps_ms.len() as f64 * 1000.0 / span_ms as f64)
}

pub struct ManifestGenerator {
    output_dir: PathBuf,
    archive_stem: String,
}

impl ManifestGenerator {
    pub fn new(output_dir: &Path, archive_stem: &str) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
            archive_stem: archive_stem.to_string(),
        }
    }

    /// Path the manifest is written to, `<archive stem>.json`.
    pub fn manifest_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.json", self.archive_stem))
    }

    /// Write the manifest as pretty JSON and print a summary.
    pub fn write(&self, manifest: &RecordingManifest) -> Result<PathBuf> {
        let manifest_path = self.manifest_path();
        let manifest_json = serde_json::to_string_pretty(manifest)?;
        fs::write(&manifest_path, manifest_json)?;

        println!("Generated recording manifest: {}", manifest_path.display());
        self.print_manifest_summary(manifest);

        Ok(manifest_path)
    }

    pub fn read(path: &Path) -> Result<RecordingManifest> {
        let manifest_json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&manifest_json)?)
    }

    fn print_manifest_summary(&self, manifest: &RecordingManifest) {
        println!("Manifest Summary:");
        println!("  Archive: {}", manifest.archive);
        println!("  Frames recorded: {}", manifest.frames_recorded);
        println!(
            "  Clouds accepted: {} (more than {} points each)",
            manifest.clouds_accepted, manifest.config.min_points
        );
        match manifest.effective_fps {
            Some(fps) => println!("  Effective rate: {:.2} fps", fps),
            None => println!("  Effective rate: n/a"),
        }
    }
}
