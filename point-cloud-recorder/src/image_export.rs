//! Colour and depth preview images of a decoded cloud.
use crate::error::{RecorderError, Result};
use crate::frame::{PointCloudFrame, PointRecord};
use constants::output::DEPTH_IMAGE_RANGE_METRES;
use image::{GrayImage, Luma, Rgb, RgbImage};
use std::fs;
use std::path::{Path, PathBuf};

/// Paths of the two images written for one cloud.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedImages {
    pub rgb: PathBuf,
    pub depth: PathBuf,
}

/// Depth in metres to an 8-bit grey level, saturating beyond the preview range.
pub fn depth_luma(z: f32) -> u8 {
    let level = 256.0 * z / DEPTH_IMAGE_RANGE_METRES;
    if level.is_nan() {
        0
    } else {
        level.clamp(0.0, 255.0) as u8
    }
}

/// File name for cloud `id`, e.g. `0007.tga`.
pub fn image_file_name(id: usize) -> String {
    format!("{id:04}.tga")
}

/// Write `rgb/<id>.tga` and `depth/<id>.tga` under `dir`.
/// `frame` must hold exactly `width * height` records in row-major order.
pub fn export_images(
    frame: &PointCloudFrame,
    width: usize,
    height: usize,
    dir: &Path,
    id: usize,
) -> Result<ExportedImages> {
    if frame.vertex_count() != width * height {
        return Err(RecorderError::SnapshotShape {
            field: "records",
            expected: width * height,
            actual: frame.vertex_count(),
        });
    }

    let rgb_dir = dir.join("rgb");
    let depth_dir = dir.join("depth");
    fs::create_dir_all(&rgb_dir)?;
    fs::create_dir_all(&depth_dir)?;

    let record_at = |x: u32, y: u32| -> PointRecord { frame.records[y as usize * width + x as usize] };

    let rgb = RgbImage::from_fn(width as u32, height as u32, |x, y| {
        let record = record_at(x, y);
        Rgb([record.r, record.g, record.b])
    });
    let depth = GrayImage::from_fn(width as u32, height as u32, |x, y| {
        Luma([depth_luma(record_at(x, y).z)])
    });

    let exported = ExportedImages {
        rgb: rgb_dir.join(image_file_name(id)),
        depth: depth_dir.join(image_file_name(id)),
    };
    rgb.save(&exported.rgb)?;
    depth.save(&exported.depth)?;

    log::debug!("Saved {} and {}", exported.rgb.display(), exported.depth.display());
    Ok(exported)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(z: f32, r: u8) -> PointRecord {
        PointRecord {
            x: 0.0,
            y: 0.0,
            z,
            r,
            g: 2,
            b: 3,
            timestamp_ms: 1,
        }
    }

    #[test]
    fn luma_scales_and_saturates() {
        assert_eq!(depth_luma(0.0), 0);
        assert_eq!(depth_luma(3.5), 128);
        assert_eq!(depth_luma(7.0), 255);
        assert_eq!(depth_luma(12.0), 255);
        assert_eq!(depth_luma(-1.0), 0);
        assert_eq!(depth_luma(f32::NAN), 0);
    }

    #[test]
    fn ids_are_zero_padded() {
        assert_eq!(image_file_name(7), "0007.tga");
        assert_eq!(image_file_name(12345), "12345.tga");
    }

    #[test]
    fn writes_both_images_with_grid_size() {
        let dir = tempfile::tempdir().unwrap();
        let frame = PointCloudFrame {
            records: vec![
                record(3.5, 10),
                record(0.0, 20),
                record(7.0, 30),
                PointRecord::SENTINEL,
                record(1.75, 50),
                record(3.5, 60),
            ],
        };

        let exported = export_images(&frame, 3, 2, dir.path(), 7).unwrap();
        assert!(exported.rgb.ends_with("rgb/0007.tga"));
        assert!(exported.depth.ends_with("depth/0007.tga"));

        let rgb = image::open(&exported.rgb).unwrap().to_rgb8();
        assert_eq!(rgb.dimensions(), (3, 2));
        assert_eq!(rgb.get_pixel(2, 0), &Rgb([30, 2, 3]));
        assert_eq!(rgb.get_pixel(0, 1), &Rgb([0, 0, 0]));

        let depth = image::open(&exported.depth).unwrap().to_luma8();
        assert_eq!(depth.get_pixel(0, 0), &Luma([128]));
        assert_eq!(depth.get_pixel(1, 1), &Luma([64]));
    }

    #[test]
    fn rejects_mismatched_grid() {
        let dir = tempfile::tempdir().unwrap();
        let frame = PointCloudFrame {
            records: vec![record(1.0, 1); 5],
        };
        assert!(matches!(
            export_images(&frame, 3, 2, dir.path(), 0),
            Err(RecorderError::SnapshotShape { expected: 6, actual: 5, .. })
        ));
    }
}
