//! Projection of a raw snapshot into a coloured, timestamped point cloud.
use crate::error::{RecorderError, Result};
use crate::frame::{FrameSnapshot, PointCloudFrame, PointRecord};
use constants::capture::BYTES_PER_PIXEL;

/// Sample every `stride`-th depth pixel of `snapshot` in row-major order.
///
/// Each sampled pixel yields exactly one record: its camera-space position
/// coloured from the nearest colour pixel, or the all-zero sentinel when any
/// axis is infinite. Colour outside the colour frame is black.
pub fn project(snapshot: &FrameSnapshot, stride: usize) -> Result<PointCloudFrame> {
    if stride == 0 {
        return Err(RecorderError::ZeroStride);
    }

    let dims = snapshot.dimensions();
    let camera_points = snapshot.camera_points();
    let color_mapping = snapshot.color_mapping();
    let color_buffer = snapshot.color_buffer();

    let sampled_rows = dims.depth_height.div_ceil(stride);
    let sampled_cols = dims.depth_width.div_ceil(stride);
    let mut records = Vec::with_capacity(sampled_rows * sampled_cols);

    for y in (0..dims.depth_height).step_by(stride) {
        for x in (0..dims.depth_width).step_by(stride) {
            let depth_index = y * dims.depth_width + x;
            let point = camera_points[depth_index];

            if !point.has_no_infinite_axis() {
                records.push(PointRecord::SENTINEL);
                continue;
            }

            let (r, g, b) = color_mapping[depth_index]
                .nearest_pixel()
                .filter(|&(cx, cy)| {
                    cx >= 0
                        && cy >= 0
                        && (cx as usize) < dims.color_width
                        && (cy as usize) < dims.color_height
                })
                .map(|(cx, cy)| {
                    let color_index =
                        ((cy as usize * dims.color_width) + cx as usize) * BYTES_PER_PIXEL;
                    (
                        color_buffer[color_index + 2],
                        color_buffer[color_index + 1],
                        color_buffer[color_index],
                    )
                })
                .unwrap_or((0, 0, 0));

            records.push(PointRecord {
                x: point.x,
                y: point.y,
                z: point.z,
                r,
                g,
                b,
                timestamp_ms: snapshot.timestamp_ms(),
            });
        }
    }

    Ok(PointCloudFrame { records })
}

/// Sampled grid size `(columns, rows)` for a depth frame at `stride`.
pub fn sampled_grid(depth_width: usize, depth_height: usize, stride: usize) -> (usize, usize) {
    (
        depth_width.div_ceil(stride.max(1)),
        depth_height.div_ceil(stride.max(1)),
    )
}
