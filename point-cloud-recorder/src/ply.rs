//! ASCII PLY encoding of projected point clouds.
use crate::frame::{PointCloudFrame, PointRecord};
use std::fmt::Write;

/// Header lines preceding `element vertex`, trailing spaces included.
pub(crate) const HEADER_PREAMBLE: [&str; 2] = ["ply ", "format ascii 1.0 "];

/// Property declarations in record field order.
pub(crate) const VERTEX_PROPERTIES: [&str; 7] = [
    "property float x ",
    "property float y ",
    "property float z ",
    "property uchar red ",
    "property uchar green ",
    "property uchar blue ",
    "property float timeStamp ",
];

pub(crate) const END_HEADER: &str = "end_header ";

/// Rough upper bound of one encoded record, used to presize the output.
const APPROX_LINE_LEN: usize = 48;

/// Encode `frame` as an ASCII PLY document.
///
/// Frames with `min_points` vertices or fewer are treated as capture noise and
/// produce nothing. Numbers are written with `Display`, which is independent of
/// the host locale: `.` as decimal separator and no digit grouping.
pub fn encode(frame: &PointCloudFrame, min_points: usize) -> Option<String> {
    let vertex_count = frame.vertex_count();
    if vertex_count <= min_points {
        return None;
    }

    let mut out = String::with_capacity(256 + vertex_count * APPROX_LINE_LEN);
    write_header(&mut out, vertex_count);
    for record in &frame.records {
        write_record(&mut out, record);
    }
    Some(out)
}

fn write_header(out: &mut String, vertex_count: usize) {
    for line in HEADER_PREAMBLE {
        out.push_str(line);
        out.push('\n');
    }
    // Writing to a String cannot fail.
    let _ = writeln!(out, "element vertex {vertex_count}");
    for line in VERTEX_PROPERTIES {
        out.push_str(line);
        out.push('\n');
    }
    out.push_str(END_HEADER);
    out.push('\n');
}

fn write_record(out: &mut String, record: &PointRecord) {
    let _ = writeln!(
        out,
        "{} {} {} {} {} {} {}",
        record.x, record.y, record.z, record.r, record.g, record.b, record.timestamp_ms
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_of(count: usize) -> PointCloudFrame {
        PointCloudFrame {
            records: vec![
                PointRecord {
                    x: 0.5,
                    y: -1.25,
                    z: 2.0,
                    r: 255,
                    g: 128,
                    b: 0,
                    timestamp_ms: 42,
                };
                count
            ],
        }
    }

    #[test]
    fn header_declares_vertex_count_and_properties() {
        let text = encode(&frame_of(2), 0).unwrap();
        let expected_header = "ply \n\
            format ascii 1.0 \n\
            element vertex 2\n\
            property float x \n\
            property float y \n\
            property float z \n\
            property uchar red \n\
            property uchar green \n\
            property uchar blue \n\
            property float timeStamp \n\
            end_header \n";
        assert!(text.starts_with(expected_header), "{text}");
        assert_eq!(&text[expected_header.len()..], "0.5 -1.25 2 255 128 0 42\n0.5 -1.25 2 255 128 0 42\n");
    }

    #[test]
    fn sentinel_record_encodes_as_zeros() {
        let frame = PointCloudFrame {
            records: vec![PointRecord::SENTINEL],
        };
        let text = encode(&frame, 0).unwrap();
        assert!(text.ends_with("end_header \n0 0 0 0 0 0 0\n"));
    }

    #[test]
    fn floats_keep_full_precision_without_exponent() {
        let frame = PointCloudFrame {
            records: vec![PointRecord {
                x: 0.123_456_7,
                y: 1.0e-7,
                z: 1234.5,
                ..PointRecord::SENTINEL
            }],
        };
        let text = encode(&frame, 0).unwrap();
        assert!(text.ends_with("0.1234567 0.0000001 1234.5 0 0 0 0\n"), "{text}");
    }

    #[test]
    fn min_points_boundary_is_exclusive() {
        assert_eq!(encode(&frame_of(3), 3), None);
        assert!(encode(&frame_of(4), 3).is_some());
        assert_eq!(encode(&PointCloudFrame::default(), 0), None);
    }

    #[test]
    fn encoding_is_deterministic() {
        let frame = frame_of(16);
        assert_eq!(encode(&frame, 0), encode(&frame.clone(), 0));
    }
}
