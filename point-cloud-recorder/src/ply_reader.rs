//! Reader for the ASCII PLY clouds written by the encoder.
use crate::error::{RecorderError, Result};
use crate::frame::{PointCloudFrame, PointRecord};
use crate::ply::{END_HEADER, HEADER_PREAMBLE, VERTEX_PROPERTIES};
use std::str::FromStr;

/// Parse an encoded cloud back into its records.
/// Header keywords are matched with surrounding whitespace ignored.
pub fn read_ply(text: &str) -> Result<PointCloudFrame> {
    let mut lines = text.lines().enumerate().map(|(i, line)| (i + 1, line.trim()));

    for expected in HEADER_PREAMBLE {
        expect_line(&mut lines, expected.trim())?;
    }

    let (line_no, element) = next_line(&mut lines)?;
    let vertex_count = element
        .strip_prefix("element vertex")
        .map(str::trim)
        .and_then(|count| count.parse::<usize>().ok())
        .ok_or_else(|| RecorderError::ply(line_no, format!("expected vertex element, got '{element}'")))?;

    for expected in VERTEX_PROPERTIES {
        expect_line(&mut lines, expected.trim())?;
    }
    expect_line(&mut lines, END_HEADER.trim())?;

    let mut records = Vec::with_capacity(vertex_count);
    for _ in 0..vertex_count {
        let (line_no, line) = next_line(&mut lines)?;
        records.push(parse_record(line_no, line)?);
    }

    if let Some((line_no, extra)) = lines.find(|(_, line)| !line.is_empty()) {
        return Err(RecorderError::ply(
            line_no,
            format!("unexpected data after {vertex_count} vertices: '{extra}'"),
        ));
    }

    Ok(PointCloudFrame { records })
}

fn next_line<'a>(lines: &mut impl Iterator<Item = (usize, &'a str)>) -> Result<(usize, &'a str)> {
    lines
        .next()
        .ok_or_else(|| RecorderError::ply(0, "unexpected end of file"))
}

fn expect_line<'a>(lines: &mut impl Iterator<Item = (usize, &'a str)>, expected: &str) -> Result<()> {
    let (line_no, line) = next_line(lines)?;
    if line == expected {
        Ok(())
    } else {
        Err(RecorderError::ply(line_no, format!("expected '{expected}', got '{line}'")))
    }
}

fn parse_record(line_no: usize, line: &str) -> Result<PointRecord> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != VERTEX_PROPERTIES.len() {
        return Err(RecorderError::ply(
            line_no,
            format!("expected {} fields, got {}", VERTEX_PROPERTIES.len(), fields.len()),
        ));
    }

    Ok(PointRecord {
        x: parse_field(line_no, fields[0])?,
        y: parse_field(line_no, fields[1])?,
        z: parse_field(line_no, fields[2])?,
        r: parse_field(line_no, fields[3])?,
        g: parse_field(line_no, fields[4])?,
        b: parse_field(line_no, fields[5])?,
        timestamp_ms: parse_timestamp(line_no, fields[6])?,
    })
}

fn parse_field<T: FromStr>(line_no: usize, field: &str) -> Result<T> {
    field
        .parse()
        .map_err(|_| RecorderError::ply(line_no, format!("invalid value '{field}'")))
}

/// Timestamps are declared as floats, the recorder writes whole milliseconds.
fn parse_timestamp(line_no: usize, field: &str) -> Result<u64> {
    if let Ok(ms) = field.parse::<u64>() {
        return Ok(ms);
    }
    match field.parse::<f64>() {
        Ok(ms) if ms.is_finite() && ms >= 0.0 => Ok(ms.round() as u64),
        _ => Err(RecorderError::ply(line_no, format!("invalid timestamp '{field}'"))),
    }
}
