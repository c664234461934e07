//! Packaging of encoded clouds into a zip archive.
use crate::error::{RecorderError, Result};
use crate::progress::progress_bar;
use chrono::NaiveDate;
use constants::output::{ARCHIVE_DATE_FORMAT, CLOUD_EXTENSION, CLOUD_PREFIX};
use std::io::{Read, Seek, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Destination for named text blobs.
pub trait ArchiveSink {
    fn write_entry(&mut self, name: &str, contents: &str) -> Result<()>;

    /// Flush everything written so far. No entries may follow.
    fn finish(&mut self) -> Result<()>;
}

/// Archive sink writing deflated zip entries.
pub struct ZipArchiveSink<W: Write + Seek> {
    writer: Option<ZipWriter<W>>,
    finished: Option<W>,
    options: FileOptions,
}

impl<W: Write + Seek> ZipArchiveSink<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: Some(ZipWriter::new(inner)),
            finished: None,
            options: FileOptions::default().compression_method(CompressionMethod::Deflated),
        }
    }

    /// The underlying writer, once the archive has been finished.
    pub fn into_inner(self) -> Option<W> {
        self.finished
    }
}

impl<W: Write + Seek> ArchiveSink for ZipArchiveSink<W> {
    fn write_entry(&mut self, name: &str, contents: &str) -> Result<()> {
        let writer = self.writer.as_mut().ok_or(RecorderError::InvalidState {
            operation: "write an archive entry",
            state: "finished",
        })?;
        writer.start_file(name, self.options)?;
        writer.write_all(contents.as_bytes())?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            self.finished = Some(writer.finish()?);
        }
        Ok(())
    }
}

/// Entry name of the `index`-th accepted cloud, e.g. `cloud0.ply`.
pub fn cloud_entry_name(index: usize) -> String {
    format!("{CLOUD_PREFIX}{index}.{CLOUD_EXTENSION}")
}

/// Archive file name for a recording made on `date`, e.g. `cloud10-19-2026.zip`.
pub fn archive_file_name(date: NaiveDate) -> String {
    format!("{CLOUD_PREFIX}{}.zip", date.format(ARCHIVE_DATE_FORMAT))
}

/// Write `clouds` as `cloud0.ply`, `cloud1.ply`, ... in order, then finish the sink.
pub fn write_clouds(sink: &mut dyn ArchiveSink, clouds: &[String]) -> Result<()> {
    let pb = progress_bar(clouds.len(), "clouds", "Writing archive");

    for (index, cloud) in clouds.iter().enumerate() {
        sink.write_entry(&cloud_entry_name(index), cloud)?;
        pb.inc(1);
    }
    sink.finish()?;

    pb.finish_with_message("Archive written");
    Ok(())
}

/// Read every `cloud<N>.ply` entry of an archive, ordered by `N`.
pub fn read_clouds<R: Read + Seek>(reader: R) -> Result<Vec<(String, String)>> {
    let mut archive = ZipArchive::new(reader)?;
    let mut clouds = Vec::new();

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let Some(index) = parse_cloud_index(entry.name()) else {
            log::debug!("Skipping archive entry {}", entry.name());
            continue;
        };
        let name = entry.name().to_string();
        let mut contents = String::new();
        entry.read_to_string(&mut contents)?;
        clouds.push((index, name, contents));
    }

    clouds.sort_by_key(|(index, _, _)| *index);
    Ok(clouds
        .into_iter()
        .map(|(_, name, contents)| (name, contents))
        .collect())
}

fn parse_cloud_index(name: &str) -> Option<usize> {
    name.strip_prefix(CLOUD_PREFIX)?
        .strip_suffix(CLOUD_EXTENSION)?
        .strip_suffix('.')?
        .parse()
        .ok()
}
