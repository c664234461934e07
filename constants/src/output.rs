/// Prefix shared by archive files and their cloud entries
pub const CLOUD_PREFIX: &str = "cloud";

/// Extension of encoded cloud entries
pub const CLOUD_EXTENSION: &str = "ply";

/// chrono format of the archive date, the slash-separated short date with '-'
pub const ARCHIVE_DATE_FORMAT: &str = "%m-%d-%Y";

/// Depth in metres mapped to full white when exporting depth images
pub const DEPTH_IMAGE_RANGE_METRES: f32 = 7.0;
