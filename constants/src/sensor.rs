/// Depth and body index frame resolution
pub const DEPTH_WIDTH: usize = 512;
pub const DEPTH_HEIGHT: usize = 424;

/// Colour frame resolution
pub const COLOR_WIDTH: usize = 1920;
pub const COLOR_HEIGHT: usize = 1080;

/// Depth camera focal length X (pixels)
pub const DEPTH_FX: f32 = 365.46;
/// Depth camera focal length Y (pixels)
pub const DEPTH_FY: f32 = 365.46;
/// Depth camera principal point X (pixels)
pub const DEPTH_CX: f32 = 257.59;
/// Depth camera principal point Y (pixels)
pub const DEPTH_CY: f32 = 207.28;

/// Colour camera focal length (pixels)
pub const COLOR_F: f32 = 1081.37;
/// Colour camera principal point X (pixels)
pub const COLOR_CX: f32 = 959.5;
/// Colour camera principal point Y (pixels)
pub const COLOR_CY: f32 = 539.5;

/// Depth readings are millimetres, camera space is metres
pub const DEPTH_UNITS_PER_METRE: f32 = 1000.0;

/// Period between synthetic sensor frames (about 30 Hz)
pub const SYNTHETIC_FRAME_PERIOD_MS: u64 = 33;

/// Value written to the body index frame for pixels without a tracked body
pub const NO_BODY_INDEX: u8 = 0xff;
