/// Maximum number of raw frames buffered during one recording
pub const MAX_FRAMES: usize = 1000;

/// Clouds with this many vertices or fewer are dropped as capture noise
pub const MIN_POINTS: usize = 10_000;

/// Depth pixel sampling step, 1 is 512x424, 2 is 256x212, etc.
pub const STRIDE: usize = 4;

/// Minimum time between two admitted frames (soft cap around 24 fps)
pub const THROTTLE_INTERVAL_MS: u64 = 41;

/// Size of one BGRA colour pixel
pub const BYTES_PER_PIXEL: usize = 4;
