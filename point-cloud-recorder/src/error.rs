//! Error type shared by the recorder library.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RecorderError>;

#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("no depth sensor available")]
    SensorUnavailable,

    #[error("sensor is not open")]
    SensorNotOpen,

    #[error("sensor failed to open: {0}")]
    SensorOpen(String),

    #[error("cannot {operation} while the session is {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },

    #[error("snapshot {field} has {actual} elements, expected {expected}")]
    SnapshotShape {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("sampling stride must be at least 1")]
    ZeroStride,

    #[error("invalid PLY at line {line}: {message}")]
    Ply { line: usize, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl RecorderError {
    pub(crate) fn ply(line: usize, message: impl Into<String>) -> Self {
        Self::Ply {
            line,
            message: message.into(),
        }
    }
}
