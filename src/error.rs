use crate::engine::StackShape;

#[derive(Debug, thiserror::Error)]
pub enum FitError {
    #[error("at least one cell is required")]
    NoCells,
    #[error("cell index {index} out of range for {len} cells")]
    CellIndexOutOfRange { index: usize, len: usize },
    #[error("image stack is empty")]
    EmptyStack,
    #[error("image stack slices differ in size: slice {index} is {actual_width}x{actual_height}, expected {width}x{height}")]
    RaggedStack {
        index: usize,
        width: usize,
        height: usize,
        actual_width: usize,
        actual_height: usize,
    },
    #[error("plane of {width}x{height} needs {expected} values, got {actual}")]
    PlaneSizeMismatch { width: usize, height: usize, expected: usize, actual: usize },
    #[error("real stack has {actual} slices but the configuration expects {expected}")]
    SliceCountMismatch { expected: usize, actual: usize },
    #[error("image stack shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: StackShape, actual: StackShape },
    #[error("trial belongs to frame {trial_frame}, not frame {frame}")]
    ForeignTrial { trial_frame: u64, frame: u64 },
    #[error("trial was proposed at revision {trial} but the frame is at revision {frame}")]
    StaleTrial { trial: u64, frame: u64 },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type FitResult<T> = Result<T, FitError>;
