use thiserror::Error;

/// Error kinds surfaced by the detection pipeline and its adapters.
///
/// `Config` and `Io` are fatal at startup. `Format` is recoverable per
/// time step (the step is skipped, the run continues). `Alloc` and
/// `Internal` are always fatal.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("format error: {0}")]
    Format(String),

    #[error("allocation failure")]
    Alloc,

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, DetectError>;
