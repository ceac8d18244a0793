use thiserror::Error;

/// Application-specific errors for the CLI
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{errors} of {total} date(s) failed: {dates}")]
    BatchFailed {
        errors: usize,
        total: usize,
        dates: String,
    },

    #[error(transparent)]
    Mask(#[from] swotmask::Error),
}
