use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("scan root {} is not a readable directory: {reason}", path.display())]
    RootNotFound { path: PathBuf, reason: String },
    #[error("invalid exclusion pattern {pattern:?}")]
    InvalidExclusion {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}
