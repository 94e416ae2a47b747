use std::path::PathBuf;

use thiserror::Error;

/// Coarse classification used by the surfaces to decide how to report a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Credential or settings missing/invalid. Raised before any network call.
    Configuration,
    /// Image missing, unreadable or not a JPEG/PNG. Raised before any network call.
    Input,
    /// The detection API failed or answered with something unusable.
    Upstream,
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("{0} not set")]
    MissingCredential(&'static str),

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("Image not found: {}", .0.display())]
    ImageNotFound(PathBuf),

    #[error("failed to read image {}: {source}", .path.display())]
    ImageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid image: {0}")]
    InvalidImage(String),

    #[error("API error {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("unexpected response from detection API: {0}")]
    UnexpectedResponse(String),

    #[error("request to detection API failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl AnalysisError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingCredential(_) | Self::Configuration(_) => ErrorKind::Configuration,
            Self::ImageNotFound(_) | Self::ImageRead { .. } | Self::InvalidImage(_) => {
                ErrorKind::Input
            }
            Self::Upstream { .. } | Self::UnexpectedResponse(_) | Self::Transport(_) => {
                ErrorKind::Upstream
            }
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(err) if err.is_timeout())
    }
}

pub type Result<T, E = AnalysisError> = std::result::Result<T, E>;
