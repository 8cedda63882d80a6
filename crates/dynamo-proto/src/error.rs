//! Protocol-level errors.

use thiserror::Error;
use tokio_util::codec::LinesCodecError;

/// Errors raised while framing or decoding RPC messages.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("frame exceeds {max} bytes")]
    FrameTooLong { max: usize },

    #[error("malformed frame: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<LinesCodecError> for ProtocolError {
    fn from(err: LinesCodecError) -> Self {
        match err {
            LinesCodecError::MaxLineLengthExceeded => Self::FrameTooLong {
                max: crate::codec::MAX_FRAME_LEN,
            },
            LinesCodecError::Io(e) => Self::Io(e),
        }
    }
}
