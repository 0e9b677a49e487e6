use core::fmt;
use std::io;

/// Error decoding a validated frame into a report. Recoverable: the caller
/// counts or logs it and moves on to the next frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// No decoder is registered for this (class, ID) pair, or the payload is
    /// shorter than the kind requires.
    UnsupportedMessage { class: u8, id: u8 },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::UnsupportedMessage { class, id } => write!(
                f,
                "unsupported message, class {class:#04x}, id {id:#04x}"
            ),
        }
    }
}

impl std::error::Error for DecodeError {}

/// Transport-level failure. Fatal to the read loop: `StreamPipeline::run`
/// returns it to the caller and stops.
#[derive(Debug)]
pub enum StreamError {
    /// The transport reported that access to the device was lost or denied.
    PermissionDenied,
    Io(io::Error),
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::PermissionDenied => f.write_str("transport permission denied"),
            StreamError::Io(e) => write!(f, "transport I/O error: {e}"),
        }
    }
}

impl std::error::Error for StreamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StreamError::Io(e) => Some(e),
            StreamError::PermissionDenied => None,
        }
    }
}

impl From<io::Error> for StreamError {
    fn from(error: io::Error) -> Self {
        StreamError::Io(error)
    }
}
