use std::fmt;
use std::io;

/// Represents failures raised by a [`QueueTransport`] implementation.
///
/// [`QueueTransport`]: crate::transport::QueueTransport
#[derive(Debug)]
pub enum TransportError {
    /// The underlying broker connection is gone or was never established.
    Closed,
    /// An I/O error occurred while talking to the broker.
    Io(io::Error),
    /// The broker sent something the transport could not make sense of.
    Protocol(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Closed => write!(f, "transport is closed"),
            TransportError::Io(e) => write!(f, "I/O error: {}", e),
            TransportError::Protocol(msg) => write!(f, "protocol error: {}", msg),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransportError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for TransportError {
    fn from(e: io::Error) -> Self {
        TransportError::Io(e)
    }
}
