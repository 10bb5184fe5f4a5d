use crate::transport::TransportError;
use std::fmt;

/// Represents errors raised when binding a session or issuing a call.
#[derive(Debug)]
pub enum CallError {
    /// A previous call on this session still has an open reply stream.
    InFlight,
    /// The transport failed to publish the request or subscribe the reply
    /// address.
    Transport(TransportError),
}

impl fmt::Display for CallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallError::InFlight => write!(f, "a call is already in flight on this session"),
            CallError::Transport(e) => write!(f, "transport error: {}", e),
        }
    }
}

impl std::error::Error for CallError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CallError::Transport(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TransportError> for CallError {
    fn from(e: TransportError) -> Self {
        CallError::Transport(e)
    }
}
