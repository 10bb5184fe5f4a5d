use std::fmt;
use std::time::Duration;

/// Represents errors observed while consuming a reply stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyError {
    /// No part arrived within the stream's idle timeout. `idle` is how long
    /// the consumer waited since the last delivery (or since the call was
    /// issued, when nothing arrived at all).
    IdleTimeout { idle: Duration },

    /// A single result was requested but the reply carries more than one
    /// part, or is still open.
    MultiPart,

    /// The reply closed without ever delivering a payload part.
    EmptyReply,
}

impl fmt::Display for ReplyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplyError::IdleTimeout { idle } => {
                write!(f, "reply idle for {:?} without a new part", idle)
            }
            ReplyError::MultiPart => write!(f, "reply contains multiple parts"),
            ReplyError::EmptyReply => write!(f, "reply closed without a result"),
        }
    }
}

impl std::error::Error for ReplyError {}
