use std::time::Duration;

/// Idle timeout applied to a reply stream when the caller has no better
/// value. The timer measures the gap between consecutive deliveries, not the
/// total call duration, so a slow multi-part reply stays alive as long as
/// parts keep arriving.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Sequence number carried by the first fragment of every reply.
pub const REPLY_SEQ_START: u64 = 0;
