/// One delivery arriving on a session's reply address.
///
/// A reply is a sequence of fragments sharing a correlation id. The sender
/// numbers payload fragments from zero; the broker is free to deliver them in
/// any order. A single fragment may carry any combination of payload, prompt
/// update and close marker, including all three at once.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplyFragment {
    /// Token copied from the originating request.
    pub correlation_id: String,
    /// Position of the payload within the reply, counted from
    /// [`REPLY_SEQ_START`](crate::constants::REPLY_SEQ_START). Ignored when
    /// `body` is absent.
    pub seq: u64,
    /// Response bytes. Absent on control-only fragments.
    pub body: Option<Vec<u8>>,
    /// Replacement interactive prompt, when the remote end changed it.
    pub prompt: Option<String>,
    /// Marks the reply as complete; no further payload follows.
    pub close: bool,
}
