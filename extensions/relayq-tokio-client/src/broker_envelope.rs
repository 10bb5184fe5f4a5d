use relayq::reply::ReplyFragment;
use serde::{Deserialize, Serialize};

/// Wrapper published to the gateway for each request. The gateway unwraps it,
/// enqueues `body` on `queue`, and remembers `reply_to` so it can route the
/// worker's reply fragments back over this connection.
#[derive(Debug, Serialize)]
pub struct PublishEnvelope<'a> {
    pub queue: &'a str,
    pub correlation_id: &'a str,
    pub reply_to: &'a str,
    /// Request payload. The gateway carries bodies as JSON text.
    pub body: &'a str,
}

/// One reply fragment as the gateway frames it. Only `correlation_id` is
/// required on the wire; everything else defaults to an empty control
/// fragment.
#[derive(Debug, Deserialize)]
pub struct ReplyEnvelope {
    pub correlation_id: String,
    /// Sequence number of `data` within the reply.
    #[serde(default)]
    pub packnum: u64,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub close: bool,
}

impl ReplyEnvelope {
    pub fn into_fragment(self) -> ReplyFragment {
        ReplyFragment {
            correlation_id: self.correlation_id,
            seq: self.packnum,
            body: self.data.map(String::into_bytes),
            prompt: self.prompt,
            close: self.close,
        }
    }
}
