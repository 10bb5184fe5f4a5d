mod broker_envelope;
mod ws_queue_link;

pub mod constants;

pub use broker_envelope::{PublishEnvelope, ReplyEnvelope};
pub use ws_queue_link::WsQueueLink;

use relayq::session::{CallError, RpcSession};

/// Connects to a broker gateway and binds a ready-to-call session routed
/// through the default work queue.
pub async fn connect_session(
    websocket_address: &str,
) -> Result<RpcSession<WsQueueLink>, CallError> {
    let link = WsQueueLink::connect(websocket_address, constants::DEFAULT_WORK_QUEUE).await?;
    RpcSession::new(link)
}
