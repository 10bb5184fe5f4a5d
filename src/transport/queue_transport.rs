use crate::reply::ReplyFragment;
use crate::transport::TransportError;

/// Callback a transport invokes once per delivery arriving on the session's
/// reply address. Transports must invoke it serially; fragment ordering and
/// reassembly are handled above this seam.
pub type DeliveryHandler = Box<dyn FnMut(ReplyFragment) + Send>;

/// Minimal queue-broker surface the RPC layer needs. Implementations adapt a
/// concrete broker; the core stays free of any I/O or runtime choice.
///
/// A transport is expected to:
/// - deliver requests published via [`QueueTransport::publish`] to the shared
///   work queue, stamped with the given correlation id and reply address, and
/// - feed every message arriving on the subscribed reply address to the
///   registered [`DeliveryHandler`], in arrival order, one at a time.
///
/// Arrival order is allowed to differ from fragment sequence order. Nothing
/// here requires it to be monotonic.
pub trait QueueTransport {
    /// Publishes one request to the shared work queue.
    ///
    /// `correlation_id` and `reply_to` travel with the message so the remote
    /// worker knows where to address its reply fragments.
    fn publish(
        &self,
        correlation_id: &str,
        reply_to: &str,
        payload: &[u8],
    ) -> Result<(), TransportError>;

    /// Begins consuming the private reply address, handing each delivery to
    /// `on_delivery`. Called once per session, before the first publish.
    fn subscribe(&self, reply_to: &str, on_delivery: DeliveryHandler) -> Result<(), TransportError>;

    /// Releases broker resources. Idempotent; deliveries may still be in
    /// flight when this returns.
    fn close(&self);
}
