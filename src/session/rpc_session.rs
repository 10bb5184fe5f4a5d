use crate::constants::DEFAULT_CALL_TIMEOUT;
use crate::reply::ReplyStream;
use crate::session::{CallError, ReplyRouter};
use crate::transport::QueueTransport;
use crate::utils::{generate_correlation_id, generate_reply_address};
use std::sync::Arc;
use std::time::Duration;

/// Client endpoint for request/reply calls over a queue broker.
///
/// A session owns one correlation id, one private reply address and one
/// transport subscription for its whole lifetime. Calls are strictly
/// sequential: a new call is refused while the previous reply stream is
/// still open. Prompt updates delivered by one reply carry over to the
/// streams opened by later calls.
pub struct RpcSession<T: QueueTransport> {
    transport: T,
    router: Arc<ReplyRouter>,
    reply_to: String,
}

impl<T: QueueTransport> RpcSession<T> {
    /// Binds a session to `transport` and subscribes its private reply
    /// address.
    pub fn new(transport: T) -> Result<Self, CallError> {
        let router = Arc::new(ReplyRouter::new(generate_correlation_id()));
        let reply_to = generate_reply_address();

        let dispatch = Arc::clone(&router);
        transport.subscribe(
            &reply_to,
            Box::new(move |fragment| dispatch.dispatch(fragment)),
        )?;

        Ok(Self {
            transport,
            router,
            reply_to,
        })
    }

    /// Publishes `payload` as a request and opens the stream for its reply.
    ///
    /// `idle_timeout` bounds the gap between consecutive reply parts, not
    /// the total call duration.
    pub fn call(&self, payload: Vec<u8>, idle_timeout: Duration) -> Result<ReplyStream, CallError> {
        self.router.open_stream(idle_timeout, || {
            self.transport
                .publish(self.router.correlation_id(), &self.reply_to, &payload)
        })
    }

    /// [`RpcSession::call`] with [`DEFAULT_CALL_TIMEOUT`].
    pub fn call_with_default_timeout(&self, payload: Vec<u8>) -> Result<ReplyStream, CallError> {
        self.call(payload, DEFAULT_CALL_TIMEOUT)
    }

    pub fn correlation_id(&self) -> &str {
        self.router.correlation_id()
    }

    pub fn reply_address(&self) -> &str {
        &self.reply_to
    }

    /// Most recent prompt delivered on this session, surviving across calls.
    pub fn prompt(&self) -> Option<String> {
        self.router.active_prompt()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Closes the transport and force-closes any open reply stream, waking
    /// a blocked consumer.
    pub fn close(&self) {
        self.transport.close();
        self.router.force_close_active();
    }
}

impl<T: QueueTransport> Drop for RpcSession<T> {
    fn drop(&mut self) {
        self.close();
    }
}
