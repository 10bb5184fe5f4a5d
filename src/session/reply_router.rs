use crate::reply::{ReplyFragment, ReplyStream, ReplyStreamShared};
use crate::session::CallError;
use crate::transport::TransportError;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Routes fragments arriving on the reply address to the one stream a
/// session may have open at a time.
///
/// The slot holding the active stream is guarded by a single mutex. Opening
/// a call takes it to enforce the one-call discipline and swap streams;
/// dispatch takes it to find the push target. No other synchronization
/// exists at the session level.
pub(crate) struct ReplyRouter {
    correlation_id: String,
    active: Mutex<Option<Arc<ReplyStreamShared>>>,
}

impl ReplyRouter {
    pub(crate) fn new(correlation_id: String) -> Self {
        Self {
            correlation_id,
            active: Mutex::new(None),
        }
    }

    pub(crate) fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// Opens the reply stream for a new call, publishing the request while
    /// the slot guard is held.
    ///
    /// Refused while the previous stream is still open. Holding the guard
    /// across `publish` and the slot swap means a reply racing the publish
    /// can never land on the outgoing stream.
    pub(crate) fn open_stream(
        &self,
        idle_timeout: Duration,
        publish: impl FnOnce() -> Result<(), TransportError>,
    ) -> Result<ReplyStream, CallError> {
        let mut active = self.active.lock().expect("active stream slot poisoned");

        if let Some(current) = active.as_ref() {
            if !current.is_closed() {
                return Err(CallError::InFlight);
            }
        }

        let inherited = active.as_ref().and_then(|finished| finished.prompt());
        let stream = ReplyStream::new(idle_timeout, inherited);

        // A failed publish leaves the slot untouched, so the session stays
        // callable.
        publish()?;
        *active = Some(stream.shared());

        Ok(stream)
    }

    /// Hands one arriving fragment to the active stream.
    pub(crate) fn dispatch(&self, fragment: ReplyFragment) {
        if fragment.correlation_id != self.correlation_id {
            tracing::debug!(
                "Fragment for foreign correlation id {} discarded",
                fragment.correlation_id
            );
            return;
        }

        let active = self.active.lock().expect("active stream slot poisoned");
        match active.as_ref() {
            Some(stream) => stream.push(fragment),
            None => tracing::warn!("Reply fragment arrived with no call outstanding; discarded"),
        }
    }

    pub(crate) fn active_prompt(&self) -> Option<String> {
        self.active
            .lock()
            .expect("active stream slot poisoned")
            .as_ref()
            .and_then(|stream| stream.prompt())
    }

    pub(crate) fn force_close_active(&self) {
        let active = self.active.lock().expect("active stream slot poisoned");
        if let Some(stream) = active.as_ref() {
            stream.force_close();
        }
    }
}
