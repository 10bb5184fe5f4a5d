use crate::reply::{ReplyError, ReplyFragment};
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

/// Reassembly buffer and consumer handle for the reply to one call.
///
/// Fragments pushed by the transport may arrive in any order. The stream
/// holds early arrivals back and releases payloads strictly by sequence
/// number, so consumers always observe the order the sender produced.
///
/// ### Behavior Summary:
/// - A payload fragment matching the next expected sequence is released
///   immediately, together with any parked run it completes.
/// - A payload fragment beyond the next expected sequence is parked until
///   the gap before it fills.
/// - Duplicate sequence numbers are discarded.
/// - A close marker ends the stream at once. Parked fragments still gapped
///   at that point are dropped; delivery of already released payloads is
///   unaffected.
///
/// The stream is consumed exactly once, through [`ReplyStream::results`] or
/// [`ReplyStream::single_result`].
#[derive(Debug)]
pub struct ReplyStream {
    shared: Arc<ReplyStreamShared>,
    idle_timeout: Duration,
    opened_at: Instant,
}

/// State shared between the consumer and the transport's dispatch path.
/// Producers push under the mutex and signal the condvar; the consumer
/// blocks on the condvar instead of polling.
#[derive(Debug)]
pub(crate) struct ReplyStreamShared {
    state: Mutex<ReplyStreamState>,
    arrived: Condvar,
}

#[derive(Debug)]
struct ReplyStreamState {
    next_seq: u64,                     // Lowest sequence not yet released in order
    held_back: BTreeMap<u64, Vec<u8>>, // Early arrivals waiting for their gap to fill
    ready: VecDeque<Vec<u8>>,          // Released payloads awaiting the consumer
    prompt: Option<String>,
    closed: bool,
}

impl ReplyStreamState {
    fn mark_closed(&mut self) {
        self.closed = true;
        if !self.held_back.is_empty() {
            tracing::warn!(
                "Reply closed with {} parked parts never released",
                self.held_back.len()
            );
            self.held_back.clear();
        }
    }
}

impl ReplyStreamShared {
    fn new(prompt: Option<String>) -> Self {
        Self {
            state: Mutex::new(ReplyStreamState {
                next_seq: crate::constants::REPLY_SEQ_START,
                held_back: BTreeMap::new(),
                ready: VecDeque::new(),
                prompt,
                closed: false,
            }),
            arrived: Condvar::new(),
        }
    }

    /// Feeds one fragment into the reassembly buffer and wakes the consumer.
    ///
    /// Payload, prompt and close are applied in that order, so a fragment
    /// carrying all three releases its payload before the stream closes.
    pub(crate) fn push(&self, fragment: ReplyFragment) {
        let mut guard = self.state.lock().expect("reply state lock poisoned");
        let state = &mut *guard;

        if state.closed {
            tracing::debug!("Fragment {} arrived after close; discarded", fragment.seq);
            return;
        }

        if let Some(body) = fragment.body {
            if fragment.seq == state.next_seq {
                state.ready.push_back(body);
                state.next_seq += 1;

                // Release the parked run this fragment just completed.
                while let Some(parked) = state.held_back.remove(&state.next_seq) {
                    state.ready.push_back(parked);
                    state.next_seq += 1;
                }
            } else if fragment.seq < state.next_seq || state.held_back.contains_key(&fragment.seq) {
                tracing::warn!("Duplicate reply fragment {} discarded", fragment.seq);
            } else {
                state.held_back.insert(fragment.seq, body);
            }
        }

        if let Some(prompt) = fragment.prompt {
            state.prompt = Some(prompt);
        }

        if fragment.close {
            state.mark_closed();
        }

        drop(guard);
        self.arrived.notify_all();
    }

    /// Closes the stream locally, without a close marker from the remote.
    pub(crate) fn force_close(&self) {
        let mut guard = self.state.lock().expect("reply state lock poisoned");
        if !guard.closed {
            guard.mark_closed();
        }
        drop(guard);
        self.arrived.notify_all();
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.state
            .lock()
            .expect("reply state lock poisoned")
            .closed
    }

    pub(crate) fn prompt(&self) -> Option<String> {
        self.state
            .lock()
            .expect("reply state lock poisoned")
            .prompt
            .clone()
    }
}

impl ReplyStream {
    pub(crate) fn new(idle_timeout: Duration, inherited_prompt: Option<String>) -> Self {
        Self {
            shared: Arc::new(ReplyStreamShared::new(inherited_prompt)),
            idle_timeout,
            opened_at: Instant::now(),
        }
    }

    pub(crate) fn shared(&self) -> Arc<ReplyStreamShared> {
        Arc::clone(&self.shared)
    }

    /// Interactive prompt as of the latest fragment, or the value inherited
    /// from the previous call on the session.
    pub fn prompt(&self) -> Option<String> {
        self.shared.prompt()
    }

    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Consumes the stream, yielding payloads in sequence order.
    ///
    /// Each `next` call blocks until a payload is available, the stream
    /// closes, or the idle timeout elapses with nothing new. The idle clock
    /// starts when the call was issued and resets on every yielded payload,
    /// so a long reply survives as long as parts keep coming.
    pub fn results(self) -> ReplyResults {
        ReplyResults {
            shared: self.shared,
            idle_timeout: self.idle_timeout,
            last_delivery: self.opened_at,
            finished: false,
        }
    }

    /// Consumes the stream expecting exactly one payload part.
    ///
    /// Fails with [`ReplyError::MultiPart`] when more parts follow the first
    /// or the stream has not closed yet, and with [`ReplyError::EmptyReply`]
    /// when the stream closes without any payload.
    pub fn single_result(self) -> Result<Vec<u8>, ReplyError> {
        let shared = Arc::clone(&self.shared);
        let mut results = self.results();

        let first = match results.next() {
            Some(Ok(body)) => body,
            Some(Err(e)) => return Err(e),
            None => return Err(ReplyError::EmptyReply),
        };

        let state = shared.state.lock().expect("reply state lock poisoned");
        if !state.closed || !state.ready.is_empty() {
            return Err(ReplyError::MultiPart);
        }

        Ok(first)
    }
}

/// Blocking iterator over the payload parts of one reply.
///
/// Yields `Ok` payloads in sequence order, then ends after the close marker.
/// An idle timeout yields one `Err` and fuses the iterator; subsequent calls
/// return `None`.
pub struct ReplyResults {
    shared: Arc<ReplyStreamShared>,
    idle_timeout: Duration,
    last_delivery: Instant,
    finished: bool,
}

impl ReplyResults {
    /// Interactive prompt as of the latest fragment. Typically read after
    /// the iterator ends, once the closing fragment has been applied.
    pub fn prompt(&self) -> Option<String> {
        self.shared.prompt()
    }
}

impl Iterator for ReplyResults {
    type Item = Result<Vec<u8>, ReplyError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let mut guard = self.shared.state.lock().expect("reply state lock poisoned");

        loop {
            if let Some(body) = guard.ready.pop_front() {
                self.last_delivery = Instant::now();
                return Some(Ok(body));
            }

            if guard.closed {
                self.finished = true;
                return None;
            }

            let idle = self.last_delivery.elapsed();
            if idle >= self.idle_timeout {
                self.finished = true;
                return Some(Err(ReplyError::IdleTimeout { idle }));
            }

            let (reacquired, _) = self
                .shared
                .arrived
                .wait_timeout(guard, self.idle_timeout - idle)
                .expect("reply state lock poisoned");
            guard = reacquired;
        }
    }
}
