use relayq::reply::ReplyFragment;
use relayq::session::{CallError, RpcSession};
use relayq::transport::{DeliveryHandler, QueueTransport, TransportError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Broker double that records publishes and lets the test inject deliveries
/// and publish failures.
#[derive(Clone)]
struct MockBroker {
    inner: Arc<MockBrokerInner>,
}

struct MockBrokerInner {
    published: Mutex<Vec<(String, String, Vec<u8>)>>,
    subscribed_to: Mutex<Option<String>>,
    handler: Mutex<Option<DeliveryHandler>>,
    fail_next_publish: AtomicBool,
    closed: AtomicBool,
}

impl MockBroker {
    fn new() -> Self {
        Self {
            inner: Arc::new(MockBrokerInner {
                published: Mutex::new(Vec::new()),
                subscribed_to: Mutex::new(None),
                handler: Mutex::new(None),
                fail_next_publish: AtomicBool::new(false),
                closed: AtomicBool::new(false),
            }),
        }
    }

    fn deliver(&self, fragment: ReplyFragment) {
        if let Some(on_delivery) = self.inner.handler.lock().expect("handler lock").as_mut() {
            on_delivery(fragment);
        }
    }

    fn published(&self) -> Vec<(String, String, Vec<u8>)> {
        self.inner.published.lock().expect("published lock").clone()
    }

    fn subscribed_to(&self) -> Option<String> {
        self.inner
            .subscribed_to
            .lock()
            .expect("subscribed lock")
            .clone()
    }

    fn fail_next_publish(&self) {
        self.inner.fail_next_publish.store(true, Ordering::SeqCst);
    }

    fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }
}

impl QueueTransport for MockBroker {
    fn publish(
        &self,
        correlation_id: &str,
        reply_to: &str,
        payload: &[u8],
    ) -> Result<(), TransportError> {
        if self.inner.fail_next_publish.swap(false, Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        self.inner.published.lock().expect("published lock").push((
            correlation_id.to_string(),
            reply_to.to_string(),
            payload.to_vec(),
        ));
        Ok(())
    }

    fn subscribe(&self, reply_to: &str, on_delivery: DeliveryHandler) -> Result<(), TransportError> {
        *self.inner.subscribed_to.lock().expect("subscribed lock") = Some(reply_to.to_string());
        *self.inner.handler.lock().expect("handler lock") = Some(on_delivery);
        Ok(())
    }

    fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
    }
}

fn closing_part(correlation_id: &str, seq: u64, body: &[u8]) -> ReplyFragment {
    ReplyFragment {
        correlation_id: correlation_id.to_string(),
        seq,
        body: Some(body.to_vec()),
        prompt: None,
        close: true,
    }
}

#[test]
fn binding_subscribes_the_reply_address() {
    let broker = MockBroker::new();
    let session = RpcSession::new(broker.clone()).expect("session bind failed");

    assert_eq!(
        broker.subscribed_to().as_deref(),
        Some(session.reply_address())
    );
}

#[test]
fn call_publishes_correlation_id_reply_address_and_payload() {
    let broker = MockBroker::new();
    let session = RpcSession::new(broker.clone()).expect("session bind failed");

    let _stream = session
        .call(b"uptime".to_vec(), Duration::from_secs(1))
        .expect("call failed");

    let published = broker.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].0, session.correlation_id());
    assert_eq!(published[0].1, session.reply_address());
    assert_eq!(published[0].2, b"uptime");
}

#[test]
fn second_call_while_reply_open_is_refused() {
    let broker = MockBroker::new();
    let session = RpcSession::new(broker.clone()).expect("session bind failed");

    let _open = session
        .call(b"first".to_vec(), Duration::from_secs(1))
        .expect("first call failed");

    let err = session
        .call(b"second".to_vec(), Duration::from_secs(1))
        .expect_err("second call accepted while first reply open");
    assert!(matches!(err, CallError::InFlight));

    // The refused call must not have reached the broker.
    assert_eq!(broker.published().len(), 1);
}

#[test]
fn session_is_reusable_after_the_reply_closes() {
    let broker = MockBroker::new();
    let session = RpcSession::new(broker.clone()).expect("session bind failed");
    let correlation_id = session.correlation_id().to_string();

    let first = session
        .call(b"first".to_vec(), Duration::from_secs(1))
        .expect("first call failed");
    broker.deliver(closing_part(&correlation_id, 0, b"done"));
    assert_eq!(first.single_result().expect("first reply failed"), b"done");

    let second = session
        .call(b"second".to_vec(), Duration::from_secs(1))
        .expect("second call refused after first closed");
    broker.deliver(closing_part(&correlation_id, 0, b"done again"));
    assert_eq!(
        second.single_result().expect("second reply failed"),
        b"done again"
    );

    assert_eq!(broker.published().len(), 2);
}

#[test]
fn failed_publish_keeps_the_session_callable() {
    let broker = MockBroker::new();
    let session = RpcSession::new(broker.clone()).expect("session bind failed");
    let correlation_id = session.correlation_id().to_string();

    broker.fail_next_publish();
    let err = session
        .call(b"lost".to_vec(), Duration::from_secs(1))
        .expect_err("publish failure not surfaced");
    assert!(matches!(err, CallError::Transport(TransportError::Closed)));

    // The failed attempt must not occupy the in-flight slot.
    let retry = session
        .call(b"retry".to_vec(), Duration::from_secs(1))
        .expect("session stuck after failed publish");
    broker.deliver(closing_part(&correlation_id, 0, b"recovered"));
    assert_eq!(
        retry.single_result().expect("retry reply failed"),
        b"recovered"
    );
}

#[test]
fn prompt_carries_over_to_the_next_call() {
    let broker = MockBroker::new();
    let session = RpcSession::new(broker.clone()).expect("session bind failed");
    let correlation_id = session.correlation_id().to_string();

    let first = session
        .call(b"use db1".to_vec(), Duration::from_secs(1))
        .expect("first call failed");
    let mut fragment = closing_part(&correlation_id, 0, b"switched");
    fragment.prompt = Some("db1> ".to_string());
    broker.deliver(fragment);
    first.single_result().expect("first reply failed");

    assert_eq!(session.prompt(), Some("db1> ".to_string()));

    // The next stream starts out with the inherited prompt before any of
    // its own fragments arrive.
    let second = session
        .call(b"select 1".to_vec(), Duration::from_secs(1))
        .expect("second call failed");
    assert_eq!(second.prompt(), Some("db1> ".to_string()));
}

#[test]
fn foreign_correlation_ids_are_ignored() {
    let broker = MockBroker::new();
    let session = RpcSession::new(broker.clone()).expect("session bind failed");
    let correlation_id = session.correlation_id().to_string();

    let stream = session
        .call(b"mine".to_vec(), Duration::from_secs(1))
        .expect("call failed");

    broker.deliver(closing_part("someone-else", 0, b"not yours"));
    broker.deliver(closing_part(&correlation_id, 0, b"yours"));

    assert_eq!(stream.single_result().expect("reply failed"), b"yours");
}

#[test]
fn fragments_with_no_call_outstanding_are_dropped() {
    let broker = MockBroker::new();
    let session = RpcSession::new(broker.clone()).expect("session bind failed");
    let correlation_id = session.correlation_id().to_string();

    // A stray delivery before any call must not wedge the session.
    broker.deliver(closing_part(&correlation_id, 0, b"stray"));

    let stream = session
        .call(b"real".to_vec(), Duration::from_secs(1))
        .expect("call failed");
    broker.deliver(closing_part(&correlation_id, 0, b"real reply"));
    assert_eq!(stream.single_result().expect("reply failed"), b"real reply");
}

#[test]
fn close_shuts_the_transport() {
    let broker = MockBroker::new();
    let session = RpcSession::new(broker.clone()).expect("session bind failed");

    session.close();
    assert!(broker.is_closed());
}

#[test]
fn dropping_the_session_shuts_the_transport() {
    let broker = MockBroker::new();
    {
        let _session = RpcSession::new(broker.clone()).expect("session bind failed");
    }
    assert!(broker.is_closed());
}
