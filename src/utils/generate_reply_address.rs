use uuid::Uuid;

/// Generates a private reply-queue name for one session, mirroring the
/// server-generated exclusive queues of AMQP brokers.
pub fn generate_reply_address() -> String {
    format!("reply.{}", Uuid::new_v4())
}
