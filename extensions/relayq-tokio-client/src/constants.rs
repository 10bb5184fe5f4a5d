/// Routing key of the shared work queue requests are published to.
pub const DEFAULT_WORK_QUEUE: &str = "rpc_queue";
