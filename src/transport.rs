mod queue_transport;
mod transport_error;

pub use queue_transport::{DeliveryHandler, QueueTransport};
pub use transport_error::TransportError;
