mod generate_correlation_id;
mod generate_reply_address;

pub use generate_correlation_id::generate_correlation_id;
pub use generate_reply_address::generate_reply_address;
