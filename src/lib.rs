pub mod constants;
pub mod reply;
pub mod session;
pub mod transport;
pub mod utils;
