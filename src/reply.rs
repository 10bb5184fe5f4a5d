mod reply_error;
mod reply_fragment;
mod reply_stream;

pub use reply_error::ReplyError;
pub use reply_fragment::ReplyFragment;
pub use reply_stream::{ReplyResults, ReplyStream};

pub(crate) use reply_stream::ReplyStreamShared;
