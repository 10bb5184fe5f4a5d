mod call_error;
mod reply_router;
mod rpc_session;

pub use call_error::CallError;
pub use rpc_session::RpcSession;

pub(crate) use reply_router::ReplyRouter;
