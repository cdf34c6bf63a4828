//! Message routing and the append-only conversation log

pub mod message_router;

pub use message_router::MessageRouter;
