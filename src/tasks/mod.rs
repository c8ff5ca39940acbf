//! Background Tasks Module
//!
//! - Expiry sweep: removes expired newsletters from the in-memory backend

mod cleanup;

pub use cleanup::spawn_cleanup_task;
