//! Telemetry Module
//!
//! Cache event schema and the sinks that receive it.

mod event;
mod sink;

pub use event::{CacheOperationEvent, EventBuilder, MissReason, CACHE_KEY_VERSION};
pub use sink::{NdjsonTelemetry, NullTelemetry, Telemetry, TelemetryError};
