//! Newsletter Cache - caching gateway for profession-tailored newsletters
//!
//! Serves newsletters from a TTL-bound store, regenerates them on a miss,
//! and supports scoped invalidation. The store is Redis or in-memory and
//! the service degrades to always-generate when neither is reachable.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod gateway;
pub mod generator;
pub mod invalidation;
pub mod models;
pub mod tasks;
pub mod telemetry;

pub use api::AppState;
pub use config::Config;
pub use gateway::{CacheGateway, NewsletterResult, Source};
pub use invalidation::InvalidationManager;
pub use tasks::spawn_cleanup_task;
