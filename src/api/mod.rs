//! API Module
//!
//! HTTP handlers and routing for the newsletter service.
//!
//! # Endpoints
//! - `GET /newsletter/:profession?period=` - Fetch or generate a newsletter
//! - `DELETE /cache/:profession` - Clear a profession's newsletters
//! - `DELETE /cache/:profession/:period` - Clear one newsletter
//! - `GET /stats` - Store statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
