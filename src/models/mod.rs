//! Data Models Module
//!
//! Request and response DTOs for the newsletter API.

pub mod requests;
pub mod responses;

pub use requests::NewsletterQuery;
pub use responses::{ClearEntryResponse, ClearProfessionResponse, HealthResponse};
