//! # Blogicum Shared
//!
//! Wire types for the HTTP API: request bodies, response bodies and
//! RFC 7807 problem details. No server-side dependencies, so clients can
//! reuse them as-is.

pub mod dto;
pub mod response;

pub use response::{ApiResponse, ErrorResponse, FieldErrorResponse, PageResponse};
