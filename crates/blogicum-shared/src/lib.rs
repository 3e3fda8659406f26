//! # Blogicum Shared
//!
//! Wire types of the HTTP API: validated request bodies, view models and the
//! standard response envelopes.

pub mod dto;
pub mod response;

pub use response::{ApiResponse, ErrorResponse};
