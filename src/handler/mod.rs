//! Request handler module
//!
//! The front door: routes each request to the JSON endpoints or to static
//! file serving.

pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::{handle_request, route_request};
