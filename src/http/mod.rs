//! HTTP protocol layer module
//!
//! Protocol-level helpers shared by the static file server and the JSON
//! endpoints, decoupled from either.

pub mod mime;
pub mod response;

// Re-export commonly used types
pub use response::{
    build_403_response, build_404_response, build_405_response, build_file_response,
    build_options_response, with_cors,
};
