//! Local API documentation server.
//!
//! One port serves the docs UI as static files, a JSON store for endpoint
//! definitions edited in the browser, and a relay that forwards "try it"
//! requests to the API under test.

pub mod api;
pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod proxy;
pub mod server;
pub mod store;
