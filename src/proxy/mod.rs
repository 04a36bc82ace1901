//! Proxy relay module
//!
//! Lets the browser UI reach arbitrary HTTP/HTTPS APIs through this server,
//! sidestepping CORS. One call in, one outbound attempt, one structured
//! result out.

mod relay;
mod transport;
mod types;

pub use relay::{prepare, PreparedRequest, ProxyRelay};
pub use types::{
    collect_headers, HeaderValues, ProxyRequest, ProxyResult, RelayError, RelayErrorKind,
    RelayResponse, ResponseBody,
};
