// API module entry
// JSON endpoints used by the docs UI: health, proxy relay, editor saves and
// shared header config

mod handlers;
mod response;
mod types;

pub use handlers::{
    handle_get_config, handle_health, handle_proxy, handle_save_api, handle_save_config,
    handle_update_index,
};
pub use response::{bad_request, error_response, json_response, payload_too_large};
