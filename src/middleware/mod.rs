mod auth;
mod error_handler;

pub use auth::{API_KEY_HEADER, api_key_guard};
pub use error_handler::log_errors;
