pub mod auth;
pub mod request_tracking;

pub use request_tracking::{REQUEST_ID_HEADER, extract_request_id, request_tracking_middleware};
