pub mod constants;
pub mod html_truncate;
pub mod string_utils;
pub mod timeout;
pub mod url_utils;

pub use constants::*;
pub use html_truncate::truncate_html;
pub use timeout::{new_request_id, with_timeout};
pub use url_utils::{cache_host, is_valid_url, normalize_cache_key};
