pub mod selector;
pub mod types;

pub use selector::{
    DEFAULT_SELECTOR_FLAG, FLAG_PREFIX, parse_auth_selector, parse_auth_selector_with,
};
pub use types::{AuthMethod, Selector, UnknownMethod};
