pub mod auth;

pub use auth::{require_admin, resolve_caller, Claims};
