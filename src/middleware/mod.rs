pub mod credentials;
pub mod request_log;

pub use credentials::{session_token_from_parts, ResolvedJira, SessionToken};
pub use request_log::request_log_middleware;
