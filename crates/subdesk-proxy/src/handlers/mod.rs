pub mod forward;
pub mod health;

pub use forward::{forward, log_request};
pub use health::health;
