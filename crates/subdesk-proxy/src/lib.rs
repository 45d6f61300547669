//! CORS forwarding proxy for the vendor API.
//!
//! Browsers cannot call the vendor API directly; this proxy forwards `/api/*`
//! to the configured target and answers with permissive CORS headers.

pub mod handlers;
pub mod setup;
pub mod state;

pub use state::ProxyState;
