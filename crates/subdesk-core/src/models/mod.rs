//! Data models for the vendor API
//!
//! These mirror entities owned by the vendor. Decoding is lenient: id and
//! name fields accept the alternative spellings seen across endpoints.

mod lenient;
mod plan;
mod resource;
mod status;
mod subscription;
mod user;

pub use plan::*;
pub use resource::*;
pub use status::*;
pub use subscription::*;
pub use user::*;
