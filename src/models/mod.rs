//! Data models for the snippet backend.
//!
//! Field names serialize as camelCase for the web client.

mod favorite;
mod revision;
mod snippet;
mod tag;

pub use favorite::*;
pub use revision::*;
pub use snippet::*;
pub use tag::*;
