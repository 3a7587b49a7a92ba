//! Terminal renderer
//!
//! Consumes the runtime's broadcast events and redraws; never mutates the
//! conversation store directly.

pub mod markdown;
mod view;

pub use view::ChatApp;
