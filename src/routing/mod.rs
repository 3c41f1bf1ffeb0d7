//! Routing module
//!
//! Turns inbound events into operations:
//! - Event shape normalization (HTTP-style and REST-style)
//! - Stage prefix stripping
//! - Method and path matching against an ordered rule table

mod event;
mod matcher;

pub use event::Event;
pub use matcher::{resolve, Route};
