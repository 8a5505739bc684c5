//! API request handlers

mod events;
mod health;
mod primaries;
mod secondaries;

pub use events::*;
pub use health::*;
pub use primaries::*;
pub use secondaries::*;
