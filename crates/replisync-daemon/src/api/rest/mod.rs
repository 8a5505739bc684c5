//! REST API over the resource store and controller

pub mod handlers;
pub mod router;
pub mod state;
