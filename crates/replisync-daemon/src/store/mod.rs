//! Resource store layer for replisync-daemon
//!
//! The reconciler only sees the traits; `InMemoryStore` backs the daemon and
//! the tests.

mod memory;
mod traits;

pub use memory::InMemoryStore;
pub use traits::{PrimaryStore, ResourceStore, SecondaryStore, StoreResult, WatchSource};
