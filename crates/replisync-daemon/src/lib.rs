//! Replisync Daemon library
//!
//! This module provides the core components for the replisync daemon:
//! - Resource store trait and in-memory backend
//! - Sync reconciler and the controller that drives it
//! - REST API handlers
//! - Server lifecycle management

pub mod api;
pub mod config;
pub mod controller;
pub mod error;
pub mod server;
pub mod store;

pub use config::DaemonConfig;
pub use controller::{Controller, CorrelationLabel, ReconcileResult, SyncOutcome, SyncReconciler};
pub use error::{ApiError, DaemonError, ReconcileError, StoreError};
pub use server::Server;
pub use store::{InMemoryStore, ResourceStore};
