//! Portfolio data synchronization.
//!
//! Reads project data from the portfolio backend, falls back to a built-in
//! dataset when the backend is unreachable, validates edits before they are
//! sent, and queues contact messages on the device when they cannot be delivered.

pub mod client;
pub mod config;
pub mod db;
pub mod errors;
pub mod mock;
pub mod models;
pub mod source;
pub mod sync;

pub use client::RemoteClient;
pub use config::Config;
pub use errors::{Advisory, SyncError};
pub use sync::{DetailsForm, Origin, ProjectForm, Sourced, SyncService, ViewScope};

#[cfg(test)]
mod tests;
