//! # ms-infra
//!
//! Infrastructure adapters for MapSync.
//!
//! - [`memory`]: an in-process backend (record store, change notifier, marker
//!   images, action recorder) implementing every port of `ms-core`.
//! - [`config`]: loading container configuration from TOML files.

pub mod config;
pub mod memory;

pub use config::FileMapsConfigRepository;
pub use memory::{
    InMemoryChangeNotifier, InMemoryDataSource, InMemoryMarkerImages, InMemoryStore,
    RecordingActions,
};
