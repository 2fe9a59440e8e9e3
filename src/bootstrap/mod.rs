pub mod tracing;
pub mod wiring;

pub use wiring::{launch, launch_from_file, spawn, InMemoryHost, RunningController};
