//! In-memory host platform.
//!
//! 内存版的宿主平台实现，供测试和本地运行使用。
//!
//! [`InMemoryStore`] owns the records and fires change notifications through
//! its [`InMemoryChangeNotifier`] on every mutation, so a controller wired to
//! both sees the same live-update behavior as against a real backend.

mod actions;
mod constraint;
mod data_source;
mod images;
mod notifier;
mod store;

pub use actions::{ActionInvocation, RecordingActions};
pub use data_source::InMemoryDataSource;
pub use images::InMemoryMarkerImages;
pub use notifier::InMemoryChangeNotifier;
pub use store::{InMemoryStore, ProcedureFn};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a mutex, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
