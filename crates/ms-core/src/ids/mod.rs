//! ID type wrappers for type safety.

mod id_macro;
pub mod record_id;
pub mod subscription;

pub use record_id::RecordId;
pub use subscription::{GenerationId, SubscriptionHandle};
