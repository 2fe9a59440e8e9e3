//! Resolution use cases, leaf first:
//!
//! ```text
//! MarkerResolver   SourceFetcher
//!        \            /
//!   LocationResolutionPipeline      SubscriptionManager      ActionDispatcher
//!                 \                        |                      /
//!                  +------------ ContainerController ------------+
//! ```

pub mod dispatch_action;
pub mod fetch_source;
pub mod resolve_locations;
pub mod resolve_marker;
pub mod subscriptions;

pub use dispatch_action::ActionDispatcher;
pub use fetch_source::{FetchedLocation, SourceFetcher};
pub use resolve_locations::LocationResolutionPipeline;
pub use resolve_marker::MarkerResolver;
pub use subscriptions::{Generation, GenerationSink, SubscriptionManager};
