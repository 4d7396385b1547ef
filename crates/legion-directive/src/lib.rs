//! Legion directives
//!
//! Directives are the work orders exchanged between the head and the
//! factories of a load-testing cluster. This crate defines their shapes, the
//! feedback emitted while they are consumed, and the local registry that
//! guarantees their consumption semantics.
//!
//! # Directive shapes
//!
//! | Shape        | Stored | Consumption                               |
//! |--------------|--------|-------------------------------------------|
//! | Descriptive  | no     | carried inline                            |
//! | Single-use   | yes    | one `read`, then gone                     |
//! | Queue        | yes    | FIFO `pop`, each value once, gone when empty |
//! | List         | yes    | `list` any number of times                |
//!
//! # Example
//!
//! ```rust,ignore
//! use legion_directive::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let (producer, mut feedback) = ChannelFeedbackProducer::new();
//! let registry = DirectiveRegistry::new(Arc::new(producer));
//!
//! let queue = QueueDirective::new(["m-1", "m-2"]);
//! let reference = queue.to_reference();
//! registry.save(queue).await;
//!
//! assert_eq!(registry.pop(&reference).await, Some("m-1"));
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod directive;
pub mod error;
pub mod feedback;
pub mod key;
pub mod registry;

pub use config::RegistryConfig;
pub use directive::{
    DescriptiveDirective, Directive, ListDirective, ListReference, QueueDirective,
    QueueReference, SingleUseDirective, SingleUseReference,
};
pub use error::DirectiveError;
pub use feedback::{ChannelFeedbackProducer, DirectiveFeedback, FeedbackProducer, FeedbackStatus};
pub use key::{DirectiveKey, IdGenerator, UlidGenerator};
pub use registry::{DirectiveRegistry, RegistryStats};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for producing and consuming directives
    pub use crate::directive::{
        DescriptiveDirective, Directive, ListDirective, ListReference, QueueDirective,
        QueueReference, SingleUseDirective, SingleUseReference,
    };
    pub use crate::feedback::{ChannelFeedbackProducer, DirectiveFeedback, FeedbackProducer, FeedbackStatus};
    pub use crate::key::{DirectiveKey, IdGenerator, UlidGenerator};
    pub use crate::registry::DirectiveRegistry;
}
