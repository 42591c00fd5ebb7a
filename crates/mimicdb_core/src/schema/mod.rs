//! Schema declarations and the durable settings registry.

mod options;
mod registry;
mod trigger;

pub use options::{CascadeType, StoreOptions};
pub use registry::{IndexCleanup, PendingMutations, SchemaRegistry, Settings};
pub use trigger::{RequestContext, RuleSource, Trigger, TriggerRule};
