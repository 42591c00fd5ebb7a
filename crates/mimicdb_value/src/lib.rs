//! # MimicDB Value
//!
//! JSON value utilities shared by the MimicDB engine and coordinators:
//!
//! - Dot-path resolution into nested objects (`a.b.c`)
//! - Internal tag handling (`__pkey__`, `__store__`)
//! - Identity derivation from primary-key property values
//! - Deterministic value ordering for sorting and index keys

mod compare;
mod identity;
mod path;
mod tags;

pub use compare::compare_values;
pub use identity::derive_identity;
pub use path::{remove_at_path, resolve_path, resolve_path_mut, set_at_path};
pub use tags::{is_tagged_entity, scalar_to_key, strip_tags, tag_entity, PKEY, STORE_TAG};
