//! Per-entity preparation before summarization.
//!
//! - entity_resolver: meeting domains to a tracked entity name
//! - context: matched notes plus correspondence as one text blob

pub mod context;
pub mod entity_resolver;

pub use context::build_entity_context;
pub use entity_resolver::{resolve_entity_name, resolve_meeting_entity};
