//! Ownership labels for consumer groups.
//!
//! A [`LabelResolver`] is built from a JSON document mapping consumer-group
//! prefixes to owner tags. It resolves group ids by longest matching prefix and
//! keeps recent answers in a [`SlidingCache`] whose entries are renewed on every
//! hit and swept in the background once they expire.
pub use cache::{CacheEntry, SlidingCache};
pub use compiler::{CompiledRules, Diagnostic, compile_rules};
pub use error::LabelError;
pub use models::{NotifierSpec, OWNER_TAG_PREFIX, Rule};
pub use prefix_table::PrefixTable;
pub use resolver::LabelResolver;
pub use schema::{SchemaNode, Violation, config_schema, validate_config};
pub use settings::CacheSettings;

mod cache;
mod compiler;
mod error;
pub mod metrics;
mod models;
mod prefix_table;
mod resolver;
mod schema;
mod settings;

#[cfg(test)]
mod tests;
