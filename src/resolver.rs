use std::time::Duration;

use tracing::{debug, info};

use crate::cache::SlidingCache;
use crate::compiler::{CompiledRules, Diagnostic, compile_rules};
use crate::error::LabelError;
use crate::metrics::{self, LookupOutcome, LookupTimer};
use crate::prefix_table::PrefixTable;
use crate::schema::validate_config;
use crate::settings::CacheSettings;

/// Resolves consumer-group ids to owner labels.
///
/// Thread-safe; share it between collectors with an `Arc`. Dropping the
/// resolver stops the cache's background sweeper.
#[derive(Debug)]
pub struct LabelResolver {
    table: PrefixTable,
    cache: SlidingCache,
    ttl: Duration,
    diagnostics: Vec<Diagnostic>,
}

impl LabelResolver {
    /// Validate and compile `config`, then start a cache with the given TTL and
    /// sweep interval.
    ///
    /// No resolver is built if the configuration is rejected.
    ///
    /// ```
    /// use std::time::Duration;
    /// use cg_owner_labels::LabelResolver;
    ///
    /// let config = r#"{"consumer_notifiers": [
    ///     {"when": {"starts_with": ["string1"]}, "set": {"tags": ["owner:fotocasa"]}}
    /// ]}"#;
    /// let resolver = LabelResolver::new(config, Duration::from_secs(60), Duration::from_secs(60)).unwrap();
    /// assert_eq!(resolver.fetch_label("string1-consumer"), "fotocasa");
    /// assert_eq!(resolver.fetch_label("other"), "");
    /// ```
    pub fn new(config: &str, ttl: Duration, cleanup_interval: Duration) -> Result<Self, LabelError> {
        let notifiers = validate_config(config)?;
        let CompiledRules { table, diagnostics } = compile_rules(&notifiers);
        let cache = SlidingCache::new(ttl, cleanup_interval)?;

        info!(
            event = "LabelResolver",
            phase = "Loaded",
            notifiers = notifiers.len(),
            prefixes = table.len(),
            warnings = diagnostics.len(),
            ttl_ms = metrics::as_millis_u64(ttl),
            cleanup_interval_ms = metrics::as_millis_u64(cleanup_interval)
        );

        Ok(LabelResolver {
            table,
            cache,
            ttl,
            diagnostics,
        })
    }

    pub fn from_settings(config: &str, settings: &CacheSettings) -> Result<Self, LabelError> {
        Self::new(config, settings.ttl, settings.cleanup_interval)
    }

    /// The owner label for `group_id`, or an empty string if no prefix applies.
    ///
    /// Cache hits renew the entry's TTL. Unmatched ids are never cached.
    pub fn fetch_label(&self, group_id: &str) -> String {
        let mut timer = LookupTimer::start();

        if let Some(label) = self.cache.get(group_id) {
            debug!(event = "FetchLabel", phase = "CacheHit", group_id, label = %label);
            if !self.cache.renew(group_id, self.ttl) {
                // Expired or swept between the read and the renewal.
                self.cache.set(group_id, label.as_str(), self.ttl);
            }
            timer.finish(LookupOutcome::Hit);
            return label;
        }

        match self.table.lookup(group_id) {
            Some(rule) => {
                debug!(
                    event = "FetchLabel",
                    phase = "PrefixMatch",
                    group_id,
                    prefix = %rule.prefix,
                    label = %rule.label
                );
                self.cache.set(group_id, rule.label.as_str(), self.ttl);
                timer.finish(LookupOutcome::Matched);
                rule.label.clone()
            }
            None => {
                debug!(event = "FetchLabel", phase = "NoMatch", group_id);
                timer.finish(LookupOutcome::Unmatched);
                String::new()
            }
        }
    }

    pub fn prefix_table(&self) -> &PrefixTable {
        &self.table
    }

    pub fn cache(&self) -> &SlidingCache {
        &self.cache
    }

    /// Non-fatal problems found while compiling the configuration.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
