use std::time::Duration;

use serde::{Deserialize, Serialize};

const DEFAULT_TTL: Duration = Duration::from_secs(60);
const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Cache timings for a [`crate::LabelResolver`].
///
/// Serialized as whole seconds (`ttl_secs`, `cleanup_interval_secs`) so it can
/// sit inside a service's own configuration file. A zero TTL keeps entries
/// forever; a zero cleanup interval disables the background sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(rename = "ttl_secs", with = "secs", default = "default_ttl")]
    pub ttl: Duration,
    #[serde(
        rename = "cleanup_interval_secs",
        with = "secs",
        default = "default_cleanup_interval"
    )]
    pub cleanup_interval: Duration,
}

impl CacheSettings {
    pub fn new(ttl: Duration, cleanup_interval: Duration) -> Self {
        CacheSettings {
            ttl,
            cleanup_interval,
        }
    }

    /// Settings expressed in minutes, the unit the exporter flags use.
    pub fn from_minutes(ttl: u64, cleanup_interval: u64) -> Self {
        CacheSettings::new(
            Duration::from_secs(ttl.saturating_mul(60)),
            Duration::from_secs(cleanup_interval.saturating_mul(60)),
        )
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        CacheSettings::new(DEFAULT_TTL, DEFAULT_CLEANUP_INTERVAL)
    }
}

fn default_ttl() -> Duration {
    DEFAULT_TTL
}

fn default_cleanup_interval() -> Duration {
    DEFAULT_CLEANUP_INTERVAL
}

mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(value.as_secs())
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
