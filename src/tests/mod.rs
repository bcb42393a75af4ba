use std::time::Duration;

use crate::LabelResolver;

mod metrics_integration;

const CONFIG: &str = r#"{
    "consumer_notifiers": [
        {
            "when": {"starts_with": ["string1", "string2"]},
            "set": {"tags": ["owner:fotocasa"]}
        },
        {
            "when": {"starts_with": ["string3", "string4"]},
            "set": {"tags": ["owner:mads"]}
        }
    ]
}"#;

const HOUR: Duration = Duration::from_secs(3600);

fn resolver_from(config: &str) -> LabelResolver {
    LabelResolver::new(config, HOUR, HOUR).expect("config should load")
}
