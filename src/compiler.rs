//! Compilation of validated notifiers into a [`PrefixTable`].
//!
//! Tie-break rules:
//!
//! * within one notifier the last `owner:` tag wins;
//! * across notifiers the first notifier to declare a prefix owns it, later
//!   declarations are dropped.
//!
//! Neither case is fatal. Each produces a [`Diagnostic`] that is logged and
//! handed back to the caller.

use std::collections::HashMap;
use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::{NotifierSpec, OWNER_TAG_PREFIX, Rule};
use crate::prefix_table::PrefixTable;

/// A non-fatal problem found while compiling rules.
///
/// `notifier` is the zero-based position of the notifier in the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    UnsupportedTag {
        notifier: usize,
        tag: String,
    },
    DuplicatePrefix {
        notifier: usize,
        prefix: String,
        kept_label: String,
    },
    MissingOwner {
        notifier: usize,
        prefix: String,
    },
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Diagnostic::UnsupportedTag { notifier, tag } => write!(
                f,
                "notifier {notifier}: tag '{tag}' is not supported for consumer group labels"
            ),
            Diagnostic::DuplicatePrefix {
                notifier,
                prefix,
                kept_label,
            } => write!(
                f,
                "notifier {notifier}: prefix '{prefix}' was already declared with label '{kept_label}', skipping"
            ),
            Diagnostic::MissingOwner { notifier, prefix } => write!(
                f,
                "notifier {notifier}: no owner tag, prefix '{prefix}' gets no label"
            ),
        }
    }
}

/// Output of [`compile_rules`].
#[derive(Debug, Clone, Default)]
pub struct CompiledRules {
    pub table: PrefixTable,
    pub diagnostics: Vec<Diagnostic>,
}

/// Build the prefix table from notifiers in document order.
pub fn compile_rules(notifiers: &[NotifierSpec]) -> CompiledRules {
    let mut rules: Vec<Rule> = Vec::new();
    // prefix -> index in `rules`
    let mut declared: HashMap<&str, usize> = HashMap::new();
    let mut diagnostics = Vec::new();

    for (index, notifier) in notifiers.iter().enumerate() {
        let mut owner: Option<&str> = None;
        for tag in &notifier.tags {
            match owner_label(tag) {
                Some(label) => owner = Some(label),
                None => {
                    warn!(
                        event = "CompileRules",
                        phase = "UnsupportedTag",
                        notifier = index,
                        tag = %tag
                    );
                    diagnostics.push(Diagnostic::UnsupportedTag {
                        notifier: index,
                        tag: tag.clone(),
                    });
                }
            }
        }

        for prefix in &notifier.match_prefixes {
            if let Some(&existing) = declared.get(prefix.as_str()) {
                let kept_label = rules[existing].label.clone();
                warn!(
                    event = "CompileRules",
                    phase = "DuplicatePrefix",
                    notifier = index,
                    prefix = %prefix,
                    kept_label = %kept_label
                );
                diagnostics.push(Diagnostic::DuplicatePrefix {
                    notifier: index,
                    prefix: prefix.clone(),
                    kept_label,
                });
                continue;
            }

            let Some(label) = owner else {
                warn!(
                    event = "CompileRules",
                    phase = "MissingOwner",
                    notifier = index,
                    prefix = %prefix
                );
                diagnostics.push(Diagnostic::MissingOwner {
                    notifier: index,
                    prefix: prefix.clone(),
                });
                continue;
            };

            declared.insert(prefix.as_str(), rules.len());
            rules.push(Rule::new(prefix.as_str(), label));
        }
    }

    CompiledRules {
        table: PrefixTable::new(rules),
        diagnostics,
    }
}

fn owner_label(tag: &str) -> Option<&str> {
    tag.strip_prefix(OWNER_TAG_PREFIX)
        .filter(|label| !label.is_empty())
}
