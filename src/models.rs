use serde::{Deserialize, Serialize};

/// Tags starting with this prefix carry the owner label, e.g. `owner:fotocasa`.
pub const OWNER_TAG_PREFIX: &str = "owner:";

/// A notifier from the configuration document, normalized for compilation.
///
/// Prefixes and tags keep their document order; the compiler relies on it for
/// its tie-break rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifierSpec {
    pub match_prefixes: Vec<String>,
    pub tags: Vec<String>,
}

impl NotifierSpec {
    pub fn new<P, T, S, U>(match_prefixes: P, tags: T) -> Self
    where
        P: IntoIterator<Item = S>,
        T: IntoIterator<Item = U>,
        S: Into<String>,
        U: Into<String>,
    {
        NotifierSpec {
            match_prefixes: match_prefixes.into_iter().map(Into::into).collect(),
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }
}

/// A compiled prefix rule: group ids starting with `prefix` belong to `label`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rule {
    pub prefix: String,
    pub label: String,
}

impl Rule {
    pub fn new(prefix: impl Into<String>, label: impl Into<String>) -> Self {
        Rule {
            prefix: prefix.into(),
            label: label.into(),
        }
    }

    pub fn matches(&self, group_id: &str) -> bool {
        group_id.starts_with(&self.prefix)
    }
}

// Wire shape of the configuration document. Only deserialized after the
// document passed schema validation.
#[derive(Debug, Deserialize)]
pub(crate) struct ConfigDocument {
    pub(crate) consumer_notifiers: Vec<NotifierDocument>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NotifierDocument {
    when: WhenClause,
    set: SetClause,
}

#[derive(Debug, Deserialize)]
struct WhenClause {
    starts_with: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SetClause {
    tags: Vec<String>,
}

impl ConfigDocument {
    pub(crate) fn into_notifiers(self) -> Vec<NotifierSpec> {
        self.consumer_notifiers
            .into_iter()
            .map(NotifierSpec::from)
            .collect()
    }
}

impl From<NotifierDocument> for NotifierSpec {
    fn from(doc: NotifierDocument) -> Self {
        NotifierSpec {
            match_prefixes: doc.when.starts_with,
            tags: doc.set.tags,
        }
    }
}
