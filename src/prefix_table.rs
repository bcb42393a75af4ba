use std::cmp::Reverse;

use crate::models::Rule;

/// Immutable prefix-to-label table.
///
/// When several prefixes match one group id, the longest prefix wins. Prefixes
/// are unique, so the result is always deterministic.
#[derive(Debug, Clone, Default)]
pub struct PrefixTable {
    /// Rules in declaration order.
    rules: Vec<Rule>,
    /// Indices into `rules`, longest prefix first.
    by_length: Vec<usize>,
}

impl PrefixTable {
    pub(crate) fn new(rules: Vec<Rule>) -> Self {
        let mut by_length: Vec<usize> = (0..rules.len()).collect();
        // Stable sort keeps declaration order among equal lengths.
        by_length.sort_by_key(|&i| Reverse(rules[i].prefix.len()));
        PrefixTable { rules, by_length }
    }

    /// Find the rule with the longest prefix that `group_id` starts with.
    pub fn lookup(&self, group_id: &str) -> Option<&Rule> {
        self.by_length
            .iter()
            .map(|&i| &self.rules[i])
            .find(|rule| rule.matches(group_id))
    }

    /// The label registered for exactly this prefix.
    pub fn label_for(&self, prefix: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|rule| rule.prefix == prefix)
            .map(|rule| rule.label.as_str())
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
