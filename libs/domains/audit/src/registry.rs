use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{AuditError, Result};
use crate::rule::AuditRule;

/// Immutable set of audit rules, indexed by name and by category.
///
/// Built once and shared read-only behind an `Arc`.
#[derive(Clone, Default)]
pub struct RuleRegistry {
    rules: BTreeMap<String, Arc<dyn AuditRule>>,
    categories: BTreeMap<String, Vec<Arc<dyn AuditRule>>>,
}

impl RuleRegistry {
    /// Build the registry, rejecting duplicate rule names.
    ///
    /// Within a category, rules keep their registration order.
    pub fn new(rules: Vec<Arc<dyn AuditRule>>) -> Result<Self> {
        let mut registry = Self::default();

        for rule in rules {
            let name = rule.name().to_string();
            if registry.rules.contains_key(&name) {
                return Err(AuditError::DuplicateRule(name));
            }

            registry
                .categories
                .entry(rule.category().to_string())
                .or_default()
                .push(Arc::clone(&rule));
            registry.rules.insert(name, rule);
        }

        Ok(registry)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn AuditRule>> {
        self.rules.get(name)
    }

    pub fn category(&self, category: &str) -> Option<&[Arc<dyn AuditRule>]> {
        self.categories.get(category).map(Vec::as_slice)
    }

    /// Every rule, in name order
    pub fn rules(&self) -> impl Iterator<Item = &Arc<dyn AuditRule>> {
        self.rules.values()
    }

    /// Every category with its rules, in category name order
    pub fn categories(&self) -> impl Iterator<Item = (&str, &[Arc<dyn AuditRule>])> {
        self.categories
            .iter()
            .map(|(category, rules)| (category.as_str(), rules.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
