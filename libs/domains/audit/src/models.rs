use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One finding produced by a rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub resource_name: String,
    pub region: String,
    #[serde(default)]
    pub details: serde_json::Value,
}

/// Final data of a completed rule run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultData {
    pub data: Vec<Item>,
}

/// A rule run against one cloud account.
///
/// Created pending (`result == None`) before the rule executes and completed
/// in place once it returns. A failed run stays pending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditResult {
    pub id: Uuid,
    pub rule_id: String,
    pub cloud_account_id: Uuid,
    pub result: Option<ResultData>,
    pub evaluated_at: DateTime<Utc>,
}

impl AuditResult {
    pub fn pending(rule_id: impl Into<String>, cloud_account_id: Uuid) -> Self {
        Self {
            id: Uuid::now_v7(),
            rule_id: rule_id.into(),
            cloud_account_id,
            result: None,
            evaluated_at: Utc::now(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.result.is_none()
    }

    /// Attach the rule's findings, completing the run
    pub fn complete(mut self, items: Vec<Item>) -> Self {
        self.result = Some(ResultData { data: items });
        self
    }

    /// Findings of a completed run, empty while pending
    pub fn items(&self) -> &[Item] {
        self.result.as_ref().map(|r| r.data.as_slice()).unwrap_or(&[])
    }
}
