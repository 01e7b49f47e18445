//! Module results and the report printed back to the framework

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Error;

/// Change operation type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOperation {
    Create,
    Update,
    Delete,
    NoOp,
}

/// One change applied (or, in check mode, that would be applied) to a target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub operation: ChangeOperation,
    /// DN, path, host or whatever the module addresses
    pub target: String,
    pub description: String,
}

impl Change {
    pub fn new(
        operation: ChangeOperation,
        target: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            target: target.into(),
            description: description.into(),
        }
    }

    pub fn create(target: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(ChangeOperation::Create, target, description)
    }

    pub fn update(target: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(ChangeOperation::Update, target, description)
    }

    pub fn delete(target: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(ChangeOperation::Delete, target, description)
    }

    pub fn noop(target: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(ChangeOperation::NoOp, target, description)
    }

    pub fn is_change(&self) -> bool {
        self.operation != ChangeOperation::NoOp
    }
}

/// Successful outcome of a module run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleResult {
    pub changed: bool,
    pub msg: Option<String>,
    /// Extra top-level keys of the report
    pub data: Map<String, Value>,
    /// Emitted under `ansible_facts`
    pub facts: Map<String, Value>,
    pub changes: Vec<Change>,
}

impl ModuleResult {
    pub fn unchanged() -> Self {
        Self::default()
    }

    pub fn changed() -> Self {
        Self {
            changed: true,
            ..Default::default()
        }
    }

    /// `changed` is true when any change is not a no-op.
    pub fn from_changes(changes: Vec<Change>) -> Self {
        Self {
            changed: changes.iter().any(Change::is_change),
            changes,
            ..Default::default()
        }
    }

    pub fn with_msg(mut self, msg: impl Into<String>) -> Self {
        self.msg = Some(msg.into());
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn with_fact(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.facts.insert(key.into(), value.into());
        self
    }
}

/// The JSON object written to stdout for one invocation
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    body: Map<String, Value>,
    failed: bool,
}

impl Report {
    pub fn success(result: ModuleResult, invocation: Option<Value>) -> Self {
        let mut body = Map::new();
        body.insert("changed".into(), Value::Bool(result.changed));
        if let Some(msg) = result.msg {
            body.insert("msg".into(), Value::String(msg));
        }
        for (key, value) in result.data {
            body.insert(key, value);
        }
        if !result.facts.is_empty() {
            body.insert("ansible_facts".into(), Value::Object(result.facts));
        }
        if !result.changes.is_empty() {
            let changes = serde_json::to_value(&result.changes).unwrap_or(Value::Null);
            body.insert("changes".into(), changes);
        }
        if let Some(invocation) = invocation {
            body.insert("invocation".into(), invocation);
        }

        Self {
            body,
            failed: false,
        }
    }

    pub fn failure(error: &Error, invocation: Option<Value>) -> Self {
        let mut body = Map::new();
        body.insert("failed".into(), Value::Bool(true));
        body.insert("changed".into(), Value::Bool(false));
        body.insert("msg".into(), Value::String(error.to_string()));
        if let Some(data) = error.data() {
            for (key, value) in data {
                body.insert(key.clone(), value.clone());
            }
        }
        if let Some(invocation) = invocation {
            body.insert("invocation".into(), invocation);
        }

        Self { body, failed: true }
    }

    pub fn skipped(msg: impl Into<String>, invocation: Option<Value>) -> Self {
        let mut body = Map::new();
        body.insert("changed".into(), Value::Bool(false));
        body.insert("skipped".into(), Value::Bool(true));
        body.insert("msg".into(), Value::String(msg.into()));
        if let Some(invocation) = invocation {
            body.insert("invocation".into(), invocation);
        }

        Self {
            body,
            failed: false,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    pub fn exit_code(&self) -> i32 {
        if self.failed {
            1
        } else {
            0
        }
    }

    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }

    pub fn to_json_string(&self) -> String {
        Value::Object(self.body.clone()).to_string()
    }
}
