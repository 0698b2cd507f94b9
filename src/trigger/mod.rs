//! Transition triggers declared in workflow configuration
//!
//! A transition may list `triggers`, each a flat options mapping. Options with
//! a `cron` expression become [`CronTrigger`]s, options with an `event` become
//! [`EventTrigger`]s. Every assembled trigger is checked by a
//! [`TriggerVerifier`] before it is handed out.

use crate::error::{common, ErrorCode, Result, WorkflowImportError};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

pub mod cron;
pub mod event;

pub use cron::{CronTriggerAssembler, CronTriggerVerifier};
pub use event::{EventTriggerAssembler, EventTriggerVerifier};

pub const TRANSITIONS_KEY: &str = "transitions";
pub const TRIGGERS_KEY: &str = "triggers";

/// The parts of a workflow triggers are assembled against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowDefinition {
    pub name: String,
    pub related_entity: Option<String>,
}

impl WorkflowDefinition {
    pub fn new(name: impl Into<String>, related_entity: Option<String>) -> Self {
        Self {
            name: name.into(),
            related_entity,
        }
    }

    /// Read the definition from a resolved workflow node
    pub fn from_node(name: &str, node: &Map<String, Value>) -> Self {
        let related_entity = node
            .get("entity")
            .and_then(Value::as_str)
            .filter(|entity| !entity.is_empty())
            .map(str::to_string);
        Self::new(name, related_entity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CronTrigger {
    pub cron: String,
    pub filter: Option<String>,
    pub queued: bool,
    pub transition_name: String,
    pub workflow_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerEvent {
    Create,
    Update,
    Delete,
}

impl TriggerEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for TriggerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TriggerEvent {
    type Err = WorkflowImportError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            other => Err(WorkflowImportError::validation_with_code(
                ErrorCode::VALIDATION_INVALID_VALUE,
                format!(
                    "Option `event` must be one of create, update, delete, `{}` given",
                    other
                ),
                Some("event".to_string()),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventTrigger {
    pub event: TriggerEvent,
    pub entity_class: String,
    pub field: Option<String>,
    pub require: Option<String>,
    pub relation: Option<String>,
    pub queued: bool,
    pub transition_name: String,
    pub workflow_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransitionTrigger {
    Cron(CronTrigger),
    Event(EventTrigger),
}

impl TransitionTrigger {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Cron(_) => "CronTrigger",
            Self::Event(_) => "EventTrigger",
        }
    }

    pub fn transition_name(&self) -> &str {
        match self {
            Self::Cron(trigger) => &trigger.transition_name,
            Self::Event(trigger) => &trigger.transition_name,
        }
    }

    pub fn is_queued(&self) -> bool {
        match self {
            Self::Cron(trigger) => trigger.queued,
            Self::Event(trigger) => trigger.queued,
        }
    }
}

/// Builds one kind of trigger from a flat options mapping
pub trait TriggerAssembler: Send + Sync {
    fn can_assemble(&self, options: &Map<String, Value>) -> bool;

    fn assemble(
        &self,
        options: &Map<String, Value>,
        transition_name: &str,
        definition: &WorkflowDefinition,
    ) -> Result<TransitionTrigger>;
}

/// Checks an assembled trigger
pub trait TriggerVerifier: Send + Sync {
    fn verify(&self, trigger: &TransitionTrigger) -> Result<()>;
}

/// Assembles every trigger of a resolved workflow node
pub struct TransitionTriggersAssembler {
    assemblers: Vec<Box<dyn TriggerAssembler>>,
}

impl Default for TransitionTriggersAssembler {
    fn default() -> Self {
        Self::new(vec![
            Box::new(CronTriggerAssembler::default()),
            Box::new(EventTriggerAssembler::default()),
        ])
    }
}

impl TransitionTriggersAssembler {
    pub fn new(assemblers: Vec<Box<dyn TriggerAssembler>>) -> Self {
        Self { assemblers }
    }

    /// Walk `transitions.<name>.triggers` in declaration order
    pub fn assemble_all(
        &self,
        definition: &WorkflowDefinition,
        node: &Map<String, Value>,
    ) -> Result<Vec<TransitionTrigger>> {
        let transitions = match node.get(TRANSITIONS_KEY) {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(Value::Object(transitions)) => transitions,
            Some(_) => return Err(common::invalid_field_type(TRANSITIONS_KEY, "a mapping")),
        };

        let mut triggers = Vec::new();
        for (transition_name, transition) in transitions {
            let declared = match transition.get(TRIGGERS_KEY) {
                None | Some(Value::Null) => continue,
                Some(Value::Array(declared)) => declared,
                Some(_) => return Err(common::invalid_field_type(TRIGGERS_KEY, "a sequence")),
            };

            for options in declared {
                let options = options.as_object().ok_or_else(|| {
                    common::invalid_field_type(TRIGGERS_KEY, "a sequence of mappings")
                })?;
                triggers.push(self.assemble_one(options, transition_name, definition)?);
            }
        }

        tracing::debug!(
            "Assembled {} trigger(s) for workflow `{}`",
            triggers.len(),
            definition.name
        );
        Ok(triggers)
    }

    fn assemble_one(
        &self,
        options: &Map<String, Value>,
        transition_name: &str,
        definition: &WorkflowDefinition,
    ) -> Result<TransitionTrigger> {
        let assembler = self
            .assemblers
            .iter()
            .find(|assembler| assembler.can_assemble(options))
            .ok_or_else(|| {
                WorkflowImportError::validation_with_code(
                    ErrorCode::VALIDATION_CONSTRAINT_VIOLATION,
                    format!(
                        "Trigger of transition `{}` needs either `cron` or `event`",
                        transition_name
                    ),
                    Some(TRIGGERS_KEY.to_string()),
                )
            })?;
        assembler.assemble(options, transition_name, definition)
    }
}

/// Whether `key` holds a non-empty string
pub(crate) fn has_text(options: &Map<String, Value>, key: &str) -> bool {
    matches!(options.get(key), Some(Value::String(s)) if !s.is_empty())
}

pub(crate) fn optional_string(options: &Map<String, Value>, key: &str) -> Result<Option<String>> {
    match options.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(common::invalid_field_type(key, "a string")),
    }
}

pub(crate) fn required_string(options: &Map<String, Value>, key: &str) -> Result<String> {
    optional_string(options, key)?.ok_or_else(|| common::missing_field(key))
}

/// `queued` defaults to true
pub(crate) fn queued(options: &Map<String, Value>) -> Result<bool> {
    match options.get("queued") {
        None | Some(Value::Null) => Ok(true),
        Some(Value::Bool(queued)) => Ok(*queued),
        Some(_) => Err(common::invalid_field_type("queued", "a boolean")),
    }
}
