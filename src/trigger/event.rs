use super::{
    has_text, optional_string, queued, required_string, EventTrigger, TransitionTrigger,
    TriggerAssembler, TriggerEvent, TriggerVerifier, WorkflowDefinition,
};
use crate::error::{common, ErrorCode, Result, WorkflowImportError};
use serde_json::{Map, Value};

pub struct EventTriggerAssembler {
    verifier: Box<dyn TriggerVerifier>,
}

impl Default for EventTriggerAssembler {
    fn default() -> Self {
        Self::new(Box::new(EventTriggerVerifier))
    }
}

impl EventTriggerAssembler {
    pub fn new(verifier: Box<dyn TriggerVerifier>) -> Self {
        Self { verifier }
    }
}

impl TriggerAssembler for EventTriggerAssembler {
    fn can_assemble(&self, options: &Map<String, Value>) -> bool {
        has_text(options, "event")
    }

    fn assemble(
        &self,
        options: &Map<String, Value>,
        transition_name: &str,
        definition: &WorkflowDefinition,
    ) -> Result<TransitionTrigger> {
        let event: TriggerEvent = required_string(options, "event")?.parse()?;
        let entity_class = optional_string(options, "entity_class")?
            .or_else(|| definition.related_entity.clone())
            .ok_or_else(|| common::missing_field("entity_class"))?;

        let trigger = TransitionTrigger::Event(EventTrigger {
            event,
            entity_class,
            field: optional_string(options, "field")?,
            require: optional_string(options, "require")?,
            relation: optional_string(options, "relation")?,
            queued: queued(options)?,
            transition_name: transition_name.to_string(),
            workflow_name: definition.name.clone(),
        });

        self.verifier.verify(&trigger)?;
        Ok(trigger)
    }
}

/// Only `update` events may watch a single field
#[derive(Debug, Clone, Copy, Default)]
pub struct EventTriggerVerifier;

impl TriggerVerifier for EventTriggerVerifier {
    fn verify(&self, trigger: &TransitionTrigger) -> Result<()> {
        let event = match trigger {
            TransitionTrigger::Event(event) => event,
            other => return Err(common::unexpected_type("EventTrigger", other.type_name())),
        };

        if event.field.is_some() && event.event != TriggerEvent::Update {
            return Err(WorkflowImportError::validation_with_code(
                ErrorCode::VALIDATION_CONSTRAINT_VIOLATION,
                format!(
                    "Option `field` is allowed only for the update event, `{}` given",
                    event.event
                ),
                Some("field".to_string()),
            ));
        }
        Ok(())
    }
}
