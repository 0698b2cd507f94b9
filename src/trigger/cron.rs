use super::{
    has_text, optional_string, queued, required_string, CronTrigger, TransitionTrigger,
    TriggerAssembler, TriggerVerifier, WorkflowDefinition,
};
use crate::error::{common, ErrorCode, Result, WorkflowImportError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

static CRON_FIELD_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\*|(\d+)(?:-(\d+))?)(?:/(\d+))?$").expect("Invalid regex pattern")
});

/// Name and inclusive bounds of the five cron fields
const CRON_FIELDS: [(&str, u32, u32); 5] = [
    ("minute", 0, 59),
    ("hour", 0, 23),
    ("day of month", 1, 31),
    ("month", 1, 12),
    ("day of week", 0, 7),
];

pub struct CronTriggerAssembler {
    verifier: Box<dyn TriggerVerifier>,
}

impl Default for CronTriggerAssembler {
    fn default() -> Self {
        Self::new(Box::new(CronTriggerVerifier))
    }
}

impl CronTriggerAssembler {
    pub fn new(verifier: Box<dyn TriggerVerifier>) -> Self {
        Self { verifier }
    }
}

impl TriggerAssembler for CronTriggerAssembler {
    fn can_assemble(&self, options: &Map<String, Value>) -> bool {
        has_text(options, "cron")
    }

    fn assemble(
        &self,
        options: &Map<String, Value>,
        transition_name: &str,
        definition: &WorkflowDefinition,
    ) -> Result<TransitionTrigger> {
        let trigger = TransitionTrigger::Cron(CronTrigger {
            cron: required_string(options, "cron")?,
            filter: optional_string(options, "filter")?,
            queued: queued(options)?,
            transition_name: transition_name.to_string(),
            workflow_name: definition.name.clone(),
        });

        self.verifier.verify(&trigger)?;
        Ok(trigger)
    }
}

/// Accepts five-field cron expressions with lists, ranges and steps
#[derive(Debug, Clone, Copy, Default)]
pub struct CronTriggerVerifier;

impl TriggerVerifier for CronTriggerVerifier {
    fn verify(&self, trigger: &TransitionTrigger) -> Result<()> {
        match trigger {
            TransitionTrigger::Cron(cron) => validate_cron_expression(&cron.cron),
            other => Err(common::unexpected_type("CronTrigger", other.type_name())),
        }
    }
}

pub fn validate_cron_expression(expression: &str) -> Result<()> {
    let fields: Vec<&str> = expression.split_whitespace().collect();
    if fields.len() != CRON_FIELDS.len() {
        return Err(invalid_cron(
            expression,
            &format!("expected 5 fields, {} given", fields.len()),
        ));
    }

    for (field, (name, min, max)) in fields.iter().zip(CRON_FIELDS) {
        for part in field.split(',') {
            validate_part(part, min, max)
                .map_err(|reason| invalid_cron(expression, &format!("{} {}", name, reason)))?;
        }
    }
    Ok(())
}

fn validate_part(part: &str, min: u32, max: u32) -> std::result::Result<(), String> {
    let caps = CRON_FIELD_REGEX
        .captures(part)
        .ok_or_else(|| format!("`{}` is not a valid value", part))?;

    let number = |index: usize| -> std::result::Result<Option<u32>, String> {
        caps.get(index)
            .map(|m| {
                m.as_str()
                    .parse::<u32>()
                    .map_err(|_| format!("`{}` is out of range", m.as_str()))
            })
            .transpose()
    };

    if let Some(start) = number(2)? {
        let end = number(3)?.unwrap_or(start);
        if start < min || end > max || start > end {
            return Err(format!("`{}` is outside {}-{}", part, min, max));
        }
    }

    if number(4)? == Some(0) {
        return Err(format!("`{}` has a zero step", part));
    }
    Ok(())
}

fn invalid_cron(expression: &str, reason: &str) -> WorkflowImportError {
    WorkflowImportError::validation_with_code(
        ErrorCode::VALIDATION_INVALID_FORMAT,
        format!("Invalid cron expression `{}`: {}", expression, reason),
        Some("cron".to_string()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trigger::{EventTrigger, TriggerEvent};
    use serde_json::json;

    fn options(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn definition() -> WorkflowDefinition {
        WorkflowDefinition::new("order_flow", Some("Acme\\Order".to_string()))
    }

    #[test]
    fn test_can_assemble() {
        let assembler = CronTriggerAssembler::default();

        assert!(assembler.can_assemble(&options(json!({"cron": "* * * * *"}))));
        assert!(!assembler.can_assemble(&options(json!({"cron": ""}))));
        assert!(!assembler.can_assemble(&options(json!({"event": "create"}))));
    }

    #[test]
    fn test_assemble_with_defaults() {
        let trigger = CronTriggerAssembler::default()
            .assemble(&options(json!({"cron": "*/5 * * * *"})), "close", &definition())
            .unwrap();

        assert_eq!(
            trigger,
            TransitionTrigger::Cron(CronTrigger {
                cron: "*/5 * * * *".to_string(),
                filter: None,
                queued: true,
                transition_name: "close".to_string(),
                workflow_name: "order_flow".to_string(),
            })
        );
    }

    #[test]
    fn test_assemble_with_all_options() {
        let trigger = CronTriggerAssembler::default()
            .assemble(
                &options(json!({"cron": "0 3 1-15 * 1,3,5", "filter": "e.total > 0", "queued": false})),
                "close",
                &definition(),
            )
            .unwrap();

        match trigger {
            TransitionTrigger::Cron(cron) => {
                assert_eq!(cron.filter.as_deref(), Some("e.total > 0"));
                assert!(!cron.queued);
            }
            other => panic!("expected cron trigger, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_options() {
        let assembler = CronTriggerAssembler::default();

        let err = assembler
            .assemble(&options(json!({"cron": "* * * * *", "queued": "yes"})), "t", &definition())
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::VALIDATION_INVALID_TYPE);

        let err = assembler
            .assemble(&options(json!({"cron": "61 * * * *"})), "t", &definition())
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::VALIDATION_INVALID_FORMAT);
    }

    #[test]
    fn test_validate_cron_expression() {
        for valid in ["* * * * *", "0 0 1 1 0", "*/15 9-17 * * 1-5", "5,10 0 31 12 7"] {
            assert!(validate_cron_expression(valid).is_ok(), "{}", valid);
        }

        let err = validate_cron_expression("* * * *").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid cron expression `* * * *`: expected 5 fields, 4 given"
        );

        let err = validate_cron_expression("0 24 * * *").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid cron expression `0 24 * * *`: hour `24` is outside 0-23"
        );

        assert!(validate_cron_expression("0 0 0 * *").is_err());
        assert!(validate_cron_expression("5-1 * * * *").is_err());
        assert!(validate_cron_expression("*/0 * * * *").is_err());
        assert!(validate_cron_expression("@daily * * * *").is_err());
    }

    #[test]
    fn test_verifier_rejects_event_trigger() {
        let trigger = TransitionTrigger::Event(EventTrigger {
            event: TriggerEvent::Create,
            entity_class: "Acme\\Order".to_string(),
            field: None,
            require: None,
            relation: None,
            queued: true,
            transition_name: "t".to_string(),
            workflow_name: "w".to_string(),
        });

        let err = CronTriggerVerifier.verify(&trigger).unwrap_err();

        assert_eq!(err.code(), ErrorCode::VALIDATION_TYPE_MISMATCH);
        assert_eq!(
            err.to_string(),
            "Expected instance of `CronTrigger`, `EventTrigger` given"
        );
    }
}
