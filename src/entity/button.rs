// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

use crate::entity::command::format_command_value;
use crate::entity::{EntityBase, Writable, WriteValue};
use crate::errors::CommandError;
use serde_json::Value;

/// Stateless entity sending a fixed command value.
#[derive(Debug, Clone)]
pub struct ButtonEntity {
    pub(super) base: EntityBase,
    command: String,
}

impl ButtonEntity {
    pub fn new(base: EntityBase, command: String) -> Self {
        Self { base, command }
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

impl Writable for ButtonEntity {
    fn command_value(&self, value: &WriteValue) -> Result<Value, CommandError> {
        match value {
            WriteValue::Press => format_command_value(
                &self.base.capability,
                None,
                &WriteValue::Text(self.command.clone()),
            ),
            _ => Err(CommandError::CommandValidation(format!(
                "'{}' can only be pressed",
                self.base.path
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::tests::entity_base;
    use serde_json::json;

    #[test]
    fn press_sends_command_value() {
        let base = entity_base(
            "executeCommand",
            json!({"access": "write", "type": "string", "values": {"START": {}, "STOPRESET": {}}}),
            json!({}),
        );
        let button = ButtonEntity::new(base, "STOPRESET".into());
        assert_eq!(Ok(json!("STOPRESET")), button.command_value(&WriteValue::Press));
    }

    #[test]
    fn values_are_rejected() {
        let base = entity_base(
            "executeCommand",
            json!({"access": "write", "type": "string", "values": {"START": {}}}),
            json!({}),
        );
        let button = ButtonEntity::new(base, "START".into());
        assert!(button.command_value(&WriteValue::Bool(true)).is_err());
    }
}
