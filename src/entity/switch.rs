// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

use crate::entity::command::format_command_value;
use crate::entity::{EntityBase, EntityValue, Readable, Writable, WriteValue};
use crate::errors::CommandError;
use crate::util::json::{is_truthy, number_value};
use crate::util::string_to_boolean;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct SwitchEntity {
    pub(super) base: EntityBase,
}

impl SwitchEntity {
    pub fn new(base: EntityBase) -> Self {
        Self { base }
    }
}

impl Readable for SwitchEntity {
    fn read(&mut self) -> EntityValue {
        let value = self
            .base
            .extract_value()
            .or_else(|| self.base.state_mapping_value());

        let on = match value {
            None => {
                return match self.base.cached() {
                    EntityValue::Unknown => EntityValue::Bool(false),
                    cached => cached,
                };
            }
            Some(Value::Bool(b)) => b,
            Some(Value::String(s)) => string_to_boolean(&s, false).is_on(),
            Some(value @ Value::Number(_)) => number_value(&value).is_some_and(|n| n != 0.0),
            Some(value) => is_truthy(&value),
        };
        self.base.remember(EntityValue::Bool(on))
    }
}

impl Writable for SwitchEntity {
    fn command_value(&self, value: &WriteValue) -> Result<Value, CommandError> {
        let on = match value {
            WriteValue::Bool(on) => *on,
            WriteValue::Text(text) => string_to_boolean(text, false).is_on(),
            WriteValue::Number(n) => *n != 0.0,
            WriteValue::Press => {
                return Err(CommandError::CommandValidation(format!(
                    "'{}' expects on or off",
                    self.base.path
                )));
            }
        };
        format_command_value(&self.base.capability, self.base.unit, &WriteValue::Bool(on))
    }
}
