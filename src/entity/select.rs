// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

use crate::entity::command::format_command_value;
use crate::entity::{EntityBase, EntityValue, Readable, Writable, WriteValue};
use crate::errors::CommandError;
use crate::util::json::number_value;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct SelectEntity {
    pub(super) base: EntityBase,
}

impl SelectEntity {
    pub fn new(base: EntityBase) -> Self {
        Self { base }
    }

    /// Selectable options in declaration order.
    pub fn options(&self) -> Vec<String> {
        self.base.capability.value_keys()
    }
}

impl Readable for SelectEntity {
    fn read(&mut self) -> EntityValue {
        let option = match self.base.extract_value() {
            Some(Value::String(s)) => Some(s),
            Some(value @ Value::Number(_)) => number_value(&value).map(|n| match n {
                n if n.fract() == 0.0 => format!("{}", n as i64),
                n => n.to_string(),
            }),
            Some(Value::Bool(b)) => Some(b.to_string()),
            _ => None,
        };
        match option {
            Some(option) => self.base.remember(EntityValue::Text(option)),
            None => self.base.cached(),
        }
    }
}

impl Writable for SelectEntity {
    fn command_value(&self, value: &WriteValue) -> Result<Value, CommandError> {
        let option = match value {
            WriteValue::Text(text) => text.clone(),
            WriteValue::Number(n) => n.to_string(),
            WriteValue::Bool(b) => b.to_string(),
            WriteValue::Press => {
                return Err(CommandError::CommandValidation(format!(
                    "'{}' expects an option",
                    self.base.path
                )));
            }
        };
        let value = format_command_value(&self.base.capability, None, &WriteValue::Text(option))?;
        // numeric options are sent as numbers
        if self.base.capability.is_numeric() {
            if let Some(number) = value.as_str().and_then(|s| s.parse::<i64>().ok()) {
                return Ok(Value::from(number));
            }
        }
        Ok(value)
    }
}
