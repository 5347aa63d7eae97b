// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

use crate::entity::{EntityBase, EntityValue, Readable, Writable, WriteValue};
use crate::errors::CommandError;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct TextEntity {
    pub(super) base: EntityBase,
}

impl TextEntity {
    pub fn new(base: EntityBase) -> Self {
        Self { base }
    }
}

impl Readable for TextEntity {
    fn read(&mut self) -> EntityValue {
        match self.base.extract_value() {
            Some(Value::String(s)) => self.base.remember(EntityValue::Text(s)),
            Some(value) => self.base.remember(EntityValue::Text(value.to_string())),
            None => self.base.cached(),
        }
    }
}

impl Writable for TextEntity {
    fn command_value(&self, value: &WriteValue) -> Result<Value, CommandError> {
        match value {
            WriteValue::Text(text) => Ok(Value::String(text.clone())),
            WriteValue::Number(n) => Ok(Value::String(n.to_string())),
            WriteValue::Bool(b) => Ok(Value::String(b.to_string())),
            WriteValue::Press => Err(CommandError::CommandValidation(format!(
                "'{}' expects a text",
                self.base.path
            ))),
        }
    }
}
