// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

use crate::capability::ValueType;
use crate::catalog::Unit;
use crate::entity::{EntityBase, EntityValue, Readable, round_to, to_entity_value};
use crate::util::json::number_value;
use crate::util::time_seconds_to_minutes;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct SensorEntity {
    pub(super) base: EntityBase,
}

impl SensorEntity {
    pub fn new(base: EntityBase) -> Self {
        Self { base }
    }

    fn source_value(&self) -> Option<Value> {
        self.base
            .extract_value()
            .or_else(|| self.base.state_mapping_value())
            .or_else(|| self.base.constant_default())
            .or_else(|| {
                self.base
                    .catalog_entry
                    .as_ref()
                    .and_then(|e| e.constant_default().cloned())
            })
    }

    /// Label of an enumerated code, if the catalog defines one.
    fn mapped_label(&self, value: &Value) -> Option<String> {
        let mapping = &self.base.catalog_entry.as_ref()?.value_mapping;
        if mapping.is_empty() {
            return None;
        }
        let key = match value {
            Value::String(s) => s.clone(),
            Value::Number(_) => match number_value(value)? {
                n if n.fract() == 0.0 => format!("{}", n as i64),
                n => n.to_string(),
            },
            _ => return None,
        };
        mapping.get(&key).cloned()
    }

    fn convert(&self, value: &Value) -> EntityValue {
        if let Some(label) = self.mapped_label(value) {
            return EntityValue::Text(label);
        }
        if self.base.capability.value_type == Some(ValueType::Alert) {
            if let Value::Array(alerts) = value {
                return EntityValue::Number(alerts.len() as f64);
            }
        }
        match (self.base.unit, number_value(value)) {
            (Some(Unit::Seconds), Some(seconds)) => {
                EntityValue::Number(time_seconds_to_minutes(seconds).max(0.0))
            }
            (Some(Unit::Celsius), Some(celsius)) if value.is_number() => {
                EntityValue::Number(round_to(celsius, 2))
            }
            _ => to_entity_value(value),
        }
    }
}

impl Readable for SensorEntity {
    fn read(&mut self) -> EntityValue {
        match self.source_value() {
            Some(value) => {
                let value = self.convert(&value);
                self.base.remember(value)
            }
            None => self.base.cached(),
        }
    }
}
