// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

use crate::entity::{EntityBase, EntityValue, Readable};
use crate::naming::normalize_key;
use crate::util::json::number_value;
use crate::util::string_to_boolean;
use serde_json::Value;

/// Attributes signalling the end of a process phase.
const PROCESS_END_KEYS: [&str; 2] = ["ovcleaning_ended", "ovfood_probe_end_of_cooking"];

#[derive(Debug, Clone)]
pub struct BinarySensorEntity {
    pub(super) base: EntityBase,
}

impl BinarySensorEntity {
    pub fn new(base: EntityBase) -> Self {
        Self { base }
    }

    fn invert(&self) -> bool {
        self.base
            .catalog_entry
            .as_ref()
            .is_some_and(|e| e.state_invert)
    }

    /// State without inversion.
    fn raw_state(&self) -> Option<bool> {
        let key = normalize_key(&self.base.attr);
        let value = self.base.extract_value();

        if key == "foodprobeinsertionstate" {
            if let Some(value) = &value {
                return Some(value.as_str() == Some("INSERTED"));
            }
        } else if PROCESS_END_KEYS.contains(&key.as_str()) {
            if let Some(phase) = self.base.state_attr("processPhase") {
                return Some(phase.as_str() == Some("STOPPED"));
            }
        }

        if let Some(default) = self.base.constant_default() {
            return to_bool(&default);
        }

        value
            .or_else(|| self.base.state_mapping_value())
            .as_ref()
            .and_then(to_bool)
    }
}

fn to_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => Some(string_to_boolean(s, true).is_on()),
        Value::Number(_) => number_value(value).map(|n| n != 0.0),
        Value::Null => None,
        Value::Array(a) => Some(!a.is_empty()),
        Value::Object(o) => Some(!o.is_empty()),
    }
}

impl Readable for BinarySensorEntity {
    fn read(&mut self) -> EntityValue {
        let state = match self.raw_state() {
            Some(state) => self.base.remember(EntityValue::Bool(state)),
            None => self.base.cached(),
        };
        match state {
            EntityValue::Bool(on) => EntityValue::Bool(on != self.invert()),
            other => other,
        }
    }
}
