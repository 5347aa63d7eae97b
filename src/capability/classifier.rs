// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Entity type decision table.

use crate::capability::{Access, CapabilityDescriptor, EntityKind, ValueType};
use crate::naming::entity_name;
use log::debug;

/// Attribute reported with `read` access, but it is actually a command.
const EXECUTE_COMMAND: &str = "executeCommand";

/// Derive the entity kind of a capability.
///
/// The rules are evaluated in order, the first match wins. Returns `None` if the capability
/// cannot be mapped to an entity kind.
pub fn classify(capability: &CapabilityDescriptor) -> Option<EntityKind> {
    let (Some(value_type), Some(access)) = (capability.value_type, capability.access) else {
        debug!(
            "No entity type for '{}': type or access missing",
            capability.path
        );
        return None;
    };

    // Some appliances report a values list for plain booleans
    if value_type == ValueType::Boolean && access == Access::ReadWrite && capability.has_values() {
        return Some(EntityKind::Switch);
    }

    if access == Access::ReadWrite && capability.has_values() {
        if value_type == ValueType::String && is_on_off(capability) {
            return Some(EntityKind::Switch);
        }
        if !matches!(value_type, ValueType::Number | ValueType::Temperature)
            || capability.min.is_none()
        {
            return Some(EntityKind::Select);
        }
    }

    let kind = match (value_type, access) {
        (ValueType::Boolean, Access::Read) => Some(EntityKind::BinarySensor),
        (ValueType::Boolean, Access::ReadWrite) => Some(EntityKind::Switch),
        (ValueType::Boolean, _) => None,
        (ValueType::Temperature, Access::Read) => Some(EntityKind::Sensor),
        (ValueType::Temperature, Access::ReadWrite) => Some(EntityKind::Number),
        (ValueType::Temperature, _) => None,
        (ValueType::Alert, _) => Some(EntityKind::Sensor),
        (_, Access::Read) if entity_name(&capability.path) == EXECUTE_COMMAND => {
            Some(EntityKind::Button)
        }
        (_, Access::Write) => Some(EntityKind::Button),
        (_, Access::Constant) => Some(EntityKind::Sensor),
        (ValueType::Number | ValueType::Int | ValueType::String, Access::Read) => {
            Some(EntityKind::Sensor)
        }
        (ValueType::Number | ValueType::Int, Access::ReadWrite | Access::Unknown) => {
            Some(EntityKind::Number)
        }
        (ValueType::String | ValueType::Unspecified, Access::ReadWrite | Access::Unknown)
        | (ValueType::Unspecified, Access::Read) => None,
    };

    if kind.is_none() {
        debug!(
            "No entity type for '{}': type={value_type}, access={access}",
            capability.path
        );
    }
    kind
}

/// Check if the allowed values are exactly `ON` and `OFF` (ignoring case).
fn is_on_off(capability: &CapabilityDescriptor) -> bool {
    let Some(values) = capability.values.as_ref() else {
        return false;
    };
    let mut keys: Vec<String> = values.keys().map(|k| k.to_uppercase()).collect();
    keys.sort();
    keys.dedup();
    keys == ["OFF", "ON"]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::{Value, json};

    fn classify_json(path: &str, capability: Value) -> Option<EntityKind> {
        classify(&CapabilityDescriptor::parse(path, &capability))
    }

    #[rstest]
    #[case(json!({"ON": {}, "OFF": {}}))]
    #[case(json!({"A": {}, "B": {}, "C": {}}))]
    #[case(json!({"true": {}}))]
    fn readwrite_boolean_with_values_is_switch(#[case] values: Value) {
        let kind = classify_json(
            "ionizer",
            json!({"access": "readwrite", "type": "boolean", "values": values}),
        );
        assert_eq!(Some(EntityKind::Switch), kind);
    }

    #[rstest]
    #[case(json!({"ON": {}, "OFF": {}}))]
    #[case(json!({"on": {}, "off": {}}))]
    #[case(json!({"On": {}, "OFF": {}}))]
    fn readwrite_on_off_string_is_switch(#[case] values: Value) {
        let kind = classify_json(
            "sleepMode",
            json!({"access": "readwrite", "type": "string", "values": values}),
        );
        assert_eq!(Some(EntityKind::Switch), kind);
    }

    #[rstest]
    #[case(json!({"access": "readwrite", "type": "string", "values": {"COOL": {}, "ECO": {}, "OFF": {"disabled": true}}}))]
    #[case(json!({"access": "readwrite", "type": "string", "values": {"ON": {}, "OFF": {}, "AUTO": {}}}))]
    #[case(json!({"access": "readwrite", "type": "int", "values": {"1": {}, "2": {}}, "min": 1}))]
    #[case(json!({"access": "readwrite", "type": "number", "values": {"1": {}, "2": {}}}))]
    #[case(json!({"access": "readwrite", "type": "temperature", "values": {"20": {}, "22": {}}}))]
    #[case(json!({"access": "readwrite", "type": "complex", "values": {"A": {}}}))]
    fn readwrite_with_values_is_select(#[case] capability: Value) {
        assert_eq!(Some(EntityKind::Select), classify_json("mode", capability));
    }

    #[test]
    fn numeric_with_values_and_min_is_number() {
        let kind = classify_json(
            "targetTemperatureC",
            json!({"access": "readwrite", "type": "temperature", "min": 15, "values": {"15": {}}}),
        );
        assert_eq!(Some(EntityKind::Number), kind);
    }

    #[rstest]
    #[case("doorState", json!({"access": "read", "type": "boolean"}), Some(EntityKind::BinarySensor))]
    #[case("ionizer", json!({"access": "readwrite", "type": "boolean"}), Some(EntityKind::Switch))]
    #[case("ionizer", json!({"access": "write", "type": "boolean"}), None)]
    #[case("displayTemperatureC", json!({"access": "read", "type": "temperature"}), Some(EntityKind::Sensor))]
    #[case("targetTemperatureC", json!({"access": "readwrite", "type": "temperature", "min": 15.56}), Some(EntityKind::Number))]
    #[case("targetTemperatureC", json!({"access": "constant", "type": "temperature"}), None)]
    #[case("alerts", json!({"access": "read", "type": "alert"}), Some(EntityKind::Sensor))]
    #[case("alerts", json!({"access": "readonly", "type": "alert"}), Some(EntityKind::Sensor))]
    #[case("executeCommand", json!({"access": "read", "type": "string", "values": {"ON": {}}}), Some(EntityKind::Button))]
    #[case("executeCommand", json!({"access": "write", "type": "string", "values": {"START": {}}}), Some(EntityKind::Button))]
    #[case("applianceMode", json!({"access": "constant", "type": "string"}), Some(EntityKind::Sensor))]
    #[case("timeToEnd", json!({"access": "read", "type": "number"}), Some(EntityKind::Sensor))]
    #[case("fanSpeed", json!({"access": "read", "type": "int"}), Some(EntityKind::Sensor))]
    #[case("applianceState", json!({"access": "read", "type": "string"}), Some(EntityKind::Sensor))]
    #[case("fanspeed", json!({"access": "readwrite", "type": "int", "min": 1, "max": 9}), Some(EntityKind::Number))]
    #[case("startTime", json!({"access": "readwrite", "type": "number"}), Some(EntityKind::Number))]
    #[case("name", json!({"access": "readwrite", "type": "string"}), None)]
    #[case("complex", json!({"access": "read", "type": "complex"}), None)]
    #[case("missingAccess", json!({"type": "string"}), None)]
    #[case("missingType", json!({"access": "read"}), None)]
    fn decision_table(
        #[case] path: &str,
        #[case] capability: Value,
        #[case] expected: Option<EntityKind>,
    ) {
        assert_eq!(expected, classify_json(path, capability));
    }

    #[test]
    fn renamed_execute_command_path_is_button() {
        let kind = classify_json(
            "userSelections/EXE_executeCommand",
            json!({"access": "read", "type": "string"}),
        );
        assert_eq!(Some(EntityKind::Button), kind);
    }
}
