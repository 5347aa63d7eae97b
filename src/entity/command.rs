// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Appliance command construction.
//!
//! Writing an entity value is a three step process: check that the appliance accepts remote
//! commands, format the requested value according to the attribute capability, and wrap it into
//! the command envelope of the attribute source.

use crate::capability::{CapabilityDescriptor, ValueType};
use crate::catalog::Unit;
use crate::entity::WriteValue;
use crate::errors::CommandError;
use crate::util::json::{copy_entry, is_truthy, set_path};
use crate::util::{TIME_NOT_SET, time_minutes_to_seconds};
use log::{debug, error};
use serde_json::{Map, Value, json};

const USER_SELECTIONS: &str = "userSelections";
const LATAM_USER_SELECTIONS: &str = "latamUserSelections";

/// Remote control status preventing commands, `None` if commands are allowed.
///
/// The `remoteControl` attribute is looked up at the state root, then in the reported state.
/// A missing or empty status allows commands, otherwise the status must contain `ENABLED`.
/// An empty state means the appliance isn't available.
pub fn remote_control_block(state: &Value) -> Option<String> {
    let Some(root) = state.as_object().filter(|s| !s.is_empty()) else {
        return Some("unavailable".into());
    };
    let status = root
        .get("remoteControl")
        .filter(|v| !v.is_null())
        .or_else(|| {
            root.get("properties")
                .and_then(|p| p.get("reported"))
                .and_then(|r| r.get("remoteControl"))
                .filter(|v| !v.is_null())
        })
        .filter(|v| is_truthy(v))?;
    let status = match status {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if status.contains("ENABLED") {
        None
    } else {
        Some(status)
    }
}

/// Fail with [`CommandError::RemoteControlDisabled`] if the appliance doesn't accept commands.
pub fn ensure_remote_control(pnc_id: &str, state: &Value) -> Result<(), CommandError> {
    match remote_control_block(state) {
        None => Ok(()),
        Some(status) => {
            debug!("[{pnc_id}] Remote control is disabled: {status}");
            Err(CommandError::RemoteControlDisabled(status))
        }
    }
}

/// Format a requested value for the appliance.
///
/// # Arguments
///
/// * `capability`: capability of the attribute.
/// * `unit`: native unit of the attribute. Seconds based values are requested in minutes.
/// * `value`: requested value.
pub fn format_command_value(
    capability: &CapabilityDescriptor,
    unit: Option<Unit>,
    value: &WriteValue,
) -> Result<Value, CommandError> {
    match value {
        WriteValue::Bool(on) => Ok(format_bool(capability, *on)),
        WriteValue::Number(number) => Ok(format_number(capability, unit, *number)),
        WriteValue::Text(text) => format_text(capability, text),
        WriteValue::Press => Err(CommandError::CommandValidation(format!(
            "'{}' expects a value",
            capability.path
        ))),
    }
}

fn format_bool(capability: &CapabilityDescriptor, on: bool) -> Value {
    let word = if on { "ON" } else { "OFF" };
    if let Some(key) = canonical_value(capability, word) {
        return Value::String(key);
    }
    match capability.value_type {
        Some(ValueType::String) => Value::String(word.into()),
        _ => Value::Bool(on),
    }
}

fn format_number(capability: &CapabilityDescriptor, unit: Option<Unit>, number: f64) -> Value {
    let is_time = unit == Some(Unit::Seconds);
    if is_time && number == TIME_NOT_SET {
        return json!(TIME_NOT_SET as i64);
    }
    let mut value = if is_time {
        time_minutes_to_seconds(number)
    } else {
        number
    };

    let min = capability.min.unwrap_or(0.0);
    if let Some(step) = capability.step.filter(|s| *s > 0.0) {
        value = min + ((value - min) / step).round() * step;
    }
    if let Some(min) = capability.min {
        value = value.max(min);
    }
    if let Some(max) = capability.max {
        value = value.min(max);
    }

    let as_int = capability.step == Some(1.0)
        || capability.value_type == Some(ValueType::Int)
        || is_time;
    if as_int {
        json!(value.round() as i64)
    } else {
        json!(value)
    }
}

fn format_text(capability: &CapabilityDescriptor, text: &str) -> Result<Value, CommandError> {
    if !capability.has_values() {
        return Ok(Value::String(text.into()));
    }
    canonical_value(capability, text)
        .map(Value::String)
        .ok_or_else(|| {
            CommandError::CommandValidation(format!(
                "'{text}' is not a valid value for '{}'. Allowed values: {}",
                capability.path,
                capability.value_keys().join(", ")
            ))
        })
}

/// Allowed value key matching `value` case-insensitively.
fn canonical_value(capability: &CapabilityDescriptor, value: &str) -> Option<String> {
    capability
        .values
        .as_ref()?
        .keys()
        .find(|key| key.eq_ignore_ascii_case(value))
        .cloned()
}

/// Wrap a formatted value into the command envelope of the attribute source.
///
/// # Arguments
///
/// * `source`: attribute category, empty for root attributes.
/// * `attr`: leaf attribute name.
/// * `value`: formatted command value.
/// * `reported`: current reported state, required for the `userSelections` envelopes.
pub fn build_command(
    source: &str,
    attr: &str,
    value: Value,
    reported: Option<&Map<String, Value>>,
) -> Result<Value, CommandError> {
    if source.is_empty() {
        let mut command = Map::new();
        command.insert(attr.into(), value);
        return Ok(Value::Object(command));
    }

    let block = reported
        .and_then(|r| r.get(source))
        .and_then(Value::as_object);
    let mut body = Map::new();
    match source {
        LATAM_USER_SELECTIONS => {
            let Some(block) = block else {
                error!("{LATAM_USER_SELECTIONS} not available in the reported state, cannot set {attr}");
                return Err(CommandError::Unexpected(format!(
                    "{LATAM_USER_SELECTIONS} not available"
                )));
            };
            body = block.clone();
            body.insert(attr.into(), value);
        }
        USER_SELECTIONS => {
            if let Some(block) = block {
                copy_entry(block, &mut body, "programUID");
            }
            body.insert(attr.into(), value);
        }
        _ => {
            let mut command = Map::new();
            set_path(&mut command, &format!("{source}/{attr}"), value);
            return Ok(Value::Object(command));
        }
    }

    let mut command = Map::new();
    command.insert(source.into(), Value::Object(body));
    Ok(Value::Object(command))
}

/// Alternative command if a command for a `*UserSelections` wrapper failed validation.
///
/// Returns the same value wrapped into a plain `userSelections` envelope, or `None` if the
/// source isn't another user selection wrapper.
pub fn retry_command(
    source: &str,
    attr: &str,
    value: Value,
    reported: Option<&Map<String, Value>>,
) -> Option<Value> {
    if source == USER_SELECTIONS || !source.to_lowercase().contains("userselections") {
        return None;
    }
    build_command(USER_SELECTIONS, attr, value, reported).ok()
}

/// Extract the formatted attribute value from a command envelope built with [`build_command`].
pub fn command_value_of(command: &Value, source: &str, attr: &str) -> Option<Value> {
    let scope = if source.is_empty() {
        command
    } else {
        source
            .split('/')
            .try_fold(command, |node, level| node.get(level))?
    };
    scope.get(attr).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn capability(value: Value) -> CapabilityDescriptor {
        CapabilityDescriptor::parse("x", &value)
    }

    #[rstest]
    #[case(json!({"remoteControl": "ENABLED"}), None)]
    #[case(json!({"properties": {"reported": {"remoteControl": "NOT_SAFETY_RELEVANT_ENABLED"}}}), None)]
    #[case(json!({"properties": {"reported": {}}}), None)]
    #[case(json!({"properties": {"reported": {"remoteControl": ""}}}), None)]
    #[case(json!({"properties": {"reported": {"remoteControl": "TEMPORARY_LOCKED"}}}), Some("TEMPORARY_LOCKED"))]
    #[case(json!({"properties": {"reported": {"remoteControl": "DISABLED"}}}), Some("DISABLED"))]
    #[case(json!({}), Some("unavailable"))]
    #[case(json!(null), Some("unavailable"))]
    fn remote_control(#[case] state: Value, #[case] expected: Option<&str>) {
        assert_eq!(expected.map(String::from), remote_control_block(&state));
    }

    #[test]
    fn ensure_remote_control_error() {
        let state = json!({"remoteControl": "LOCKED"});
        assert_eq!(
            Err(CommandError::RemoteControlDisabled("LOCKED".into())),
            ensure_remote_control("pnc", &state)
        );
    }

    #[rstest]
    #[case(json!({"access": "readwrite", "type": "boolean"}), true, json!(true))]
    #[case(json!({"access": "readwrite", "type": "boolean"}), false, json!(false))]
    #[case(json!({"access": "readwrite", "type": "string", "values": {"ON": {}, "OFF": {}}}), true, json!("ON"))]
    #[case(json!({"access": "readwrite", "type": "string", "values": {"on": {}, "off": {}}}), false, json!("off"))]
    #[case(json!({"access": "readwrite", "type": "string"}), true, json!("ON"))]
    fn format_bool_values(#[case] cap: Value, #[case] on: bool, #[case] expected: Value) {
        assert_eq!(
            Ok(expected),
            format_command_value(&capability(cap), None, &WriteValue::Bool(on))
        );
    }

    #[rstest]
    #[case(json!({"type": "temperature", "min": 15.56, "max": 32.22, "step": 1}), None, 21., json!(21))]
    #[case(json!({"type": "temperature", "min": 15.56, "max": 32.22, "step": 1}), None, 50., json!(32))]
    #[case(json!({"type": "number", "min": 0, "max": 10, "step": 0.5}), None, 2.3, json!(2.5))]
    #[case(json!({"type": "int", "min": 0, "max": 10}), None, 4.4, json!(4))]
    #[case(json!({"type": "number", "min": 0, "max": 72000, "step": 1800}), Some(Unit::Seconds), 60., json!(3600))]
    #[case(json!({"type": "number", "min": 0, "max": 72000, "step": 1800}), Some(Unit::Seconds), 50., json!(3600))]
    #[case(json!({"type": "number", "min": 0, "max": 72000, "step": 1800}), Some(Unit::Seconds), 2000., json!(72000))]
    #[case(json!({"type": "number", "min": 0, "max": 72000, "step": 1800}), Some(Unit::Seconds), -1., json!(-1))]
    fn format_number_values(
        #[case] cap: Value,
        #[case] unit: Option<Unit>,
        #[case] value: f64,
        #[case] expected: Value,
    ) {
        assert_eq!(
            Ok(expected),
            format_command_value(&capability(cap), unit, &WriteValue::Number(value))
        );
    }

    #[test]
    fn format_text_uses_canonical_case() {
        let cap = capability(json!({"type": "string", "values": {"COOL": {}, "FANONLY": {}}}));
        assert_eq!(
            Ok(json!("FANONLY")),
            format_command_value(&cap, None, &WriteValue::Text("fanOnly".into()))
        );
    }

    #[test]
    fn format_unknown_text_fails() {
        let cap = capability(json!({"type": "string", "values": {"COOL": {}}}));
        let result = format_command_value(&cap, None, &WriteValue::Text("HEAT".into()));
        assert!(matches!(result, Err(CommandError::CommandValidation(_))));
    }

    #[test]
    fn format_free_text() {
        let cap = capability(json!({"type": "string", "access": "readwrite"}));
        assert_eq!(
            Ok(json!("hello")),
            format_command_value(&cap, None, &WriteValue::Text("hello".into()))
        );
    }

    #[test]
    fn root_attribute_command() {
        assert_eq!(
            Ok(json!({"cavityLight": true})),
            build_command("", "cavityLight", json!(true), None)
        );
    }

    #[test]
    fn user_selections_command_adds_program() {
        let reported = json!({"userSelections": {"programUID": "COTTON_PR", "temperature": 40}});
        assert_eq!(
            Ok(json!({"userSelections": {"programUID": "COTTON_PR", "spinSpeed": 800}})),
            build_command(
                "userSelections",
                "spinSpeed",
                json!(800),
                reported.as_object()
            )
        );
    }

    #[test]
    fn latam_command_copies_block() {
        let reported = json!({"latamUserSelections": {"programUID": "P1", "temperature": 40, "rinse": 1}});
        assert_eq!(
            Ok(json!({"latamUserSelections": {"programUID": "P1", "temperature": 60, "rinse": 1}})),
            build_command(
                "latamUserSelections",
                "temperature",
                json!(60),
                reported.as_object()
            )
        );
    }

    #[test]
    fn latam_command_without_block_fails() {
        let reported = json!({});
        let result = build_command("latamUserSelections", "temperature", json!(60), reported.as_object());
        assert!(matches!(result, Err(CommandError::Unexpected(_))));
    }

    #[test]
    fn nested_source_command() {
        assert_eq!(
            Ok(json!({"networkInterface": {"otaState": "UPDATE"}})),
            build_command("networkInterface", "otaState", json!("UPDATE"), None)
        );
        assert_eq!(
            Ok(json!({"a": {"b": {"c": 1}}})),
            build_command("a/b", "c", json!(1), None)
        );
    }

    #[rstest]
    #[case("latamUserSelections", true)]
    #[case("tdUserSelections", true)]
    #[case("userSelections", false)]
    #[case("", false)]
    #[case("networkInterface", false)]
    fn retry_for_user_selection_wrappers(#[case] source: &str, #[case] expected: bool) {
        let reported = json!({"userSelections": {"programUID": "P1"}});
        let retry = retry_command(source, "temperature", json!(60), reported.as_object());
        assert_eq!(expected, retry.is_some());
        if let Some(retry) = retry {
            assert_eq!(
                json!({"userSelections": {"programUID": "P1", "temperature": 60}}),
                retry
            );
        }
    }

    #[rstest]
    #[case(json!({"cavityLight": true}), "", "cavityLight", Some(json!(true)))]
    #[case(json!({"userSelections": {"programUID": "P", "t": 4}}), "userSelections", "t", Some(json!(4)))]
    #[case(json!({"a": {"b": {"c": 1}}}), "a/b", "c", Some(json!(1)))]
    #[case(json!({"a": 1}), "", "b", None)]
    fn value_of_command(
        #[case] command: Value,
        #[case] source: &str,
        #[case] attr: &str,
        #[case] expected: Option<Value>,
    ) {
        assert_eq!(expected, command_value_of(&command, source, attr));
    }
}
