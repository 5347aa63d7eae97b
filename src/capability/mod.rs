// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Appliance capability descriptors and their mapping to entity kinds.

pub mod classifier;
pub mod resolver;

pub use classifier::classify;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;
use strum::{AsRefStr, Display, EnumString};

/// Data type of a capability as declared by the appliance API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ValueType {
    Boolean,
    String,
    Number,
    Int,
    Temperature,
    Alert,
    /// Any other declared type, e.g. `complex`.
    Unspecified,
}

/// Access mode of a capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Access {
    Read,
    #[strum(serialize = "readwrite")]
    ReadWrite,
    Write,
    Constant,
    /// Declared but unknown access mode.
    Unknown,
}

/// User facing entity type derived from a capability.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    BinarySensor,
    Button,
    Number,
    Select,
    Sensor,
    Switch,
    Text,
}

/// Capability of one appliance attribute.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapabilityDescriptor {
    /// Attribute path, e.g. `userSelections/analogTemperature`.
    pub path: String,
    pub value_type: Option<ValueType>,
    pub access: Option<Access>,
    /// Allowed values with per-value metadata, in declaration order.
    pub values: Option<Map<String, Value>>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub step: Option<f64>,
    pub default: Option<Value>,
}

impl CapabilityDescriptor {
    /// Parse a capability JSON object as returned by the appliance API or defined in a catalog.
    ///
    /// Missing or non-string `type` and `access` fields are left empty, unknown values are
    /// mapped to [`ValueType::Unspecified`] and [`Access::Unknown`].
    pub fn parse(path: impl Into<String>, capability: &Value) -> Self {
        let field = |name: &str| capability.get(name);
        let number = |name: &str| field(name).and_then(Value::as_f64);

        Self {
            path: path.into(),
            value_type: field("type")
                .and_then(Value::as_str)
                .map(|t| ValueType::from_str(t).unwrap_or(ValueType::Unspecified)),
            access: field("access")
                .and_then(Value::as_str)
                .map(|a| Access::from_str(a).unwrap_or(Access::Unknown)),
            values: field("values").and_then(Value::as_object).cloned(),
            min: number("min"),
            max: number("max"),
            step: number("step"),
            default: field("default").filter(|v| !v.is_null()).cloned(),
        }
    }

    /// Allowed value keys in declaration order.
    pub fn value_keys(&self) -> Vec<String> {
        self.values
            .as_ref()
            .map(|values| values.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn has_values(&self) -> bool {
        self.values.as_ref().is_some_and(|v| !v.is_empty())
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self.value_type,
            Some(ValueType::Number) | Some(ValueType::Int) | Some(ValueType::Temperature)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_full_descriptor() {
        let cap = CapabilityDescriptor::parse(
            "targetTemperatureC",
            &json!({
                "access": "readwrite",
                "type": "temperature",
                "min": 15.56,
                "max": 32.22,
                "step": 1,
                "default": 15.56
            }),
        );

        assert_eq!("targetTemperatureC", cap.path);
        assert_eq!(Some(ValueType::Temperature), cap.value_type);
        assert_eq!(Some(Access::ReadWrite), cap.access);
        assert_eq!(Some(15.56), cap.min);
        assert_eq!(Some(32.22), cap.max);
        assert_eq!(Some(1.0), cap.step);
        assert_eq!(Some(json!(15.56)), cap.default);
        assert!(cap.values.is_none());
    }

    #[test]
    fn parse_unknown_type_and_access() {
        let cap = CapabilityDescriptor::parse("x", &json!({"access": "readonly", "type": "complex"}));
        assert_eq!(Some(ValueType::Unspecified), cap.value_type);
        assert_eq!(Some(Access::Unknown), cap.access);
    }

    #[test]
    fn parse_keeps_value_order() {
        let cap = CapabilityDescriptor::parse(
            "mode",
            &json!({"access": "readwrite", "type": "string", "values": {"OFF": {}, "COOL": {}, "AUTO": {}}}),
        );
        assert_eq!(vec!["OFF", "COOL", "AUTO"], cap.value_keys());
        assert!(cap.has_values());
    }

    #[test]
    fn parse_missing_fields() {
        let cap = CapabilityDescriptor::parse("x", &json!({"values": {}}));
        assert_eq!(None, cap.value_type);
        assert_eq!(None, cap.access);
        assert!(!cap.has_values());
    }
}
