// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

use crate::catalog::Unit;
use crate::entity::command::format_command_value;
use crate::entity::{EntityBase, EntityValue, Readable, Writable, WriteValue, round_to};
use crate::errors::CommandError;
use crate::util::json::number_value;
use crate::util::time_seconds_to_minutes;
use serde_json::Value;

/// Default value marker of time attributes without a set time.
const INVALID_OR_NOT_SET_TIME: &str = "INVALID_OR_NOT_SET_TIME";

#[derive(Debug, Clone)]
pub struct NumberEntity {
    pub(super) base: EntityBase,
}

impl NumberEntity {
    pub fn new(base: EntityBase) -> Self {
        Self { base }
    }

    fn is_time(&self) -> bool {
        self.base.unit == Some(Unit::Seconds)
    }

    /// Convert a native value into the presented value.
    fn present(&self, value: f64) -> f64 {
        if self.is_time() {
            time_seconds_to_minutes(value)
        } else {
            value
        }
    }

    pub fn min(&self) -> f64 {
        self.present(self.base.capability.min.unwrap_or(0.0))
    }

    pub fn max(&self) -> f64 {
        let default = match self.base.unit {
            Some(Unit::Celsius) => 300.0,
            _ => 100.0,
        };
        self.present(self.base.capability.max.unwrap_or(default))
    }

    pub fn step(&self) -> f64 {
        self.present(self.base.capability.step.unwrap_or(1.0))
    }

    fn default_value(&self) -> Option<f64> {
        match self.base.capability.default.as_ref()? {
            Value::String(s) if s == INVALID_OR_NOT_SET_TIME => Some(self.min()),
            value => number_value(value).map(|v| self.present(v)),
        }
    }
}

impl Readable for NumberEntity {
    fn read(&mut self) -> EntityValue {
        let value = self
            .base
            .extract_value()
            .as_ref()
            .and_then(number_value)
            .map(|v| self.present(v))
            .or_else(|| self.default_value());

        let Some(mut value) = value else {
            return self.base.cached();
        };
        if self.base.unit == Some(Unit::Celsius) {
            value = round_to(value, 2);
        }
        if self.is_time() {
            value = value.max(0.0);
        }
        self.base.remember(EntityValue::Number(value))
    }
}

impl Writable for NumberEntity {
    fn command_value(&self, value: &WriteValue) -> Result<Value, CommandError> {
        let value = match value {
            WriteValue::Text(text) => text
                .trim()
                .parse::<f64>()
                .map(WriteValue::Number)
                .map_err(|_| {
                    CommandError::CommandValidation(format!(
                        "'{text}' is not a number for '{}'",
                        self.base.path
                    ))
                })?,
            other => other.clone(),
        };
        format_command_value(&self.base.capability, self.base.unit, &value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::tests::entity_base;
    use rstest::rstest;
    use serde_json::json;
    use std::sync::Arc;

    fn start_time(reported: Value) -> NumberEntity {
        let mut base = entity_base(
            "startTime",
            json!({
                "access": "readwrite",
                "type": "number",
                "min": 0,
                "max": 72000,
                "step": 1800,
                "default": "INVALID_OR_NOT_SET_TIME"
            }),
            json!({"properties": {"reported": reported}}),
        );
        base.unit = Some(Unit::Seconds);
        NumberEntity::new(base)
    }

    #[test]
    fn time_bounds_are_shown_in_minutes() {
        let entity = start_time(json!({}));
        assert_eq!(0., entity.min());
        assert_eq!(1200., entity.max());
        assert_eq!(30., entity.step());
    }

    #[rstest]
    #[case(json!({"startTime": 3600}), 60.)]
    #[case(json!({"startTime": -1}), 0.)]
    #[case(json!({"startTime": "INVALID_OR_NOT_SET_TIME"}), 0.)]
    #[case(json!({}), 0.)]
    fn read_start_time(#[case] reported: Value, #[case] expected: f64) {
        let mut entity = start_time(reported);
        assert_eq!(EntityValue::Number(expected), entity.read());
    }

    #[test]
    fn zero_is_a_value() {
        let mut base = entity_base(
            "targetLevel",
            json!({"access": "readwrite", "type": "number", "default": 5}),
            json!({"properties": {"reported": {"targetLevel": 0}}}),
        );
        base.unit = None;
        let mut entity = NumberEntity::new(base);
        assert_eq!(EntityValue::Number(0.), entity.read());
    }

    #[rstest]
    #[case(None, 100.)]
    #[case(Some(Unit::Celsius), 300.)]
    #[case(Some(Unit::Percentage), 100.)]
    fn default_max(#[case] unit: Option<Unit>, #[case] expected: f64) {
        let mut base = entity_base(
            "targetTemperatureC",
            json!({"access": "readwrite", "type": "temperature"}),
            json!({}),
        );
        base.unit = unit;
        let entity = NumberEntity::new(base);
        assert_eq!(expected, entity.max());
        assert_eq!(0., entity.min());
        assert_eq!(1., entity.step());
    }

    #[test]
    fn celsius_is_rounded_and_cached() {
        let mut base = entity_base(
            "targetTemperatureC",
            json!({"access": "readwrite", "type": "temperature", "min": 15.56, "max": 32.22, "step": 1}),
            json!({"properties": {"reported": {"targetTemperatureC": 22.2222}}}),
        );
        base.unit = Some(Unit::Celsius);
        let mut entity = NumberEntity::new(base);
        assert_eq!(EntityValue::Number(22.22), entity.read());

        entity.base.update(Arc::new(json!({"properties": {"reported": {}}})));
        assert_eq!(EntityValue::Number(22.22), entity.read());
    }

    #[rstest]
    #[case(WriteValue::Number(60.), Ok(json!(3600)))]
    #[case(WriteValue::Text("90".into()), Ok(json!(5400)))]
    fn command_value_in_seconds(
        #[case] value: WriteValue,
        #[case] expected: Result<Value, CommandError>,
    ) {
        let entity = start_time(json!({}));
        assert_eq!(expected, entity.command_value(&value));
    }

    #[test]
    fn command_value_rejects_text() {
        let entity = start_time(json!({}));
        let result = entity.command_value(&WriteValue::Text("soon".into()));
        assert!(matches!(result, Err(CommandError::CommandValidation(_))));
    }
}
