// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Static attribute catalogs.
//!
//! A catalog entry defines how a known attribute is presented: device class, unit, icon, naming,
//! and optionally a capability definition for attributes the appliance API doesn't declare
//! itself. Model specific tables replace base table entries with the same key.

mod air_conditioner;
mod base;
mod purifier;

use crate::capability::EntityKind;
use lazy_static::lazy_static;
use log::error;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use strum::{AsRefStr, Display, EnumString};

/// Attribute path → catalog entry.
pub type Catalog = BTreeMap<String, CatalogEntry>;

lazy_static! {
    static ref CATALOG_BASE: Catalog = load_table("base", base::table());
    static ref CATALOG_AIR_CONDITIONER: Catalog =
        load_table("air conditioner", air_conditioner::table());
    static ref CATALOG_PURIFIER_A9: Catalog = load_table("purifier A9", purifier::table());
}

/// Appliance type of air conditioners in the appliance list.
const APPLIANCE_TYPE_AC: &str = "AC";

/// Resolved catalog for an appliance model.
pub fn catalog_for(model: &str, appliance_type: Option<&str>) -> Catalog {
    let mut catalog = CATALOG_BASE.clone();
    let model_table: Option<&Catalog> = match model {
        "PUREA9" => Some(&CATALOG_PURIFIER_A9),
        "EXP34U339CW" => Some(&CATALOG_AIR_CONDITIONER),
        _ if appliance_type == Some(APPLIANCE_TYPE_AC) => Some(&CATALOG_AIR_CONDITIONER),
        _ => None,
    };
    if let Some(table) = model_table {
        for (key, entry) in table.iter() {
            catalog.insert(key.clone(), entry.clone());
        }
    }
    catalog
}

fn load_table(name: &str, table: Value) -> Catalog {
    serde_json::from_value(table).unwrap_or_else(|e| {
        // embedded tables are fixed at build time: an invalid one is a programming error
        if cfg!(debug_assertions) {
            panic!("Invalid {name} catalog definition: {e}");
        }
        error!("Invalid {name} catalog definition: {e}");
        Catalog::default()
    })
}

/// Static definition of one attribute.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CatalogEntry {
    /// Capability definition, used as a whole if the appliance doesn't declare the attribute.
    pub capability_info: Map<String, Value>,
    pub device_class: Option<DeviceClass>,
    pub unit: Option<Unit>,
    pub entity_category: Option<EntityCategory>,
    /// Display name overriding the generated name.
    pub friendly_name: Option<String>,
    pub icon: Option<String>,
    /// Icon per command value of multi-value buttons.
    pub entity_icons_value_map: HashMap<String, String>,
    /// Use the command value as name for multi-value buttons.
    pub entity_value_named: bool,
    /// Alternative state path if the attribute itself isn't reported.
    pub state_mapping: Option<String>,
    /// Invert the state of a binary sensor.
    pub state_invert: bool,
    pub entity_registry_enabled_default: bool,
    /// Explicit entity kind, overriding the classifier and the device class.
    pub entity_platform: Option<EntityKind>,
    /// Label for numeric codes of enumerated sensors.
    pub value_mapping: HashMap<String, String>,
}

impl Default for CatalogEntry {
    fn default() -> Self {
        Self {
            capability_info: Map::new(),
            device_class: None,
            unit: None,
            entity_category: None,
            friendly_name: None,
            icon: None,
            entity_icons_value_map: HashMap::new(),
            entity_value_named: false,
            state_mapping: None,
            state_invert: false,
            entity_registry_enabled_default: true,
            entity_platform: None,
            value_mapping: HashMap::new(),
        }
    }
}

impl CatalogEntry {
    /// Check if the catalog defines the attribute with `constant` access.
    pub fn is_constant(&self) -> bool {
        self.capability_info.get("access").and_then(Value::as_str) == Some("constant")
    }

    /// Default value of a constant attribute.
    pub fn constant_default(&self) -> Option<&Value> {
        if self.is_constant() {
            self.capability_info.get("default").filter(|v| !v.is_null())
        } else {
            None
        }
    }
}

/// Entity category of secondary entities. No category means a primary entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, EnumString, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EntityCategory {
    Config,
    Diagnostic,
}

/// Unit of measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, EnumString, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    #[strum(serialize = "°C")]
    Celsius,
    #[strum(serialize = "°F")]
    Fahrenheit,
    #[strum(serialize = "%")]
    Percentage,
    #[strum(serialize = "s")]
    Seconds,
    #[strum(serialize = "min")]
    Minutes,
    #[strum(serialize = "h")]
    Hours,
    #[strum(serialize = "µg/m³")]
    MicrogramsPerCubicMeter,
    #[strum(serialize = "ppm")]
    PartsPerMillion,
    #[strum(serialize = "ppb")]
    PartsPerBillion,
    #[strum(serialize = "dBm")]
    Dbm,
    #[strum(serialize = "kg")]
    Kilograms,
    #[strum(serialize = "L")]
    Liters,
}

/// Device class token, grouped by the entity kind it belongs to.
///
/// The group of a device class forces the entity kind, see [`DeviceClass::entity_kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    BinarySensor(BinarySensorDeviceClass),
    Button(ButtonDeviceClass),
    Number(NumberDeviceClass),
    Sensor(SensorDeviceClass),
    Switch(SwitchDeviceClass),
}

impl DeviceClass {
    pub fn entity_kind(&self) -> EntityKind {
        match self {
            DeviceClass::BinarySensor(_) => EntityKind::BinarySensor,
            DeviceClass::Button(_) => EntityKind::Button,
            DeviceClass::Number(_) => EntityKind::Number,
            DeviceClass::Sensor(_) => EntityKind::Sensor,
            DeviceClass::Switch(_) => EntityKind::Switch,
        }
    }
}

impl std::fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let token: &str = match self {
            DeviceClass::BinarySensor(c) => c.as_ref(),
            DeviceClass::Button(c) => c.as_ref(),
            DeviceClass::Number(c) => c.as_ref(),
            DeviceClass::Sensor(c) => c.as_ref(),
            DeviceClass::Switch(c) => c.as_ref(),
        };
        f.write_str(token)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, EnumString, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BinarySensorDeviceClass {
    Connectivity,
    Door,
    Lock,
    Opening,
    Plug,
    Power,
    Problem,
    Running,
    Safety,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, EnumString, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ButtonDeviceClass {
    Identify,
    Restart,
    Update,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, EnumString, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NumberDeviceClass {
    Duration,
    Humidity,
    Power,
    Temperature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, EnumString, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SensorDeviceClass {
    CarbonDioxide,
    Duration,
    Enum,
    Humidity,
    Pm1,
    Pm10,
    Pm25,
    SignalStrength,
    Temperature,
    Timestamp,
    VolatileOrganicCompoundsParts,
    Water,
    Weight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, EnumString, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SwitchDeviceClass {
    Outlet,
    Switch,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn static_tables_are_valid() {
        assert!(!CATALOG_BASE.is_empty(), "base catalog must not be empty");
        assert!(!CATALOG_AIR_CONDITIONER.is_empty());
        assert!(!CATALOG_PURIFIER_A9.is_empty());
    }

    #[test]
    #[should_panic(expected = "Invalid broken catalog definition")]
    fn invalid_table_fails_in_debug_builds() {
        load_table("broken", json!({"doorState": {"entity_value_named": "yes"}}));
    }

    #[test]
    fn unknown_model_uses_base_table() {
        let catalog = catalog_for("UNKNOWN", None);
        assert_eq!(CATALOG_BASE.len(), catalog.len());
        assert!(!catalog.contains_key("targetTemperatureC"));
    }

    #[rstest]
    #[case("EXP34U339CW", None)]
    #[case("ANY_OTHER", Some("AC"))]
    fn air_conditioner_catalog(#[case] model: &str, #[case] appliance_type: Option<&str>) {
        let catalog = catalog_for(model, appliance_type);
        let entry = catalog.get("targetTemperatureC").expect("AC entry");
        assert_eq!(
            Some(DeviceClass::Number(NumberDeviceClass::Temperature)),
            entry.device_class
        );
        assert_eq!(Some(Unit::Celsius), entry.unit);
        assert_eq!(Some("mdi:thermometer"), entry.icon.as_deref());
        // base entries are still present
        assert!(catalog.contains_key("connectivityState"));
    }

    #[test]
    fn model_entries_replace_base_entries() {
        let catalog = catalog_for("EXP34U339CW", None);
        let base = CATALOG_BASE
            .get("temperatureRepresentation")
            .expect("base entry");
        let ac = CATALOG_AIR_CONDITIONER
            .get("temperatureRepresentation")
            .expect("ac entry");
        assert!(base.is_constant());
        assert!(!ac.is_constant());
        assert_eq!(Some(ac), catalog.get("temperatureRepresentation"));
    }

    #[test]
    fn purifier_catalog() {
        let catalog = catalog_for("PUREA9", Some("PUREA9"));
        let entry = catalog.get("FilterType").expect("filter type");
        assert_eq!(
            Some("CLEAN Ultrafine particle filter"),
            entry.value_mapping.get("49").map(|s| s.as_str())
        );
        assert_eq!(Some(EntityCategory::Diagnostic), entry.entity_category);
    }

    #[test]
    fn entry_defaults() {
        let entry: CatalogEntry = serde_json::from_value(json!({})).expect("valid entry");
        assert!(entry.entity_registry_enabled_default);
        assert!(!entry.entity_value_named);
        assert!(!entry.state_invert);
        assert!(entry.capability_info.is_empty());
    }

    #[rstest]
    #[case(json!({"binary_sensor": "door"}), EntityKind::BinarySensor, "door")]
    #[case(json!({"sensor": "pm25"}), EntityKind::Sensor, "pm25")]
    #[case(json!({"number": "temperature"}), EntityKind::Number, "temperature")]
    #[case(json!({"switch": "switch"}), EntityKind::Switch, "switch")]
    #[case(json!({"button": "restart"}), EntityKind::Button, "restart")]
    fn device_class_forces_kind(
        #[case] value: Value,
        #[case] kind: EntityKind,
        #[case] token: &str,
    ) {
        let class: DeviceClass = serde_json::from_value(value).expect("device class");
        assert_eq!(kind, class.entity_kind());
        assert_eq!(token, class.to_string());
    }

    #[test]
    fn constant_default() {
        let entry: CatalogEntry = serde_json::from_value(json!({
            "capability_info": {"access": "constant", "type": "string", "default": "NORMAL"}
        }))
        .expect("valid entry");
        assert!(entry.is_constant());
        assert_eq!(Some(&json!("NORMAL")), entry.constant_default());
    }
}
