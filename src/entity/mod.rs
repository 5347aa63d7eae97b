// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Appliance entities.
//!
//! Every entity kind is a small struct around an [`EntityBase`], which holds the entity
//! metadata, the latest appliance state snapshot and the last-known-good value. Entities never
//! modify the appliance state, they only read from the snapshot handed to them with
//! [`EntityBase::update`].

mod binary_sensor;
mod button;
pub mod command;
pub mod identity;
mod number;
mod select;
mod sensor;
mod switch;
mod text;

pub use binary_sensor::BinarySensorEntity;
pub use button::ButtonEntity;
pub use number::NumberEntity;
pub use select::SelectEntity;
pub use sensor::SensorEntity;
pub use switch::SwitchEntity;
pub use text::TextEntity;

use crate::capability::{Access, CapabilityDescriptor, EntityKind};
use crate::catalog::{CatalogEntry, DeviceClass, EntityCategory, Unit};
use crate::errors::CommandError;
use crate::naming::{category_of, leaf_of};
use crate::util::json::{get_path, is_truthy, number_value};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Current value of an entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EntityValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Unknown,
}

impl EntityValue {
    pub fn is_unknown(&self) -> bool {
        matches!(self, EntityValue::Unknown)
    }
}

/// Value of a write request.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteValue {
    Bool(bool),
    Number(f64),
    Text(String),
    /// Button press.
    Press,
}

/// Entity value retrieval from the appliance state.
pub trait Readable {
    /// Current value. Falls back to the last known value if the state doesn't contain it.
    fn read(&mut self) -> EntityValue;
}

/// Entity accepting commands.
pub trait Writable {
    /// Format a requested value into the appliance command value of the entity attribute.
    fn command_value(&self, value: &WriteValue) -> Result<Value, CommandError>;
}

/// Common entity data.
#[derive(Debug, Clone)]
pub struct EntityBase {
    /// Owning appliance.
    pub pnc_id: String,
    /// Full attribute path.
    pub path: String,
    /// Leaf attribute name.
    pub attr: String,
    /// Attribute category, empty for root attributes.
    pub source: String,
    pub name: String,
    pub capability: CapabilityDescriptor,
    pub catalog_entry: Option<CatalogEntry>,
    pub unit: Option<Unit>,
    pub device_class: Option<DeviceClass>,
    pub icon: Option<String>,
    pub entity_category: Option<EntityCategory>,
    pub unique_id: String,
    pub suggested_object_id: String,
    snapshot: Arc<Value>,
    cached: Option<EntityValue>,
}

impl EntityBase {
    pub fn new(
        pnc_id: impl Into<String>,
        capability: CapabilityDescriptor,
        catalog_entry: Option<CatalogEntry>,
        snapshot: Arc<Value>,
    ) -> Self {
        let path = capability.path.clone();
        Self {
            pnc_id: pnc_id.into(),
            attr: leaf_of(&path).to_string(),
            source: category_of(&path).to_string(),
            path,
            name: String::new(),
            capability,
            catalog_entry,
            unit: None,
            device_class: None,
            icon: None,
            entity_category: None,
            unique_id: String::new(),
            suggested_object_id: String::new(),
            snapshot,
            cached: None,
        }
    }

    /// Hand over a new appliance state snapshot.
    pub fn update(&mut self, snapshot: Arc<Value>) {
        self.snapshot = snapshot;
    }

    pub fn snapshot(&self) -> &Value {
        &self.snapshot
    }

    /// Reported state tree of the current snapshot.
    pub fn reported(&self) -> Option<&Map<String, Value>> {
        self.snapshot
            .get("properties")?
            .get("reported")?
            .as_object()
    }

    /// Extract the attribute value from the state snapshot.
    ///
    /// Push updates may deliver attributes at the root level of the state, polled states contain
    /// them in `properties.reported`. The root level is used if it contains the source category
    /// or the attribute.
    pub fn extract_value(&self) -> Option<Value> {
        let root = self.snapshot.as_object()?;
        let use_root = (!self.source.is_empty()
            && get_path(root, &self.source).is_some_and(|v| !v.is_null()))
            || root.get(&self.attr).is_some_and(is_truthy);
        let scope = if use_root {
            root
        } else {
            self.reported()?
        };

        let value = if self.source.is_empty() {
            scope.get(&self.attr)
        } else {
            get_path(scope, &self.source)
                .filter(|category| is_truthy(category))?
                .get(&self.attr)
        };
        value.filter(|v| !v.is_null()).cloned()
    }

    /// Value of another reported attribute.
    pub fn state_attr(&self, path: &str) -> Option<&Value> {
        get_path(self.reported()?, path).filter(|v| !v.is_null())
    }

    /// Value of the catalog state mapping path, if defined.
    pub fn state_mapping_value(&self) -> Option<Value> {
        let mapping = self.catalog_entry.as_ref()?.state_mapping.as_deref()?;
        self.state_attr(mapping).cloned()
    }

    /// Default value of a `constant` capability.
    pub fn constant_default(&self) -> Option<Value> {
        if self.capability.access == Some(Access::Constant) {
            self.capability.default.clone()
        } else {
            None
        }
    }

    /// Remember a successfully read value and return it.
    fn remember(&mut self, value: EntityValue) -> EntityValue {
        if !value.is_unknown() {
            self.cached = Some(value.clone());
        }
        value
    }

    /// Last known value.
    fn cached(&self) -> EntityValue {
        self.cached.clone().unwrap_or(EntityValue::Unknown)
    }

    /// Unit shown to the user: seconds are presented as minutes.
    pub fn display_unit(&self) -> Option<Unit> {
        match self.unit {
            Some(Unit::Seconds) => Some(Unit::Minutes),
            unit => unit,
        }
    }

    /// Check if the appliance accepts remote commands.
    pub fn is_remote_control_enabled(&self) -> bool {
        command::remote_control_block(&self.snapshot).is_none()
    }

    pub fn is_enabled_by_default(&self) -> bool {
        self.catalog_entry
            .as_ref()
            .map(|e| e.entity_registry_enabled_default)
            .unwrap_or(true)
    }
}

/// Convert a JSON state value into an entity value.
pub(crate) fn to_entity_value(value: &Value) -> EntityValue {
    match value {
        Value::Null => EntityValue::Unknown,
        Value::Bool(b) => EntityValue::Bool(*b),
        Value::Number(_) => number_value(value)
            .map(EntityValue::Number)
            .unwrap_or(EntityValue::Unknown),
        Value::String(s) => EntityValue::Text(s.clone()),
        other => EntityValue::Text(other.to_string()),
    }
}

/// Round to the given number of decimals.
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// An entity of one of the supported kinds.
#[derive(Debug, Clone)]
pub enum ApplianceEntity {
    BinarySensor(BinarySensorEntity),
    Button(ButtonEntity),
    Number(NumberEntity),
    Select(SelectEntity),
    Sensor(SensorEntity),
    Switch(SwitchEntity),
    Text(TextEntity),
}

impl ApplianceEntity {
    /// Create an entity of the given kind. `command` is the value sent by a button.
    pub fn new(kind: EntityKind, base: EntityBase, command: Option<String>) -> Self {
        match kind {
            EntityKind::BinarySensor => Self::BinarySensor(BinarySensorEntity::new(base)),
            EntityKind::Button => Self::Button(ButtonEntity::new(base, command.unwrap_or_default())),
            EntityKind::Number => Self::Number(NumberEntity::new(base)),
            EntityKind::Select => Self::Select(SelectEntity::new(base)),
            EntityKind::Sensor => Self::Sensor(SensorEntity::new(base)),
            EntityKind::Switch => Self::Switch(SwitchEntity::new(base)),
            EntityKind::Text => Self::Text(TextEntity::new(base)),
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Self::BinarySensor(_) => EntityKind::BinarySensor,
            Self::Button(_) => EntityKind::Button,
            Self::Number(_) => EntityKind::Number,
            Self::Select(_) => EntityKind::Select,
            Self::Sensor(_) => EntityKind::Sensor,
            Self::Switch(_) => EntityKind::Switch,
            Self::Text(_) => EntityKind::Text,
        }
    }

    pub fn base(&self) -> &EntityBase {
        match self {
            Self::BinarySensor(e) => &e.base,
            Self::Button(e) => &e.base,
            Self::Number(e) => &e.base,
            Self::Select(e) => &e.base,
            Self::Sensor(e) => &e.base,
            Self::Switch(e) => &e.base,
            Self::Text(e) => &e.base,
        }
    }

    pub fn base_mut(&mut self) -> &mut EntityBase {
        match self {
            Self::BinarySensor(e) => &mut e.base,
            Self::Button(e) => &mut e.base,
            Self::Number(e) => &mut e.base,
            Self::Select(e) => &mut e.base,
            Self::Sensor(e) => &mut e.base,
            Self::Switch(e) => &mut e.base,
            Self::Text(e) => &mut e.base,
        }
    }

    pub fn unique_id(&self) -> &str {
        &self.base().unique_id
    }

    /// Current value. Buttons are stateless and always return [`EntityValue::Unknown`].
    pub fn read(&mut self) -> EntityValue {
        match self {
            Self::BinarySensor(e) => e.read(),
            Self::Button(_) => EntityValue::Unknown,
            Self::Number(e) => e.read(),
            Self::Select(e) => e.read(),
            Self::Sensor(e) => e.read(),
            Self::Switch(e) => e.read(),
            Self::Text(e) => e.read(),
        }
    }

    /// Appliance command value for a write request.
    pub fn command_value(&self, value: &WriteValue) -> Result<Value, CommandError> {
        match self {
            Self::Button(e) => e.command_value(value),
            Self::Number(e) => e.command_value(value),
            Self::Select(e) => e.command_value(value),
            Self::Switch(e) => e.command_value(value),
            Self::Text(e) => e.command_value(value),
            Self::BinarySensor(_) | Self::Sensor(_) => {
                Err(CommandError::NotWritable(self.unique_id().to_string()))
            }
        }
    }

    /// Host facing description of the entity.
    pub fn descriptor(&self) -> EntityDescriptor {
        let base = self.base();
        let mut descriptor = EntityDescriptor {
            unique_id: base.unique_id.clone(),
            suggested_object_id: base.suggested_object_id.clone(),
            appliance_id: base.pnc_id.clone(),
            attribute: base.path.clone(),
            kind: self.kind(),
            name: base.name.clone(),
            entity_category: base.entity_category.map(|c| c.to_string()),
            device_class: base.device_class.map(|c| c.to_string()),
            unit: base.display_unit().map(|u| u.to_string()),
            icon: base.icon.clone(),
            enabled_by_default: base.is_enabled_by_default(),
            options: None,
            min: None,
            max: None,
            step: None,
        };
        match self {
            Self::Select(e) => descriptor.options = Some(e.options()),
            Self::Number(e) => {
                descriptor.min = Some(e.min());
                descriptor.max = Some(e.max());
                descriptor.step = Some(e.step());
            }
            _ => {}
        }
        descriptor
    }
}

/// Entity description for the host framework.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityDescriptor {
    pub unique_id: String,
    pub suggested_object_id: String,
    pub appliance_id: String,
    pub attribute: String,
    pub kind: EntityKind,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub enabled_by_default: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
}
