// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Appliance state model and entity derivation.
//!
//! An [`Appliance`] owns the latest state snapshot, the capability tree and the derived entities.
//! The snapshot is an immutable [`Arc`] which is replaced on every update and handed to all
//! entities, so readers never observe a partially merged state.

use crate::api::ApplianceSummary;
use crate::capability::resolver::{
    STATIC_ATTRIBUTES, inject_static_attribute, resolve, sources_list,
};
use crate::capability::{Access, EntityKind, ValueType, classify};
use crate::catalog::{
    Catalog, CatalogEntry, DeviceClass, NumberDeviceClass, SensorDeviceClass, Unit, catalog_for,
};
use crate::entity::identity::{EntityRegistry, IdentityScheme, suggested_object_id};
use crate::entity::{ApplianceEntity, EntityBase, EntityDescriptor};
use crate::naming::{
    binary_sensor_friendly_name, capitalize, display_name, has_vendor_prefix, leaf_of,
    normalize_key,
};
use crate::util::json::{deep_merge, get_path, number_value, set_path};
use log::{debug, warn};
use serde_json::{Map, Value, json};
use std::collections::HashSet;
use std::sync::Arc;

/// Attributes which may stop updating at the end of a program cycle.
pub const TIME_ENTITIES_TO_UPDATE: [&str; 1] = ["timeToEnd"];

pub struct Appliance {
    pub id: String,
    pub name: String,
    pub brand: String,
    pub model: String,
    pub appliance_type: Option<String>,
    state: Arc<Value>,
    capabilities: Map<String, Value>,
    catalog: Catalog,
    entities: Vec<ApplianceEntity>,
}

impl Appliance {
    /// Create an appliance from its list entry, initial state and capability tree.
    ///
    /// Entities are created with [`Appliance::setup`].
    pub fn new(summary: &ApplianceSummary, state: Value, capabilities: Option<Value>) -> Self {
        let appliance_type = summary.appliance_type.clone().or_else(|| {
            state
                .pointer("/applianceData/modelName")
                .and_then(Value::as_str)
                .map(str::to_string)
        });
        let capabilities = match capabilities {
            Some(Value::Object(tree)) => tree,
            _ => Map::new(),
        };
        let mut appliance = Self {
            id: summary.id.clone(),
            name: summary.name.clone(),
            brand: summary.brand.clone(),
            model: summary.model.clone(),
            catalog: catalog_for(&summary.model, appliance_type.as_deref()),
            appliance_type,
            state: Arc::new(json!({"properties": {"reported": {}}})),
            capabilities,
            entities: Vec::new(),
        };
        appliance.apply_full_state(state);
        appliance
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn capabilities(&self) -> &Map<String, Value> {
        &self.capabilities
    }

    /// Current state snapshot.
    pub fn snapshot(&self) -> Arc<Value> {
        self.state.clone()
    }

    pub fn reported(&self) -> Option<&Map<String, Value>> {
        self.state.pointer("/properties/reported")?.as_object()
    }

    /// Value of a reported attribute.
    pub fn read(&self, path: &str) -> Option<&Value> {
        get_path(self.reported()?, path)
    }

    pub fn entities(&self) -> &[ApplianceEntity] {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut [ApplianceEntity] {
        &mut self.entities
    }

    pub fn entity(&self, unique_id: &str) -> Option<&ApplianceEntity> {
        self.entities.iter().find(|e| e.unique_id() == unique_id)
    }

    pub fn entity_mut(&mut self, unique_id: &str) -> Option<&mut ApplianceEntity> {
        self.entities.iter_mut().find(|e| e.unique_id() == unique_id)
    }

    pub fn descriptors(&self) -> Vec<EntityDescriptor> {
        self.entities.iter().map(ApplianceEntity::descriptor).collect()
    }

    /// Derive all entities of the appliance.
    ///
    /// Static attributes reported in the state but missing in the capability tree are added
    /// first, followed by the entities of all capability sources. Returns the number of entities.
    pub fn setup(&mut self, identity: &IdentityScheme, registry: &dyn EntityRegistry) -> usize {
        let sources = if self.capabilities.is_empty() {
            None
        } else {
            sources_list(Some(&self.capabilities))
        };
        if sources.is_none() && self.reported().is_some_and(|r| !r.is_empty()) {
            warn!("[{}] API returned no capability definition", self.id);
        }
        let sources = sources.unwrap_or_default();

        let mut entities = Vec::new();
        for path in STATIC_ATTRIBUTES {
            if sources.iter().any(|s| s == path) || self.read(path).is_none() {
                continue;
            }
            let Some(capability_info) = self.catalog.get(path).map(|e| e.capability_info.clone())
            else {
                continue;
            };
            let created = self.create_entities(path, identity, registry);
            if created.is_empty() {
                debug!("[{}] Undefined static attribute {path}", self.id);
                continue;
            }
            debug!("[{}] Adding static attribute {path}", self.id);
            inject_static_attribute(&mut self.capabilities, path, &capability_info);
            entities.extend(created);
        }

        for path in &sources {
            let created = self.create_entities(path, identity, registry);
            if created.is_empty() {
                debug!("[{}] No entity for capability {path}", self.id);
            }
            entities.extend(created);
        }

        self.entities = suppress_vendor_duplicates(&self.id, entities);
        debug!("[{}] Created {} entities", self.id, self.entities.len());
        self.entities.len()
    }

    /// Create the entities of one attribute path.
    ///
    /// Buttons create one entity per allowed value, all other kinds a single entity.
    fn create_entities(
        &self,
        path: &str,
        identity: &IdentityScheme,
        registry: &dyn EntityRegistry,
    ) -> Vec<ApplianceEntity> {
        let entry = self.catalog.get(path);
        let Some(capability) = resolve(&self.capabilities, path, entry) else {
            return Vec::new();
        };
        let mut kind = classify(&capability);

        let (mut unit, mut device_class) = if capability.value_type == Some(ValueType::Temperature)
        {
            let class = if capability.access == Some(Access::ReadWrite) {
                DeviceClass::Number(NumberDeviceClass::Temperature)
            } else {
                DeviceClass::Sensor(SensorDeviceClass::Temperature)
            };
            (Some(Unit::Celsius), Some(class))
        } else {
            (None, None)
        };
        let mut entity_category = None;
        let mut icon = None;
        if let Some(entry) = entry {
            device_class = entry.device_class;
            unit = entry.unit;
            entity_category = entry.entity_category;
            icon = entry.icon.clone();
        }
        if let Some(class) = device_class {
            kind = Some(class.entity_kind());
        }
        if let Some(platform) = entry.and_then(|e| e.entity_platform) {
            kind = Some(platform);
        }
        let Some(kind) = kind else {
            return Vec::new();
        };

        let mut base = EntityBase::new(&self.id, capability, entry.cloned(), self.state.clone());
        base.unit = unit;
        base.device_class = device_class;
        base.entity_category = entity_category;
        base.icon = icon;
        base.name = entity_display_name(path, kind, entry);

        if kind != EntityKind::Button {
            let key = base.attr.clone();
            self.assign_identity(&mut base, &key, identity, registry);
            return vec![ApplianceEntity::new(kind, base, None)];
        }

        let commands = base.capability.value_keys();
        if commands.is_empty() {
            debug!("[{}] Button {path} without values", self.id);
        }
        commands
            .into_iter()
            .enumerate()
            .map(|(index, command)| {
                let mut button = base.clone();
                if let Some(entry) = entry {
                    if entry.entity_value_named {
                        button.name = command.clone();
                    }
                    if let Some(icon) = entry.entity_icons_value_map.get(&command) {
                        button.icon = Some(icon.clone());
                    }
                }
                let key = format!("{}_{command}", button.attr);
                self.assign_identity(&mut button, &key, identity, registry);
                // a button registered before the per-value split keeps its id on the first value
                if index == 0
                    && let Some(legacy) =
                        identity.registered_legacy_id(&button.attr, &button.source, &self.id, registry)
                {
                    button.unique_id = legacy;
                }
                ApplianceEntity::new(kind, button, Some(command))
            })
            .collect()
    }

    fn assign_identity(
        &self,
        base: &mut EntityBase,
        key: &str,
        identity: &IdentityScheme,
        registry: &dyn EntityRegistry,
    ) {
        base.unique_id = identity.unique_id(key, &base.source, &self.id, registry);
        base.suggested_object_id =
            suggested_object_id(&self.brand, &self.name, &base.source, key, &self.id);
    }

    /// Replace the appliance state with a full state from the API.
    ///
    /// Constant attributes missing in the new state are carried over from the previous state or
    /// initialized with their catalog default.
    pub fn apply_full_state(&mut self, state: Value) {
        let mut state = normalize_state(state);
        let previous = self.reported().cloned().unwrap_or_default();

        if let Some(reported) = state
            .pointer_mut("/properties/reported")
            .and_then(Value::as_object_mut)
        {
            for (key, entry) in self.catalog.iter().filter(|(_, e)| e.is_constant()) {
                if get_path(reported, key).is_some() {
                    continue;
                }
                if let Some(value) = get_path(&previous, key) {
                    set_path(reported, key, value.clone());
                } else if let Some(default) = entry.constant_default()
                    && !reported.is_empty()
                {
                    debug!("[{}] Initialized constant {key}: {default}", self.id);
                    set_path(reported, key, default.clone());
                }
            }
        }

        self.swap(state);
    }

    /// Merge a partial state update into the reported state.
    ///
    /// Supported formats:
    /// - `{"property": "<path>", "value": <value>}`: sets a single attribute.
    /// - `{"properties": {"reported": {...}}}`: the reported object is merged.
    /// - any other object is merged as reported attributes.
    ///
    /// Returns false if the update couldn't be applied.
    pub fn apply_incremental(&mut self, patch: &Value) -> bool {
        let Some(patch) = patch.as_object() else {
            debug!("[{}] Ignoring invalid state update: {patch}", self.id);
            return false;
        };
        let current = self.reported().cloned().unwrap_or_default();

        let reported = match (
            patch.get("property").and_then(Value::as_str),
            patch.get("value"),
        ) {
            (Some(property), Some(value)) => {
                let mut reported = current;
                set_path(&mut reported, property, value.clone());
                reported
            }
            _ => {
                let update = patch
                    .get("properties")
                    .and_then(|p| p.get("reported"))
                    .and_then(Value::as_object)
                    .unwrap_or(patch);
                let mut merged = deep_merge(&current, update);
                for key in self.constant_keys() {
                    if get_path(update, key).is_some() {
                        continue;
                    }
                    if let Some(value) = get_path(&current, key) {
                        set_path(&mut merged, key, value.clone());
                    }
                }
                merged
            }
        };

        let mut state = (*self.state).clone();
        if let Some(properties) = state.get_mut("properties").and_then(Value::as_object_mut) {
            properties.insert("reported".into(), Value::Object(reported));
        }
        self.swap(state);
        true
    }

    fn constant_keys(&self) -> impl Iterator<Item = &str> {
        self.catalog
            .iter()
            .filter(|(_, e)| e.is_constant())
            .map(|(k, _)| k.as_str())
    }

    fn swap(&mut self, state: Value) {
        self.state = Arc::new(state);
        for entity in self.entities.iter_mut() {
            entity.base_mut().update(self.state.clone());
        }
    }
}

/// Bring a state into the `{"properties": {"reported": {...}}}` shape.
///
/// Root level attributes of a state with a `properties` object are kept, any other object is
/// used as reported state.
pub fn normalize_state(state: Value) -> Value {
    match state {
        Value::Object(mut root) if root.contains_key("properties") => {
            let properties = root
                .entry("properties")
                .or_insert_with(|| Value::Object(Map::new()));
            if !properties.is_object() {
                *properties = Value::Object(Map::new());
            }
            if let Value::Object(properties) = properties {
                let reported = properties
                    .entry("reported")
                    .or_insert_with(|| Value::Object(Map::new()));
                if !reported.is_object() {
                    *reported = Value::Object(Map::new());
                }
            }
            Value::Object(root)
        }
        Value::Object(root) => json!({"properties": {"reported": root}}),
        _ => json!({"properties": {"reported": {}}}),
    }
}

fn entity_display_name(path: &str, kind: EntityKind, entry: Option<&CatalogEntry>) -> String {
    if let Some(name) = entry.and_then(|e| e.friendly_name.as_deref()) {
        return capitalize(name);
    }
    if kind == EntityKind::BinarySensor {
        if let Some(name) = binary_sensor_friendly_name(leaf_of(path)) {
            return name.to_string();
        }
    }
    display_name(path)
}

/// Drop entities with a vendor prefixed attribute if the same attribute exists without prefix.
fn suppress_vendor_duplicates(
    appliance_id: &str,
    entities: Vec<ApplianceEntity>,
) -> Vec<ApplianceEntity> {
    let plain_keys: HashSet<String> = entities
        .iter()
        .map(|e| &e.base().attr)
        .filter(|attr| !has_vendor_prefix(attr))
        .map(|attr| normalize_key(attr))
        .collect();

    entities
        .into_iter()
        .filter(|e| {
            let attr = &e.base().attr;
            let duplicate = has_vendor_prefix(attr) && plain_keys.contains(&normalize_key(attr));
            if duplicate {
                debug!("[{appliance_id}] Skipping duplicate vendor prefixed entity {attr}");
            }
            !duplicate
        })
        .collect()
}

fn time_to_end(patch: &Value) -> impl Iterator<Item = f64> + '_ {
    TIME_ENTITIES_TO_UPDATE.into_iter().filter_map(move |key| {
        if patch.get("property").and_then(Value::as_str) == Some(key) {
            return patch.get("value").and_then(number_value);
        }
        let scope = patch.pointer("/properties/reported").unwrap_or(patch);
        scope.get(key).and_then(number_value)
    })
}

/// Check if a state update reports a residual remaining time of at most one second.
///
/// The API doesn't send an update at the end of a program cycle, a re-poll is required.
pub fn time_remaining_residual(patch: &Value) -> bool {
    time_to_end(patch).any(|t| t > 0.0 && t <= 1.0)
}

/// Check if a state update reports a completed program cycle.
pub fn time_remaining_completed(patch: &Value) -> bool {
    time_to_end(patch).any(|t| t == 0.0)
}
