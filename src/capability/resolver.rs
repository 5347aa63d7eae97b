// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Capability lookup in the appliance capability tree, merged with catalog definitions.

use crate::capability::CapabilityDescriptor;
use crate::catalog::CatalogEntry;
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use serde_json::{Map, Value};

/// Attributes present in the reported state, but never declared in the capability tree.
pub const STATIC_ATTRIBUTES: [&str; 3] = [
    "connectivityState",
    "networkInterface/linkQualityIndicator",
    "applianceMode",
];

lazy_static! {
    /// Vendor internal attributes without value for a user.
    static ref ATTRIBUTES_BLACKLIST: Vec<Regex> = anchored(&[
        "^fCMiscellaneous.+",
        "fcOptisenseLoadWeight.*",
        "applianceCareAndMaintenance.*",
        "applianceMainBoardSwVersion",
        "coolingValveState",
        "networkInterface",
        "temperatureRepresentation",
    ]);
    /// Exceptions of the blacklist.
    static ref ATTRIBUTES_WHITELIST: Vec<Regex> =
        anchored(&[".*waterUsage", ".*tankAReserve", ".*tankBReserve"]);
}

/// Compile patterns which must match at the start of the input.
fn anchored(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|p| Regex::new(&format!("^(?:{p})")).ok())
        .collect()
}

/// Check if a top-level capability key is used for entities.
pub fn keep_source(key: &str) -> bool {
    if ATTRIBUTES_BLACKLIST.iter().any(|re| re.is_match(key)) {
        return ATTRIBUTES_WHITELIST.iter().any(|re| re.is_match(key));
    }
    true
}

/// Look up the capability object of an attribute path.
///
/// The path is first used as direct key, then the `/` separated levels are walked. Only
/// object values are returned.
pub fn get_capability<'a>(tree: &'a Map<String, Value>, path: &str) -> Option<&'a Map<String, Value>> {
    if let Some(Value::Object(capability)) = tree.get(path) {
        return Some(capability);
    }
    let mut levels = path.split('/');
    let mut current = tree.get(levels.next()?)?.as_object()?;
    for level in levels {
        current = current.get(level)?.as_object()?;
    }
    Some(current)
}

/// Effective capability of an attribute.
///
/// The live capability from the appliance wins. A catalog entry is used as a whole if the
/// appliance doesn't declare the attribute, otherwise only its `values` are added if the live
/// capability has none.
pub fn resolve(
    tree: &Map<String, Value>,
    path: &str,
    catalog_entry: Option<&CatalogEntry>,
) -> Option<CapabilityDescriptor> {
    let live = get_capability(tree, path);
    let capability = match (live, catalog_entry) {
        (None, None) => {
            debug!("No capability found for '{path}'");
            return None;
        }
        (Some(live), None) => live.clone(),
        (None, Some(entry)) => entry.capability_info.clone(),
        (Some(live), Some(entry)) => {
            let mut merged = live.clone();
            if !merged.contains_key("values")
                && let Some(values) = entry.capability_info.get("values")
            {
                merged.insert("values".into(), values.clone());
            }
            merged
        }
    };
    Some(CapabilityDescriptor::parse(path, &Value::Object(capability)))
}

/// Candidate attribute paths of an appliance capability tree.
///
/// Returns the filtered top-level keys followed by `parent/child` paths of nested capabilities,
/// or `None` without a capability tree.
pub fn sources_list(tree: Option<&Map<String, Value>>) -> Option<Vec<String>> {
    let tree = tree?;
    let mut sources: Vec<String> = Vec::new();

    for (key, value) in tree.iter().filter(|(key, _)| keep_source(key)) {
        sources.push(key.clone());
        let Some(children) = value.as_object() else {
            continue;
        };
        for (child_key, child) in children {
            if let Some(child) = child.as_object()
                && child.contains_key("access")
                && child.contains_key("type")
            {
                sources.push(format!("{key}/{child_key}"));
            }
        }
    }

    Some(sources)
}

/// Insert a capability object into the tree at the given path, creating parent levels.
///
/// An existing capability is not replaced.
pub fn inject_static_attribute(tree: &mut Map<String, Value>, path: &str, capability: &Map<String, Value>) {
    let mut levels: Vec<&str> = path.split('/').collect();
    let Some(leaf) = levels.pop() else {
        return;
    };
    let mut current = tree;
    for level in levels {
        let entry = current
            .entry(level.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        let Value::Object(child) = entry else {
            debug!("Cannot inject '{path}': '{level}' is not an object");
            return;
        };
        current = child;
    }
    current
        .entry(leaf.to_string())
        .or_insert_with(|| Value::Object(capability.clone()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{Access, ValueType};
    use rstest::rstest;
    use serde_json::json;

    fn tree(value: Value) -> Map<String, Value> {
        value.as_object().cloned().expect("object")
    }

    fn catalog_entry(capability: Value) -> CatalogEntry {
        serde_json::from_value(json!({ "capability_info": capability })).expect("valid entry")
    }

    #[rstest]
    #[case("fCMiscellaneousState", false)]
    #[case("fcOptisenseLoadWeight1", false)]
    #[case("applianceMainBoardSwVersion", false)]
    #[case("networkInterface", false)]
    #[case("networkInterfaceStatus", false)]
    #[case("temperatureRepresentation", false)]
    #[case("fCMiscellaneous", true)]
    #[case("targetTemperatureC", true)]
    #[case("applianceCareAndMaintenance0/waterUsage", true)]
    #[case("applianceCareAndMaintenance0", false)]
    #[case("myCoolingValveState", true)]
    fn source_filter(#[case] key: &str, #[case] expected: bool) {
        assert_eq!(expected, keep_source(key), "key: {key}");
    }

    #[test]
    fn get_capability_direct_and_nested() {
        let caps = tree(json!({
            "targetTemperatureC": {"access": "readwrite", "type": "temperature"},
            "userSelections": {
                "programUID": {"access": "readwrite", "type": "string"},
                "flat": "value"
            }
        }));

        assert!(get_capability(&caps, "targetTemperatureC").is_some());
        assert!(get_capability(&caps, "userSelections/programUID").is_some());
        assert!(get_capability(&caps, "userSelections/flat").is_none());
        assert!(get_capability(&caps, "userSelections/missing").is_none());
        assert!(get_capability(&caps, "missing").is_none());
    }

    #[test]
    fn resolve_merges_only_catalog_values() {
        let caps = tree(json!({
            "mode": {"access": "readwrite", "type": "string", "default": "AUTO"}
        }));
        let entry = catalog_entry(json!({
            "access": "read",
            "type": "number",
            "values": {"COOL": {}, "ECO": {}},
            "default": "COOL"
        }));

        let cap = resolve(&caps, "mode", Some(&entry)).expect("capability");

        assert_eq!(Some(Access::ReadWrite), cap.access);
        assert_eq!(Some(ValueType::String), cap.value_type);
        assert_eq!(Some(json!("AUTO")), cap.default);
        assert_eq!(vec!["COOL", "ECO"], cap.value_keys());
    }

    #[test]
    fn resolve_keeps_live_values() {
        let caps = tree(json!({
            "mode": {"access": "readwrite", "type": "string", "values": {"AUTO": {}}}
        }));
        let entry = catalog_entry(json!({"values": {"COOL": {}}}));

        let cap = resolve(&caps, "mode", Some(&entry)).expect("capability");

        assert_eq!(vec!["AUTO"], cap.value_keys());
    }

    #[test]
    fn resolve_uses_catalog_without_live_capability() {
        let entry = catalog_entry(json!({"access": "read", "type": "string"}));

        let cap = resolve(&Map::new(), "connectivityState", Some(&entry)).expect("capability");

        assert_eq!("connectivityState", cap.path);
        assert_eq!(Some(Access::Read), cap.access);
    }

    #[test]
    fn resolve_without_any_source() {
        assert_eq!(None, resolve(&Map::new(), "missing", None));
    }

    #[test]
    fn sources_list_filters_and_expands() {
        let caps = tree(json!({
            "targetTemperatureC": {"access": "readwrite", "type": "temperature"},
            "networkInterface": {"linkQualityIndicator": {"access": "read", "type": "string"}},
            "userSelections": {
                "programUID": {"access": "readwrite", "type": "string"},
                "analogTemperature": {"access": "readwrite", "type": "temperature"},
                "incomplete": {"access": "read"}
            },
            "mode": {"access": "readwrite", "type": "string", "values": {"COOL": {}}}
        }));

        let sources = sources_list(Some(&caps)).expect("sources");

        assert_eq!(
            vec![
                "targetTemperatureC",
                "userSelections",
                "userSelections/programUID",
                "userSelections/analogTemperature",
                "mode",
            ],
            sources
        );
    }

    #[test]
    fn sources_list_without_capabilities() {
        assert_eq!(None, sources_list(None));
    }

    #[test]
    fn inject_static_attribute_creates_levels() {
        let mut caps = tree(json!({"networkInterface": {}}));
        let capability = tree(json!({"access": "read", "type": "string"}));

        inject_static_attribute(&mut caps, "networkInterface/linkQualityIndicator", &capability);
        inject_static_attribute(&mut caps, "connectivityState", &capability);

        assert_eq!(
            json!({
                "networkInterface": {"linkQualityIndicator": {"access": "read", "type": "string"}},
                "connectivityState": {"access": "read", "type": "string"}
            }),
            Value::Object(caps)
        );
    }

    #[test]
    fn inject_static_attribute_keeps_existing() {
        let mut caps = tree(json!({"applianceMode": {"access": "read", "type": "string"}}));
        let capability = tree(json!({"access": "constant", "type": "string"}));

        inject_static_attribute(&mut caps, "applianceMode", &capability);

        assert_eq!(json!("read"), caps["applianceMode"]["access"]);
    }
}
