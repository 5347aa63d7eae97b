// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Attribute path handling: categories, identity keys and display names.
//!
//! Attribute paths are either a plain attribute name like `cavityLight`, or a category (also
//! called source) and a leaf attribute separated by a `/`, e.g. `userSelections/programUID`.

use lazy_static::lazy_static;
use regex::Regex;

/// Opaque model prefix token of some appliance attributes, e.g. `fPPN_OV_cavityLight`.
const VENDOR_PREFIX: &str = "fppn";

lazy_static! {
    /// Ordered prefix strips applied before generating entity and display names.
    static ref RENAME_RULES: Vec<Regex> = [
        r"^userSelections/[^_]+_",
        r"^userSelections/",
        r"^fCMiscellaneousState/[^_]+_",
        r"^fCMiscellaneousState/",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect();
}

/// Everything before the last `/`, or an empty string.
pub fn category_of(path: &str) -> &str {
    path.rsplit_once('/').map(|(category, _)| category).unwrap_or("")
}

/// Everything after the last `/`, or the whole path.
pub fn leaf_of(path: &str) -> &str {
    path.rsplit_once('/').map(|(_, leaf)| leaf).unwrap_or(path)
}

/// Normalized identity key of an attribute.
///
/// The key is lower-cased and surrounding underscores are removed. A key starting with the vendor
/// prefix token loses every occurrence of the token (with trailing underscore if the prefix has
/// one). This repeats until the key no longer starts with the token, so applying the function
/// again returns the same key.
pub fn normalize_key(attr: &str) -> String {
    let mut key = attr.to_lowercase().trim_matches('_').to_string();
    while key.starts_with(VENDOR_PREFIX) {
        let token = format!("{VENDOR_PREFIX}_");
        let token = if key.starts_with(&token) {
            token.as_str()
        } else {
            VENDOR_PREFIX
        };
        key = key.replace(token, "").trim_matches('_').to_string();
    }
    key
}

/// Check if the attribute carries the vendor prefix token.
pub fn has_vendor_prefix(attr: &str) -> bool {
    attr.trim_start_matches('_')
        .to_lowercase()
        .starts_with(VENDOR_PREFIX)
}

/// Apply the rename rules in order.
pub fn apply_rename_rules(path: &str) -> String {
    RENAME_RULES
        .iter()
        .fold(path.to_string(), |name, rule| rule.replace(&name, "").into_owned())
}

/// Entity attribute name: the leaf of the renamed path.
pub fn entity_name(path: &str) -> String {
    leaf_of(&apply_rename_rules(path)).to_string()
}

/// Human-readable display name of an attribute path.
///
/// Camel case is split into lower-cased words, upper-case and digit runs are kept together:
/// `targetTemperatureC` → `Target temperature c`, `PM2_5` → `Pm2 5`.
pub fn display_name(path: &str) -> String {
    let renamed = apply_rename_rules(path);
    let mut chars = renamed.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    let text: Vec<char> = first
        .to_uppercase()
        .chain(chars)
        .map(|c| if c == '_' || c == '/' { ' ' } else { c })
        .collect();

    let is_upper_or_digit = |c: char| c.is_uppercase() || c.is_ascii_digit();
    let mut words: Vec<String> = Vec::new();
    let mut group = String::new();

    for (i, &c) in text.iter().enumerate() {
        if group.is_empty() {
            group.push(c);
            continue;
        }
        if c == ' ' {
            words.push(std::mem::take(&mut group));
            continue;
        }
        let prev = text[i - 1];
        let next_continues = text.get(i + 1).is_none_or(|&n| is_upper_or_digit(n));
        if is_upper_or_digit(c) && is_upper_or_digit(prev) && next_continues {
            group.push(c);
        } else if is_upper_or_digit(c) && prev.is_lowercase() {
            words.push(std::mem::take(&mut group));
            group.push(c);
        } else {
            group.push(c);
        }
    }
    if !group.is_empty() {
        words.push(group);
    }

    capitalize(&words.join(" "))
}

/// Upper-case the first character and lower-case the rest.
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(|c| c.to_lowercase()))
            .collect(),
        None => String::new(),
    }
}

/// Fixed names for binary sensors with a poor generated name, keyed by normalized attribute key.
pub fn binary_sensor_friendly_name(attr: &str) -> Option<&'static str> {
    match normalize_key(attr).as_str() {
        "ovwater_tank_empty" => Some("Water Tank Status"),
        "foodprobesupported" => Some("Food Probe Support"),
        "foodprobeinsertionstate" => Some("Food Probe"),
        "ovcleaning_ended" => Some("Cleaning Status"),
        "ovfood_probe_end_of_cooking" => Some("Probe End of Cooking"),
        _ => None,
    }
}
