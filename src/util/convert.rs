// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Value conversions for the vendor vocabulary.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

lazy_static! {
    static ref BOOLEAN_ON: HashSet<&'static str> = HashSet::from([
        "charging",
        "connected",
        "detected",
        "enabled",
        "home",
        "hot",
        "light",
        "locked",
        "locking",
        "motion",
        "moving",
        "occupied",
        "on",
        "open",
        "plugged",
        "power",
        "problem",
        "running",
        "smoke",
        "sound",
        "tampering",
        "true",
        "unsafe",
        "update available",
        "vibration",
        "wet",
        "yes",
    ]);
    static ref BOOLEAN_OFF: HashSet<&'static str> = HashSet::from([
        "away",
        "clear",
        "closed",
        "disabled",
        "disconnected",
        "dry",
        "false",
        "no",
        "no light",
        "no motion",
        "no power",
        "no problem",
        "no smoke",
        "no sound",
        "no tampering",
        "no vibration",
        "normal",
        "not charging",
        "not occupied",
        "not running",
        "off",
        "safe",
        "stopped",
        "unlocked",
        "unlocking",
        "unplugged",
        "up-to-date",
        "up to date",
    ]);
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("valid regex");
}

/// Result of a [`string_to_boolean`] conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BooleanWord {
    Bool(bool),
    /// Unknown word, returned as is if a fallback was requested.
    Unknown(String),
}

impl BooleanWord {
    /// Truth value where an unknown, non-empty word counts as `true`.
    pub fn is_on(&self) -> bool {
        match self {
            BooleanWord::Bool(b) => *b,
            BooleanWord::Unknown(s) => !s.is_empty(),
        }
    }
}

/// Convert a vendor state word into a boolean.
///
/// The input is normalized: `_` is replaced with a space, surrounding whitespace is removed,
/// the text is lower-cased and inner whitespace collapsed. E.g. `NOT_RUNNING` → `not running`.
///
/// Unrecognized input is returned unchanged as [`BooleanWord::Unknown`] if `fallback` is set,
/// otherwise it is `false`.
pub fn string_to_boolean(value: &str, fallback: bool) -> BooleanWord {
    let normalized = value.replace('_', " ").trim().to_lowercase();
    let normalized = WHITESPACE.replace_all(&normalized, " ");

    if BOOLEAN_ON.contains(normalized.as_ref()) {
        BooleanWord::Bool(true)
    } else if BOOLEAN_OFF.contains(normalized.as_ref()) {
        BooleanWord::Bool(false)
    } else if fallback {
        BooleanWord::Unknown(value.to_string())
    } else {
        BooleanWord::Bool(false)
    }
}

/// Marker value for "no time set" used by the vendor API.
pub const TIME_NOT_SET: f64 = -1.0;

/// Convert seconds into minutes, rounding up partial minutes. `-1` is passed through.
pub fn time_seconds_to_minutes(seconds: f64) -> f64 {
    if seconds == TIME_NOT_SET {
        return TIME_NOT_SET;
    }
    (seconds.trunc() / 60.0).ceil()
}

/// Convert minutes into seconds. `-1` is passed through.
pub fn time_minutes_to_seconds(minutes: f64) -> f64 {
    if minutes == TIME_NOT_SET {
        return TIME_NOT_SET;
    }
    minutes.trunc() * 60.0
}

/// Create an identifier slug: lower-case ASCII alphanumerics separated by single underscores.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
    }
    slug.trim_end_matches('_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("CONNECTED", true)]
    #[case("connected", true)]
    #[case("  Running ", true)]
    #[case("UPDATE_AVAILABLE", true)]
    #[case("not_running", false)]
    #[case("NOT_CHARGING", false)]
    #[case("no   motion", false)]
    #[case("DISCONNECTED", false)]
    #[case("up-to-date", false)]
    #[case("UP_TO_DATE", false)]
    fn string_to_boolean_known_words(#[case] input: &str, #[case] expected: bool) {
        assert_eq!(BooleanWord::Bool(expected), string_to_boolean(input, true));
    }

    #[test]
    fn string_to_boolean_unknown_with_fallback_returns_input() {
        assert_eq!(
            BooleanWord::Unknown("SOMETHING_ELSE".into()),
            string_to_boolean("SOMETHING_ELSE", true)
        );
        assert!(string_to_boolean("SOMETHING_ELSE", true).is_on());
    }

    #[test]
    fn string_to_boolean_unknown_without_fallback_returns_false() {
        assert_eq!(
            BooleanWord::Bool(false),
            string_to_boolean("SOMETHING_ELSE", false)
        );
    }

    #[rstest]
    #[case(0., 0.)]
    #[case(1., 1.)]
    #[case(60., 1.)]
    #[case(61., 2.)]
    #[case(3600., 60.)]
    #[case(-1., -1.)]
    fn seconds_to_minutes(#[case] seconds: f64, #[case] expected: f64) {
        assert_eq!(expected, time_seconds_to_minutes(seconds));
    }

    #[rstest]
    #[case(0., 0.)]
    #[case(2., 120.)]
    #[case(-1., -1.)]
    fn minutes_to_seconds(#[case] minutes: f64, #[case] expected: f64) {
        assert_eq!(expected, time_minutes_to_seconds(minutes));
    }

    #[rstest]
    #[case("Electrolux_Living room AC_userSelections_targetTemperatureC", "electrolux_living_room_ac_userselections_targettemperaturec")]
    #[case("__a--b__", "a_b")]
    #[case("", "")]
    fn slug(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(expected, slugify(input));
    }
}
