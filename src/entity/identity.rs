// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Stable entity identifiers.
//!
//! Newer identifiers are based on a hash of the account API key. Entities created with the
//! older, config entry based identifier keep it as long as the host registry knows them.

use crate::naming::normalize_key;
use crate::util::slugify;
use sha2::{Digest, Sha256};

/// Host entity registry lookup.
pub trait EntityRegistry: Send + Sync {
    /// Check if an entity with the given unique id is registered for the config entry.
    fn is_registered(&self, entry_id: &str, unique_id: &str) -> bool;
}

/// Registry without any registered entities.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRegistry;

impl EntityRegistry for NoRegistry {
    fn is_registered(&self, _entry_id: &str, _unique_id: &str) -> bool {
        false
    }
}

const ROOT_SOURCE: &str = "root";

/// Unique id generator of one account.
#[derive(Debug, Clone)]
pub struct IdentityScheme {
    entry_id: String,
    /// First 16 hex characters of the SHA-256 hash of the API key.
    api_key_hash: String,
}

impl IdentityScheme {
    pub fn new(entry_id: impl Into<String>, api_key: &str) -> Self {
        let api_key_hash = if api_key.is_empty() {
            "unknown".to_string()
        } else {
            let digest = hex::encode(Sha256::digest(api_key.as_bytes()));
            digest[..16].to_string()
        };
        Self {
            entry_id: entry_id.into(),
            api_key_hash,
        }
    }

    pub fn entry_id(&self) -> &str {
        &self.entry_id
    }

    /// Config entry based id: `{entry_id}-{key}-{source}-{pnc_id}`.
    pub fn legacy_unique_id(&self, attr: &str, source: &str, pnc_id: &str) -> String {
        format!(
            "{}-{}-{}-{pnc_id}",
            self.entry_id,
            normalize_key(attr),
            source_or_root(source)
        )
    }

    /// API key hash based id: `{hash}-{key}-{source}-{pnc_id}`.
    pub fn hashed_unique_id(&self, attr: &str, source: &str, pnc_id: &str) -> String {
        format!(
            "{}-{}-{}-{pnc_id}",
            self.api_key_hash,
            normalize_key(attr),
            source_or_root(source)
        )
    }

    /// Unique id of an entity: the legacy id if it is already registered, otherwise the hashed id.
    pub fn unique_id(
        &self,
        attr: &str,
        source: &str,
        pnc_id: &str,
        registry: &dyn EntityRegistry,
    ) -> String {
        self.registered_legacy_id(attr, source, pnc_id, registry)
            .unwrap_or_else(|| self.hashed_unique_id(attr, source, pnc_id))
    }

    /// The legacy id of the attribute, if an entity is registered under it.
    pub fn registered_legacy_id(
        &self,
        attr: &str,
        source: &str,
        pnc_id: &str,
        registry: &dyn EntityRegistry,
    ) -> Option<String> {
        let legacy = self.legacy_unique_id(attr, source, pnc_id);
        registry
            .is_registered(&self.entry_id, &legacy)
            .then_some(legacy)
    }
}

fn source_or_root(source: &str) -> &str {
    if source.is_empty() {
        ROOT_SOURCE
    } else {
        source
    }
}

/// Suggested object id of an entity.
///
/// Uses the appliance brand and name if known, otherwise the appliance id.
pub fn suggested_object_id(
    brand: &str,
    name: &str,
    source: &str,
    attr: &str,
    pnc_id: &str,
) -> String {
    let text = if !brand.is_empty() && !name.is_empty() {
        let parts: Vec<&str> = [brand, name, source, attr]
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect();
        parts.join("_")
    } else if !pnc_id.is_empty() {
        format!("{pnc_id}_{attr}")
    } else {
        String::new()
    };
    let slug = slugify(&text);
    if slug.is_empty() {
        "electrolux_entity".to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashSet;

    struct Registered(HashSet<String>);

    impl EntityRegistry for Registered {
        fn is_registered(&self, _entry_id: &str, unique_id: &str) -> bool {
            self.0.contains(unique_id)
        }
    }

    #[test]
    fn hashed_id_uses_api_key_hash() {
        let scheme = IdentityScheme::new("entry1", "secret");
        let id = scheme.hashed_unique_id("targetTemperatureC", "", "pnc1");
        let (hash, rest) = id.split_once('-').expect("separator");
        assert_eq!(16, hash.len());
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!("targettemperaturec-root-pnc1", rest);
    }

    #[test]
    fn hashed_id_is_stable() {
        let a = IdentityScheme::new("entry1", "secret");
        let b = IdentityScheme::new("entry2", "secret");
        let c = IdentityScheme::new("entry1", "other");
        let id = |s: &IdentityScheme| s.hashed_unique_id("cavityLight", "", "pnc1");
        assert_eq!(id(&a), id(&b));
        assert_ne!(id(&a), id(&c));
    }

    #[test]
    fn missing_api_key() {
        let scheme = IdentityScheme::new("entry1", "");
        assert_eq!(
            "unknown-programuid-userSelections-pnc1",
            scheme.hashed_unique_id("programUID", "userSelections", "pnc1")
        );
    }

    #[rstest]
    #[case("fPPN_OV_cavityLight", "", "entry1-ov_cavitylight-root-pnc1")]
    #[case("programUID", "userSelections", "entry1-programuid-userSelections-pnc1")]
    fn legacy_id(#[case] attr: &str, #[case] source: &str, #[case] expected: &str) {
        let scheme = IdentityScheme::new("entry1", "secret");
        assert_eq!(expected, scheme.legacy_unique_id(attr, source, "pnc1"));
    }

    #[test]
    fn registered_legacy_id_wins() {
        let scheme = IdentityScheme::new("entry1", "secret");
        let registry = Registered(HashSet::from(["entry1-cavitylight-root-pnc1".to_string()]));

        assert_eq!(
            "entry1-cavitylight-root-pnc1",
            scheme.unique_id("cavityLight", "", "pnc1", &registry)
        );
        assert_eq!(
            scheme.hashed_unique_id("doorState", "", "pnc1"),
            scheme.unique_id("doorState", "", "pnc1", &registry)
        );
        assert_eq!(
            scheme.hashed_unique_id("cavityLight", "", "pnc1"),
            scheme.unique_id("cavityLight", "", "pnc1", &NoRegistry)
        );
    }

    #[rstest]
    #[case("Electrolux", "Oven", "userSelections", "analogTemperature", "pnc1", "electrolux_oven_userselections_analogtemperature")]
    #[case("Electrolux", "Living room AC", "", "mode", "pnc1", "electrolux_living_room_ac_mode")]
    #[case("", "", "", "mode", "944188772-00:31862190-443E07363DAB", "944188772_00_31862190_443e07363dab_mode")]
    #[case("", "", "", "", "", "electrolux_entity")]
    fn object_id(
        #[case] brand: &str,
        #[case] name: &str,
        #[case] source: &str,
        #[case] attr: &str,
        #[case] pnc_id: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(expected, suggested_object_id(brand, name, source, attr, pnc_id));
    }
}
