// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Configuration file handling.

use config::Config;
use log::warn;
use serde_with::{DurationSeconds, serde_as};
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Default configuration file.
pub const DEF_CONFIG_FILE: &str = "configuration.yaml";

/// Environment variable prefix to override configuration values.
pub const ENV_PREFIX: &str = "ELX";

const DEF_RENEWAL_INTERVAL_SEC: u64 = 7200;
const DEF_DEFERRED_UPDATE_DELAY_SEC: u64 = 70;

#[derive(Clone, Default, serde::Deserialize, serde::Serialize)]
pub struct Settings {
    pub account: AccountSettings,
    pub coordinator: CoordinatorSettings,
}

/// Electrolux account of a config entry.
#[derive(Clone, serde::Deserialize, serde::Serialize)]
pub struct AccountSettings {
    /// Config entry identifier, used in legacy entity unique ids.
    pub entry_id: String,
    /// Account API key. Only a hash of it is used in entity unique ids.
    pub api_key: String,
}

impl Default for AccountSettings {
    fn default() -> Self {
        Self {
            entry_id: "electrolux".to_string(),
            api_key: String::new(),
        }
    }
}

#[serde_as]
#[derive(Clone, Copy, serde::Deserialize, serde::Serialize)]
pub struct CoordinatorSettings {
    /// Full state polling interval. Polling is disabled with 0.
    #[serde_as(as = "DurationSeconds")]
    #[serde(rename = "poll_interval_sec")]
    pub poll_interval: Duration,
    /// Interval to close and re-open the push update subscription.
    #[serde_as(as = "DurationSeconds")]
    #[serde(rename = "renewal_interval_sec")]
    pub renewal_interval: Duration,
    /// Delay of the state refresh after a residual remaining time.
    #[serde_as(as = "DurationSeconds")]
    #[serde(rename = "deferred_update_delay_sec")]
    pub deferred_update_delay: Duration,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::ZERO,
            renewal_interval: Duration::from_secs(DEF_RENEWAL_INTERVAL_SEC),
            deferred_update_delay: Duration::from_secs(DEF_DEFERRED_UPDATE_DELAY_SEC),
        }
    }
}

impl Display for CoordinatorSettings {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "poll interval={:?}, subscription renewal={:?}, deferred update={:?}",
            self.poll_interval, self.renewal_interval, self.deferred_update_delay
        )
    }
}

/// Load the configuration settings.
///
/// The application provides default values which can be overriden in the following order:
/// 1. Configuration settings in the yaml or json configuration file specified in `filename`
/// 2. Environment variables with prefix `ELX_` (works only for cfg keys not containing a `_`!)
pub fn get_configuration(filename: Option<&str>) -> Result<Settings, config::ConfigError> {
    let mut config = Config::builder().add_source(Config::try_from(&Settings::default())?);
    if let Some(filename) = filename {
        config = config.add_source(config::File::with_name(filename));
    }

    // E.g. `ELX_ACCOUNT_APIKEY` is NOT mapped to `account.api_key`:
    // https://github.com/mehcode/config-rs/issues/312
    let config = config
        .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("_"))
        .build()?;

    let settings: Settings = config.try_deserialize()?;

    Ok(check_cfg_values(settings))
}

fn check_cfg_values(mut settings: Settings) -> Settings {
    let defaults = CoordinatorSettings::default();
    let coordinator = &mut settings.coordinator;

    if !coordinator.poll_interval.is_zero() && coordinator.poll_interval.as_secs() < 10 {
        warn!(
            "Invalid poll interval {:?}, polling disabled.",
            coordinator.poll_interval
        );
        coordinator.poll_interval = defaults.poll_interval;
    }

    if coordinator.renewal_interval.as_secs() < 60 {
        warn!("Invalid subscription renewal interval, using default.");
        coordinator.renewal_interval = defaults.renewal_interval;
    }

    if coordinator.deferred_update_delay.is_zero() {
        warn!("Invalid deferred update delay, using default.");
        coordinator.deferred_update_delay = defaults.deferred_update_delay;
    }

    if settings.account.entry_id.trim().is_empty() {
        warn!("Missing account entry_id, using default.");
        settings.account.entry_id = AccountSettings::default().entry_id;
    }

    settings
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn defaults() {
        let settings = check_cfg_values(Settings::default());
        assert!(settings.coordinator.poll_interval.is_zero());
        assert_eq!(7200, settings.coordinator.renewal_interval.as_secs());
        assert_eq!(70, settings.coordinator.deferred_update_delay.as_secs());
        assert_eq!("electrolux", settings.account.entry_id);
    }

    #[rstest]
    #[case(0, 0)]
    #[case(5, 0)]
    #[case(30, 30)]
    fn poll_interval(#[case] configured: u64, #[case] expected: u64) {
        let mut settings = Settings::default();
        settings.coordinator.poll_interval = Duration::from_secs(configured);
        let settings = check_cfg_values(settings);
        assert_eq!(expected, settings.coordinator.poll_interval.as_secs());
    }

    #[test]
    fn invalid_intervals_are_reset() {
        let mut settings = Settings::default();
        settings.coordinator.renewal_interval = Duration::from_secs(1);
        settings.coordinator.deferred_update_delay = Duration::ZERO;
        settings.account.entry_id = " ".into();

        let settings = check_cfg_values(settings);
        assert_eq!(7200, settings.coordinator.renewal_interval.as_secs());
        assert_eq!(70, settings.coordinator.deferred_update_delay.as_secs());
        assert_eq!("electrolux", settings.account.entry_id);
    }

    #[test]
    fn settings_field_names() {
        let json = serde_json::to_value(Settings::default()).expect("serialize");
        assert_eq!(
            Some(70),
            json.pointer("/coordinator/deferred_update_delay_sec")
                .and_then(serde_json::Value::as_u64)
        );
        assert!(json.pointer("/account/api_key").is_some());
    }
}
