// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Pure A9 air purifier attributes.

use serde_json::{Value, json};

pub(super) fn table() -> Value {
    json!({
        "Temp": {
            "capability_info": {"access": "read", "type": "number"},
            "device_class": {"sensor": "temperature"},
            "unit": "celsius",
            "friendly_name": "Temperature"
        },
        "Humidity": {
            "capability_info": {"access": "read", "type": "number"},
            "device_class": {"sensor": "humidity"},
            "unit": "percentage",
            "friendly_name": "Humidity"
        },
        "PM1": {
            "capability_info": {"access": "read", "type": "number"},
            "device_class": {"sensor": "pm1"},
            "unit": "micrograms_per_cubic_meter",
            "friendly_name": "PM1"
        },
        "PM2_5": {
            "capability_info": {"access": "read", "type": "number"},
            "device_class": {"sensor": "pm25"},
            "unit": "micrograms_per_cubic_meter",
            "friendly_name": "PM2.5"
        },
        "PM10": {
            "capability_info": {"access": "read", "type": "number"},
            "device_class": {"sensor": "pm10"},
            "unit": "micrograms_per_cubic_meter",
            "friendly_name": "PM10"
        },
        "TVOC": {
            "capability_info": {"access": "read", "type": "number"},
            "device_class": {"sensor": "volatile_organic_compounds_parts"},
            "unit": "parts_per_billion",
            "friendly_name": "TVOC"
        },
        "ECO2": {
            "capability_info": {"access": "read", "type": "number"},
            "device_class": {"sensor": "carbon_dioxide"},
            "unit": "parts_per_million",
            "friendly_name": "eCO2"
        },
        "DoorOpen": {
            "capability_info": {"access": "read", "type": "boolean"},
            "device_class": {"binary_sensor": "door"},
            "entity_category": "diagnostic",
            "friendly_name": "Door Open"
        },
        "FilterType": {
            "capability_info": {"access": "read", "type": "number"},
            "device_class": {"sensor": "enum"},
            "entity_category": "diagnostic",
            "icon": "mdi:air-filter",
            "value_mapping": {
                "0": "Filter",
                "48": "BREEZE Complete air filter",
                "49": "CLEAN Ultrafine particle filter",
                "51": "CARE Ultimate protect filter",
                "64": "Breeze 360 filter",
                "65": "Clean 360 Ultrafine particle filter",
                "66": "Protect 360 filter",
                "67": "Breathe 360 filter",
                "68": "Fresh 360 filter",
                "96": "Breeze 360 filter",
                "99": "Breeze 360 filter",
                "100": "Fresh 360 filter",
                "192": "FRESH Odour protect filter"
            }
        },
        "FilterLife": {
            "capability_info": {"access": "read", "type": "number"},
            "unit": "percentage",
            "icon": "mdi:air-filter",
            "friendly_name": "Filter Life"
        }
    })
}
