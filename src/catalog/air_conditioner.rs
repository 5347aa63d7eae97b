// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Air conditioner attributes.

use serde_json::{Value, json};

pub(super) fn table() -> Value {
    json!({
        "targetTemperatureC": {
            "capability_info": {
                "access": "readwrite",
                "type": "temperature",
                "default": 15.56,
                "max": 32.22,
                "min": 15.56,
                "step": 1
            },
            "device_class": {"number": "temperature"},
            "unit": "celsius",
            "icon": "mdi:thermometer"
        },
        "targetTemperatureF": {
            "capability_info": {
                "access": "readwrite",
                "type": "temperature",
                "default": 60,
                "max": 90,
                "min": 60,
                "step": 1
            },
            "device_class": {"number": "temperature"},
            "unit": "fahrenheit",
            "icon": "mdi:thermometer"
        },
        "ambientTemperatureC": {
            "capability_info": {"access": "read", "type": "temperature"},
            "device_class": {"sensor": "temperature"},
            "unit": "celsius",
            "icon": "mdi:thermometer"
        },
        "ambientTemperatureF": {
            "capability_info": {"access": "read", "type": "temperature"},
            "device_class": {"sensor": "temperature"},
            "unit": "fahrenheit",
            "icon": "mdi:thermometer"
        },
        "mode": {
            "capability_info": {
                "access": "readwrite",
                "type": "string",
                "values": {"COOL": {}, "ECO": {}, "FANONLY": {}, "OFF": {"disabled": true}}
            },
            "icon": "mdi:air-conditioner"
        },
        "fanSpeedSetting": {
            "capability_info": {
                "access": "readwrite",
                "type": "string",
                "values": {"AUTO": {}, "HIGH": {}, "LOW": {}, "MIDDLE": {}}
            },
            "icon": "mdi:fan"
        },
        "fanSpeedState": {
            "capability_info": {
                "access": "read",
                "type": "string",
                "values": {"HIGH": {}, "LOW": {}, "MIDDLE": {}}
            },
            "device_class": {"sensor": "enum"},
            "icon": "mdi:fan"
        },
        "sleepMode": {
            "capability_info": {
                "access": "readwrite",
                "type": "string",
                "values": {"OFF": {}, "ON": {}}
            },
            "device_class": {"switch": "switch"},
            "icon": "mdi:sleep"
        },
        "executeCommand": {
            "capability_info": {
                "access": "write",
                "type": "string",
                "values": {"OFF": {}, "ON": {}}
            },
            "device_class": {"switch": "switch"},
            "icon": "mdi:power",
            "entity_icons_value_map": {"OFF": "mdi:power-off", "ON": "mdi:power-on"},
            "entity_value_named": true
        },
        "temperatureRepresentation": {
            "capability_info": {
                "access": "readwrite",
                "type": "string",
                "values": {"CELSIUS": {}, "FAHRENHEIT": {}}
            },
            "icon": "mdi:temperature-celsius"
        }
    })
}
