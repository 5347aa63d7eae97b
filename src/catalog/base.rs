// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Attributes common to all appliance types.

use serde_json::{Value, json};

pub(super) fn table() -> Value {
    json!({
        "connectivityState": {
            "capability_info": {
                "access": "read",
                "type": "string",
                "values": {"connected": {}, "disconnected": {}}
            },
            "device_class": {"binary_sensor": "connectivity"},
            "entity_category": "diagnostic",
            "friendly_name": "Connectivity state"
        },
        "networkInterface/linkQualityIndicator": {
            "capability_info": {
                "access": "read",
                "type": "string",
                "values": {
                    "EXCELLENT": {},
                    "GOOD": {},
                    "POOR": {},
                    "UNDEFINED": {},
                    "VERY_GOOD": {},
                    "VERY_POOR": {}
                }
            },
            "device_class": {"sensor": "enum"},
            "entity_category": "diagnostic",
            "friendly_name": "Link quality",
            "icon": "mdi:wifi"
        },
        "applianceMode": {
            "capability_info": {"access": "read", "type": "string"},
            "entity_category": "diagnostic",
            "icon": "mdi:auto-mode"
        },
        "remoteControl": {
            "capability_info": {"access": "read", "type": "string"},
            "entity_category": "diagnostic",
            "icon": "mdi:remote"
        },
        "applianceState": {
            "capability_info": {"access": "read", "type": "string"},
            "device_class": {"sensor": "enum"},
            "icon": "mdi:state-machine"
        },
        "alerts": {
            "capability_info": {"access": "read", "type": "alert"},
            "entity_category": "diagnostic",
            "icon": "mdi:alert"
        },
        "timeToEnd": {
            "capability_info": {"access": "read", "type": "number"},
            "device_class": {"sensor": "duration"},
            "unit": "seconds",
            "icon": "mdi:timelapse"
        },
        "runningTime": {
            "capability_info": {"access": "read", "type": "number"},
            "device_class": {"sensor": "duration"},
            "unit": "seconds",
            "icon": "mdi:timer"
        },
        "startTime": {
            "capability_info": {
                "access": "readwrite",
                "type": "number",
                "min": 0,
                "max": 72000,
                "step": 1800,
                "default": "INVALID_OR_NOT_SET_TIME"
            },
            "device_class": {"number": "duration"},
            "unit": "seconds",
            "icon": "mdi:clock-start"
        },
        "applianceTotalWorkingTime": {
            "capability_info": {"access": "read", "type": "number"},
            "device_class": {"sensor": "duration"},
            "unit": "seconds",
            "entity_category": "diagnostic",
            "entity_registry_enabled_default": false,
            "icon": "mdi:clock-outline"
        },
        "doorState": {
            "capability_info": {
                "access": "read",
                "type": "string",
                "values": {"CLOSED": {}, "OPEN": {}}
            },
            "device_class": {"binary_sensor": "door"}
        },
        "doorLock": {
            "capability_info": {
                "access": "read",
                "type": "string",
                "values": {"LOCKED": {}, "UNLOCKED": {}}
            },
            "device_class": {"binary_sensor": "lock"},
            "state_invert": true
        },
        "foodProbeInsertionState": {
            "capability_info": {
                "access": "read",
                "type": "string",
                "values": {"INSERTED": {}, "NOT_INSERTED": {}}
            },
            "device_class": {"binary_sensor": "plug"},
            "icon": "mdi:thermometer-probe"
        },
        "cavityLight": {
            "capability_info": {"access": "readwrite", "type": "boolean"},
            "icon": "mdi:lightbulb"
        },
        "executeCommand": {
            "capability_info": {
                "access": "write",
                "type": "string",
                "values": {"START": {}, "STOPRESET": {}, "PAUSE": {}, "RESUME": {}}
            },
            "icon": "mdi:play",
            "entity_icons_value_map": {
                "OFF": "mdi:power-off",
                "ON": "mdi:power-on",
                "START": "mdi:play",
                "STOPRESET": "mdi:stop",
                "PAUSE": "mdi:pause",
                "RESUME": "mdi:play-pause"
            },
            "entity_value_named": true
        },
        "temperatureRepresentation": {
            "capability_info": {
                "access": "constant",
                "type": "string",
                "default": "CELSIUS",
                "values": {"CELSIUS": {}, "FAHRENHEIT": {}}
            },
            "entity_category": "diagnostic"
        }
    })
}
