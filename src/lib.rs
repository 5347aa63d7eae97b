// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Electrolux appliance integration: maps cloud appliance capabilities and states to
//! smart home entities.

#![forbid(non_ascii_idents)]
#![deny(unsafe_code)]

pub mod api;
pub mod appliance;
pub mod capability;
pub mod catalog;
pub mod coordinator;
pub mod entity;
pub mod naming;
pub mod util;

pub mod configuration;
pub mod errors;
pub mod startup;

pub use coordinator::*;
pub use startup::*;
