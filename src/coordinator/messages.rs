// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Actix messages of the coordinator.

use crate::entity::{EntityDescriptor, EntityValue, WriteValue};
use crate::errors::{CommandError, ServiceError};
use actix::prelude::{Message, Recipient};
use serde_json::Value;

/// Load all appliances and derive their entities.
///
/// Returns the descriptors of all created entities.
#[derive(Debug, Default, Message)]
#[rtype(result = "Result<Vec<EntityDescriptor>, ServiceError>")]
pub struct Setup;

/// Partial state update of an appliance, delivered by the push subscription.
#[derive(Debug, Clone, Message)]
#[rtype(result = "()")]
pub struct PushUpdate {
    pub appliance_id: String,
    pub data: Value,
}

/// Refresh the full state of all appliances.
#[derive(Debug, Default, Message)]
#[rtype(result = "Result<(), ServiceError>")]
pub struct PollTick;

/// Get the descriptors of all entities.
#[derive(Debug, Default, Message)]
#[rtype(result = "Vec<EntityDescriptor>")]
pub struct GetEntities;

/// Read the current value of an entity.
#[derive(Debug, Message)]
#[rtype(result = "Option<EntityValue>")]
pub struct ReadEntity {
    pub unique_id: String,
}

/// Set a new entity value or press a button.
#[derive(Debug, Message)]
#[rtype(result = "Result<(), CommandError>")]
pub struct WriteEntity {
    pub unique_id: String,
    pub value: WriteValue,
}

/// Register a listener for [`CoordinatorEvent`]s.
#[derive(Message)]
#[rtype(result = "()")]
pub struct AddListener(pub Recipient<CoordinatorEvent>);

#[derive(Debug, Clone, PartialEq, Message)]
#[rtype(result = "()")]
pub enum CoordinatorEvent {
    /// The state of an appliance changed. Entity values should be read again.
    ApplianceUpdated { appliance_id: String },
    /// The account credentials were rejected. Requires re-authentication by the host.
    AuthenticationFailed { message: String },
}

/// Coordinator runtime information.
#[derive(Debug, Default, Message)]
#[rtype(result = "CoordinatorStatus")]
pub struct GetStatus;

#[derive(Debug, Clone, PartialEq)]
pub struct CoordinatorStatus {
    pub mode: String,
    pub appliances: usize,
    pub subscribed: bool,
    /// Appliances with a pending deferred state refresh.
    pub pending_updates: Vec<String>,
}

/// Stop all timers and close the push subscription.
#[derive(Debug, Default, Message)]
#[rtype(result = "()")]
pub struct Shutdown;
