// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Actix message handlers.

mod command;
mod setup;
mod subscription;
mod update;

use actix::Message;

/// Internal message to open the push update subscription for all appliances.
#[derive(Message)]
#[rtype(result = "()")]
pub(crate) struct Subscribe;

/// Internal message to close and re-open the push update subscription.
#[derive(Message)]
#[rtype(result = "()")]
pub(crate) struct RenewSubscription;

/// Internal message to refresh the full state of an appliance.
#[derive(Message)]
#[rtype(result = "()")]
pub(crate) struct DeferredUpdate {
    pub appliance_id: String,
}
