// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Actix message handler for entity write requests.

use crate::api::ApplianceApi;
use crate::capability::CapabilityDescriptor;
use crate::coordinator::{Coordinator, CoordinatorEvent, WriteEntity};
use crate::entity::command::{build_command, ensure_remote_control, retry_command};
use crate::errors::{CommandError, classify_command_error};
use actix::{fut, ActorFutureExt, Handler, ResponseActFuture, WrapFuture};
use log::{debug, info, warn};
use serde_json::Value;
use std::sync::Arc;

/// Appliance command ready for execution.
struct PreparedCommand {
    appliance_id: String,
    attr: String,
    capability: CapabilityDescriptor,
    command: Value,
    /// Alternative command if the appliance rejects `command`.
    retry: Option<Value>,
}

impl Handler<WriteEntity> for Coordinator {
    type Result = ResponseActFuture<Self, Result<(), CommandError>>;

    fn handle(&mut self, msg: WriteEntity, _ctx: &mut Self::Context) -> Self::Result {
        if !self.is_running() {
            return Box::pin(fut::result(Err(CommandError::Unexpected(
                "Coordinator is not running".into(),
            ))));
        }
        let prepared = match self.prepare_command(&msg) {
            Ok(prepared) => prepared,
            Err(e) => return Box::pin(fut::result(Err(e))),
        };
        let api = self.api.clone();

        Box::pin(
            async move { execute(api, prepared).await }
                .into_actor(self)
                .map(|result, act, _ctx| {
                    if let Err(CommandError::Authentication(message)) = &result {
                        act.notify_listeners(CoordinatorEvent::AuthenticationFailed {
                            message: message.clone(),
                        });
                    }
                    result
                }),
        )
    }
}

impl Coordinator {
    fn prepare_command(&self, msg: &WriteEntity) -> Result<PreparedCommand, CommandError> {
        let (appliance, entity) = self
            .appliances
            .values()
            .find_map(|appliance| {
                appliance
                    .entity(&msg.unique_id)
                    .map(|entity| (appliance, entity))
            })
            .ok_or_else(|| CommandError::UnknownEntity(msg.unique_id.clone()))?;
        let base = entity.base();

        ensure_remote_control(&appliance.id, &appliance.snapshot())?;
        let value = entity.command_value(&msg.value)?;
        let reported = appliance.reported();
        let command = build_command(&base.source, &base.attr, value.clone(), reported)?;
        let retry = retry_command(&base.source, &base.attr, value, reported);

        Ok(PreparedCommand {
            appliance_id: appliance.id.clone(),
            attr: base.attr.clone(),
            capability: base.capability.clone(),
            command,
            retry,
        })
    }
}

/// Execute a command. A command rejected by the appliance is retried once with the alternative
/// command, if there is one.
async fn execute(api: Arc<dyn ApplianceApi>, prepared: PreparedCommand) -> Result<(), CommandError> {
    let id = &prepared.appliance_id;
    debug!("[{id}] Sending command: {}", prepared.command);

    let error = match api.execute_command(id, prepared.command).await {
        Ok(_) => return Ok(()),
        Err(e) => classify_command_error(&e, &prepared.attr, &prepared.capability),
    };

    match (error, prepared.retry) {
        (CommandError::CommandValidation(_), Some(retry)) => {
            info!("[{id}] Command for {} rejected, retrying with: {retry}", prepared.attr);
            api.execute_command(id, retry).await.map(|_| ()).map_err(|e| {
                let error = classify_command_error(&e, &prepared.attr, &prepared.capability);
                warn!("[{id}] Command for {} failed: {error}", prepared.attr);
                error
            })
        }
        (error, _) => {
            warn!("[{id}] Command for {} failed: {error}", prepared.attr);
            Err(error)
        }
    }
}
