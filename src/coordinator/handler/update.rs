// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Actix message handler for appliance state updates and entity reads.

use crate::api::{ApiError, ApplianceApi};
use crate::appliance::{time_remaining_completed, time_remaining_residual};
use crate::coordinator::handler::DeferredUpdate;
use crate::coordinator::{
    Coordinator, CoordinatorEvent, GetEntities, PollTick, PushUpdate, ReadEntity,
};
use crate::entity::{EntityDescriptor, EntityValue};
use crate::errors::ServiceError;
use actix::{fut, ActorFutureExt, Handler, MessageResult, ResponseActFuture, WrapFuture};
use futures::future::join_all;
use log::{debug, error, warn};
use serde_json::Value;

impl Handler<PushUpdate> for Coordinator {
    type Result = ();

    fn handle(&mut self, msg: PushUpdate, ctx: &mut Self::Context) -> Self::Result {
        if !self.is_running() {
            debug!("[{}] Ignoring state update, not running", msg.appliance_id);
            return;
        }
        let Some(appliance) = self.appliances.get_mut(&msg.appliance_id) else {
            debug!("[{}] Ignoring state update of unknown appliance", msg.appliance_id);
            return;
        };

        debug!("[{}] State update: {}", msg.appliance_id, msg.data);
        if !appliance.apply_incremental(&msg.data) {
            return;
        }
        self.notify_listeners(CoordinatorEvent::ApplianceUpdated {
            appliance_id: msg.appliance_id.clone(),
        });

        // no update is sent at the end of a program cycle
        if time_remaining_residual(&msg.data) {
            self.schedule_deferred_update(&msg.appliance_id, ctx);
        } else if time_remaining_completed(&msg.data) {
            self.cancel_deferred_update(&msg.appliance_id, ctx);
        }
    }
}

impl Handler<PollTick> for Coordinator {
    type Result = ResponseActFuture<Self, Result<(), ServiceError>>;

    fn handle(&mut self, _msg: PollTick, _ctx: &mut Self::Context) -> Self::Result {
        if !self.is_running() {
            return Box::pin(fut::result(Err(ServiceError::NotRunning)));
        }
        let api = self.api.clone();
        let ids = self.appliance_ids();

        Box::pin(
            async move { fetch_states(api.as_ref(), ids).await }
                .into_actor(self)
                .map(|results, act, _ctx| {
                    let mut failure = None;
                    for (id, result) in results {
                        match result {
                            Ok(state) => act.apply_state(&id, state),
                            Err(e) => {
                                warn!("[{id}] Unable to refresh appliance state: {e}");
                                failure.get_or_insert((id, e));
                            }
                        }
                    }
                    match failure {
                        Some((id, e)) => Err(act.state_failure(&id, e)),
                        None => Ok(()),
                    }
                }),
        )
    }
}

/// Fetch the states of all appliances. A failing appliance does not affect the others.
async fn fetch_states(
    api: &dyn ApplianceApi,
    ids: Vec<String>,
) -> Vec<(String, Result<Value, ApiError>)> {
    join_all(ids.into_iter().map(|id| async move {
        let result = api.get_state(&id).await;
        (id, result)
    }))
    .await
}

impl Handler<DeferredUpdate> for Coordinator {
    type Result = ResponseActFuture<Self, ()>;

    fn handle(&mut self, msg: DeferredUpdate, _ctx: &mut Self::Context) -> Self::Result {
        self.deferred_updates.remove(&msg.appliance_id);
        if !self.is_running() || !self.appliances.contains_key(&msg.appliance_id) {
            return Box::pin(fut::ready(()));
        }
        debug!("[{}] Running deferred update", msg.appliance_id);

        let api = self.api.clone();
        let id = msg.appliance_id;
        Box::pin(
            async move {
                let result = api.get_state(&id).await;
                (id, result)
            }
            .into_actor(self)
            .map(|(id, result), act, _ctx| match result {
                Ok(state) => act.apply_state(&id, state),
                Err(e) => {
                    let e = act.state_failure(&id, e);
                    error!("Deferred update failed: {e}");
                }
            }),
        )
    }
}

impl Handler<GetEntities> for Coordinator {
    type Result = MessageResult<GetEntities>;

    fn handle(&mut self, _msg: GetEntities, _ctx: &mut Self::Context) -> Self::Result {
        let entities: Vec<EntityDescriptor> = self
            .appliances
            .values()
            .flat_map(|appliance| appliance.descriptors())
            .collect();
        MessageResult(entities)
    }
}

impl Handler<ReadEntity> for Coordinator {
    type Result = Option<EntityValue>;

    fn handle(&mut self, msg: ReadEntity, _ctx: &mut Self::Context) -> Self::Result {
        let entity = self
            .appliances
            .values_mut()
            .find_map(|appliance| appliance.entity_mut(&msg.unique_id));
        match entity {
            Some(entity) => Some(entity.read()),
            None => {
                warn!("Unknown entity: {}", msg.unique_id);
                None
            }
        }
    }
}

impl Coordinator {
    /// Replace the state of an appliance and notify the listeners.
    fn apply_state(&mut self, appliance_id: &str, state: Value) {
        let Some(appliance) = self.appliances.get_mut(appliance_id) else {
            return;
        };
        appliance.apply_full_state(state);
        self.notify_listeners(CoordinatorEvent::ApplianceUpdated {
            appliance_id: appliance_id.to_string(),
        });
    }

    fn state_failure(&mut self, appliance_id: &str, error: ApiError) -> ServiceError {
        if error.is_authentication() {
            self.notify_listeners(CoordinatorEvent::AuthenticationFailed {
                message: error.to_string(),
            });
            return ServiceError::AuthenticationFailed(error.to_string());
        }
        ServiceError::UpdateFailed(format!("[{appliance_id}] {error}"))
    }
}
