// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Actix message handler for the coordinator lifecycle: setup, listeners and shutdown.

use crate::api::{ApplianceApi, ApplianceSummary};
use crate::appliance::Appliance;
use crate::coordinator::handler::Subscribe;
use crate::coordinator::{
    AddListener, Coordinator, CoordinatorEvent, CoordinatorModeInput, CoordinatorModeState,
    CoordinatorStatus, GetStatus, Setup, Shutdown,
};
use crate::entity::EntityDescriptor;
use crate::errors::ServiceError;
use actix::{fut, ActorFutureExt, AsyncContext, Handler, ResponseActFuture, WrapFuture};
use futures::future::try_join_all;
use log::{debug, error, info, warn};
use serde_json::Value;
use std::sync::Arc;

impl Handler<Setup> for Coordinator {
    type Result = ResponseActFuture<Self, Result<Vec<EntityDescriptor>, ServiceError>>;

    fn handle(&mut self, _msg: Setup, _ctx: &mut Self::Context) -> Self::Result {
        if self.machine.consume(&CoordinatorModeInput::Setup).is_err() {
            warn!("Setup not possible in state {:?}", self.machine.state());
            return Box::pin(fut::result(Err(ServiceError::InternalServerError(format!(
                "Setup not possible in state {:?}",
                self.machine.state()
            )))));
        }

        let api = self.api.clone();

        Box::pin(
            async move { load_appliances(api).await }
                .into_actor(self)
                .map(|result, act, ctx| {
                    if !matches!(act.machine.state(), &CoordinatorModeState::SettingUp) {
                        info!("Discarding setup result, coordinator has been stopped");
                        return Err(ServiceError::NotRunning);
                    }

                    let appliances = match result {
                        Ok(appliances) => appliances,
                        Err(e) => {
                            let _ = act.machine.consume(&CoordinatorModeInput::SetupFailed);
                            if let ServiceError::AuthenticationFailed(message) = &e {
                                act.notify_listeners(CoordinatorEvent::AuthenticationFailed {
                                    message: message.clone(),
                                });
                            }
                            return Err(e);
                        }
                    };

                    let mut descriptors = Vec::new();
                    for mut appliance in appliances {
                        let count = appliance.setup(&act.identity, act.registry.as_ref());
                        info!(
                            "[{}] {} {} ({}): {count} entities",
                            appliance.id, appliance.brand, appliance.name, appliance.model
                        );
                        descriptors.extend(appliance.descriptors());
                        act.appliances.insert(appliance.id.clone(), appliance);
                    }

                    let _ = act.machine.consume(&CoordinatorModeInput::SetupDone);
                    act.start_timers(ctx);
                    ctx.notify(Subscribe);

                    Ok(descriptors)
                }),
        )
    }
}

/// Load all appliances of the account. Fails if the list or the state of an appliance is unavailable.
async fn load_appliances(api: Arc<dyn ApplianceApi>) -> Result<Vec<Appliance>, ServiceError> {
    let summaries = api.list_appliances().await.map_err(|e| {
        error!("Unable to retrieve the appliance list, cancelling setup: {e}");
        if e.is_authentication() {
            ServiceError::AuthenticationFailed(e.to_string())
        } else {
            ServiceError::ApplianceListUnavailable(e.to_string())
        }
    })?;
    debug!("Found {} appliances", summaries.len());

    let api_ref = api.as_ref();
    try_join_all(
        summaries
            .into_iter()
            .map(|summary| load_appliance(api_ref, summary)),
    )
    .await
}

async fn load_appliance(
    api: &dyn ApplianceApi,
    mut summary: ApplianceSummary,
) -> Result<Appliance, ServiceError> {
    let id = summary.id.clone();
    let (info, state, capabilities) = futures::join!(
        api.get_appliance_info(&id),
        api.get_state(&id),
        api.get_capabilities(&id)
    );

    let state = state.map_err(|e| {
        error!("[{id}] Unable to retrieve appliance state, cancelling setup: {e}");
        if e.is_authentication() {
            ServiceError::AuthenticationFailed(e.to_string())
        } else {
            ServiceError::StateUnavailable {
                appliance_id: id.clone(),
                message: e.to_string(),
            }
        }
    })?;

    match info {
        Ok(info) => apply_info(&mut summary, &info),
        Err(e) => warn!("[{id}] Unable to retrieve appliance info: {e}"),
    }

    let capabilities = match capabilities {
        Ok(capabilities) => Some(capabilities),
        Err(e) => {
            warn!("[{id}] Unable to retrieve capabilities, continuing without: {e}");
            None
        }
    };

    Ok(Appliance::new(&summary, state, capabilities))
}

/// Take over brand, model and type from the appliance info.
fn apply_info(summary: &mut ApplianceSummary, info: &Value) {
    let info = match info {
        Value::Array(list) => list.first(),
        other => Some(other),
    };
    let Some(info) = info.and_then(Value::as_object) else {
        return;
    };
    let text = |key: &str| {
        info.get(key)
            .and_then(Value::as_str)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    if let Some(brand) = text("brand") {
        summary.brand = brand;
    }
    if let Some(model) = text("model") {
        summary.model = model;
    }
    if summary.appliance_type.is_none() {
        summary.appliance_type = text("deviceType");
    }
}

impl Handler<AddListener> for Coordinator {
    type Result = ();

    fn handle(&mut self, msg: AddListener, _ctx: &mut Self::Context) -> Self::Result {
        self.listeners.push(msg.0);
    }
}

impl Handler<GetStatus> for Coordinator {
    type Result = actix::MessageResult<GetStatus>;

    fn handle(&mut self, _msg: GetStatus, _ctx: &mut Self::Context) -> Self::Result {
        let mut pending_updates: Vec<String> = self.deferred_updates.keys().cloned().collect();
        pending_updates.sort();
        actix::MessageResult(CoordinatorStatus {
            mode: format!("{:?}", self.machine.state()),
            appliances: self.appliances.len(),
            subscribed: self.subscription.is_some(),
            pending_updates,
        })
    }
}

impl Handler<Shutdown> for Coordinator {
    type Result = ResponseActFuture<Self, ()>;

    fn handle(&mut self, _msg: Shutdown, ctx: &mut Self::Context) -> Self::Result {
        if self.machine.consume(&CoordinatorModeInput::Shutdown).is_err() {
            debug!("Coordinator already stopped");
            return Box::pin(fut::ready(()));
        }
        info!("Shutting down coordinator");
        self.stop_timers(ctx);

        let subscription = self.subscription.take();
        let api = self.api.clone();
        Box::pin(
            async move {
                if let Some(handle) = subscription {
                    if let Err(e) = api.close_subscription(handle).await {
                        error!("Could not close {handle}: {e}");
                    }
                }
            }
            .into_actor(self),
        )
    }
}
