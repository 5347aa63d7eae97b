// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Central coordinator owning all appliances of an account.
//!
//! The [`Coordinator`] actor loads the appliances, keeps their state up to date from push
//! updates, polling and deferred refreshes, and executes entity write requests.

mod handler;
mod messages;

pub use messages::*;

use crate::api::{ApplianceApi, SubscriptionHandle};
use crate::appliance::Appliance;
use crate::configuration::{CoordinatorSettings, Settings};
use crate::entity::identity::{EntityRegistry, IdentityScheme};
use actix::prelude::{Actor, AsyncContext, Context, Recipient, SpawnHandle};
use log::{debug, info};
use rust_fsm::*;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

state_machine! {
    derive(Debug)
    CoordinatorMode(Idle)

    Idle => {
        Setup => SettingUp,
        Shutdown => Stopped,
    },
    SettingUp => {
        SetupDone => Running,
        SetupFailed => Idle,
        Shutdown => Stopped,
    },
    Running(Shutdown) => Stopped,
}

pub struct Coordinator {
    api: Arc<dyn ApplianceApi>,
    settings: CoordinatorSettings,
    identity: IdentityScheme,
    /// Host entity registry for legacy unique id lookups.
    registry: Arc<dyn EntityRegistry>,
    appliances: BTreeMap<String, Appliance>,
    listeners: Vec<Recipient<CoordinatorEvent>>,
    /// Active push update subscription
    subscription: Option<SubscriptionHandle>,
    renewal_timer: Option<SpawnHandle>,
    poll_timer: Option<SpawnHandle>,
    /// Pending state refreshes after a residual remaining time, per appliance.
    deferred_updates: HashMap<String, SpawnHandle>,
    machine: StateMachine<CoordinatorMode>,
}

impl Coordinator {
    pub fn new(
        settings: &Settings,
        api: Arc<dyn ApplianceApi>,
        registry: Arc<dyn EntityRegistry>,
    ) -> Self {
        Self {
            api,
            settings: settings.coordinator,
            identity: IdentityScheme::new(
                settings.account.entry_id.clone(),
                &settings.account.api_key,
            ),
            registry,
            appliances: Default::default(),
            listeners: Default::default(),
            subscription: None,
            renewal_timer: None,
            poll_timer: None,
            deferred_updates: Default::default(),
            machine: StateMachine::new(),
        }
    }

    fn is_running(&self) -> bool {
        matches!(self.machine.state(), &CoordinatorModeState::Running)
    }

    fn appliance_ids(&self) -> Vec<String> {
        self.appliances.keys().cloned().collect()
    }

    fn notify_listeners(&mut self, event: CoordinatorEvent) {
        self.listeners.retain(|listener| listener.connected());
        for listener in self.listeners.iter() {
            listener.do_send(event.clone());
        }
    }

    /// Schedule a full state refresh of an appliance, replacing a pending refresh.
    fn schedule_deferred_update(&mut self, appliance_id: &str, ctx: &mut Context<Self>) {
        self.cancel_deferred_update(appliance_id, ctx);
        debug!(
            "[{appliance_id}] Scheduling deferred update in {:?}",
            self.settings.deferred_update_delay
        );
        let handle = ctx.notify_later(
            handler::DeferredUpdate {
                appliance_id: appliance_id.to_string(),
            },
            self.settings.deferred_update_delay,
        );
        self.deferred_updates.insert(appliance_id.to_string(), handle);
    }

    fn cancel_deferred_update(&mut self, appliance_id: &str, ctx: &mut Context<Self>) {
        if let Some(handle) = self.deferred_updates.remove(appliance_id) {
            debug!("[{appliance_id}] Cancelling deferred update");
            ctx.cancel_future(handle);
        }
    }

    /// Start subscription renewal and optional polling.
    fn start_timers(&mut self, ctx: &mut Context<Self>) {
        self.renewal_timer = Some(ctx.run_interval(
            self.settings.renewal_interval,
            |_act, ctx| ctx.notify(handler::RenewSubscription),
        ));

        if !self.settings.poll_interval.is_zero() {
            info!("Polling appliance states every {:?}", self.settings.poll_interval);
            self.poll_timer = Some(ctx.run_interval(self.settings.poll_interval, |_act, ctx| {
                ctx.notify(PollTick)
            }));
        }
    }

    fn stop_timers(&mut self, ctx: &mut Context<Self>) {
        if let Some(handle) = self.renewal_timer.take() {
            ctx.cancel_future(handle);
        }
        if let Some(handle) = self.poll_timer.take() {
            ctx.cancel_future(handle);
        }
        for (appliance_id, handle) in self.deferred_updates.drain() {
            debug!("[{appliance_id}] Cancelling deferred update");
            ctx.cancel_future(handle);
        }
    }
}

impl Actor for Coordinator {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        info!(
            "Coordinator started for config entry {} ({})",
            self.identity.entry_id(),
            self.settings
        );
    }
}
