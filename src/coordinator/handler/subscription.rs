// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Actix message handler for the push update subscription.

use crate::coordinator::handler::{RenewSubscription, Subscribe};
use crate::coordinator::{Coordinator, CoordinatorEvent};
use actix::{fut, ActorFutureExt, AsyncContext, Handler, ResponseActFuture, WrapFuture};
use log::{debug, error, info};

impl Handler<Subscribe> for Coordinator {
    type Result = ResponseActFuture<Self, ()>;

    fn handle(&mut self, _msg: Subscribe, ctx: &mut Self::Context) -> Self::Result {
        let ids = self.appliance_ids();
        if !self.is_running() || ids.is_empty() || self.subscription.is_some() {
            return Box::pin(fut::ready(()));
        }
        debug!("Subscribing to state updates of {}", ids.join(","));

        let api = self.api.clone();
        let recipient = ctx.address().recipient();
        Box::pin(
            async move { api.subscribe_state_updates(ids, recipient).await }
                .into_actor(self)
                .map(|result, act, ctx| match result {
                    Ok(handle) if act.is_running() => {
                        info!("Subscribed to state updates: {handle}");
                        act.subscription = Some(handle);
                    }
                    Ok(handle) => {
                        debug!("Coordinator stopped, closing {handle}");
                        let api = act.api.clone();
                        ctx.spawn(
                            async move {
                                if let Err(e) = api.close_subscription(handle).await {
                                    error!("Could not close {handle}: {e}");
                                }
                            }
                            .into_actor(act),
                        );
                    }
                    Err(e) => {
                        error!("Could not subscribe to state updates: {e}");
                        if e.is_authentication() {
                            act.notify_listeners(CoordinatorEvent::AuthenticationFailed {
                                message: e.to_string(),
                            });
                        }
                    }
                }),
        )
    }
}

impl Handler<RenewSubscription> for Coordinator {
    type Result = ResponseActFuture<Self, ()>;

    fn handle(&mut self, _msg: RenewSubscription, _ctx: &mut Self::Context) -> Self::Result {
        if !self.is_running() {
            return Box::pin(fut::ready(()));
        }
        debug!("Renewing state update subscription");

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
            .into_actor(self)
            .map(|_, _act, ctx| ctx.notify(Subscribe)),
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::api::FixtureCall;
    use crate::coordinator::handler::tests::*;
    use crate::coordinator::{Coordinator, GetStatus, Setup};
    use crate::entity::identity::NoRegistry;
    use actix::Actor;
    use std::sync::Arc;
    use std::time::Duration;

    #[actix::test]
    async fn subscription_is_renewed() {
        let api = fixture_api();
        let mut settings = settings();
        settings.coordinator.renewal_interval = Duration::from_millis(50);
        let addr = Coordinator::new(&settings, api.clone(), Arc::new(NoRegistry)).start();
        addr.send(Setup).await.expect("mailbox").expect("setup");
        settle().await;
        let calls = api.call_count();

        actix::clock::sleep(Duration::from_millis(180)).await;

        assert_eq!(1, api.active_subscriptions());
        assert!(api.call_count() > calls);
        let status = addr.send(GetStatus).await.expect("mailbox");
        assert!(status.subscribed);
    }

    #[actix::test]
    async fn failed_subscription_keeps_coordinator_running() {
        let api = fixture_api();
        api.fail(FixtureCall::Subscribe);
        let (addr, _entities) = setup_coordinator(api.clone()).await;
        settle().await;

        let status = addr.send(GetStatus).await.expect("mailbox");
        assert_eq!("Running", status.mode);
        assert!(!status.subscribed);
        assert_eq!(0, api.active_subscriptions());
    }
}
