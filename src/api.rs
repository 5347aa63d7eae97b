// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Appliance cloud API contract.
//!
//! The [`ApplianceApi`] trait is the only way the coordinator talks to the vendor cloud. Transport,
//! authentication and token refresh are the responsibility of the implementation.
//! [`FixtureApi`] serves appliances from in-memory fixtures or a fixture directory.

use crate::coordinator::PushUpdate;
use crate::errors::ServiceError;
use actix::Recipient;
use async_trait::async_trait;
use derive_more::Display;
use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Appliance entry of the appliance list.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ApplianceSummary {
    #[serde(alias = "applianceId")]
    pub id: String,
    #[serde(alias = "applianceName")]
    pub name: String,
    pub brand: String,
    pub model: String,
    #[serde(alias = "applianceType")]
    pub appliance_type: Option<String>,
}

/// Handle of an active state update subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[display("subscription-{_0}")]
pub struct SubscriptionHandle(pub u64);

/// Appliance API failure.
#[derive(Debug, Clone, Display, PartialEq)]
pub enum ApiError {
    #[display("Authentication failed: {_0}")]
    Authentication(String),
    #[display("HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[display("Transport error: {_0}")]
    Transport(String),
}

impl std::error::Error for ApiError {}

impl ApiError {
    pub fn is_authentication(&self) -> bool {
        matches!(self, ApiError::Authentication(_))
            || matches!(self, ApiError::Http { status: 401 | 403, .. })
    }
}

/// Vendor cloud API operations.
#[async_trait]
pub trait ApplianceApi: Send + Sync {
    async fn list_appliances(&self) -> Result<Vec<ApplianceSummary>, ApiError>;

    /// Optional appliance metadata.
    async fn get_appliance_info(&self, appliance_id: &str) -> Result<Value, ApiError>;

    /// Full appliance state.
    async fn get_state(&self, appliance_id: &str) -> Result<Value, ApiError>;

    /// Capability tree of an appliance.
    async fn get_capabilities(&self, appliance_id: &str) -> Result<Value, ApiError>;

    async fn execute_command(&self, appliance_id: &str, command: Value) -> Result<Value, ApiError>;

    /// Subscribe to state updates of the given appliances. Updates are delivered to `recipient`.
    async fn subscribe_state_updates(
        &self,
        appliance_ids: Vec<String>,
        recipient: Recipient<PushUpdate>,
    ) -> Result<SubscriptionHandle, ApiError>;

    async fn close_subscription(&self, handle: SubscriptionHandle) -> Result<(), ApiError>;
}

/// API operations of [`FixtureApi`] which can be set to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixtureCall {
    ListAppliances,
    ApplianceInfo,
    State,
    Capabilities,
    Subscribe,
}

#[derive(Debug, Clone)]
struct FixtureAppliance {
    summary: ApplianceSummary,
    state: Value,
    capabilities: Option<Value>,
    info: Option<Value>,
}

/// Appliance API backed by static fixtures.
///
/// Executed commands are recorded and can be inspected with [`FixtureApi::commands`].
#[derive(Default)]
pub struct FixtureApi {
    appliances: Mutex<Vec<FixtureAppliance>>,
    commands: Mutex<Vec<(String, Value)>>,
    command_errors: Mutex<VecDeque<ApiError>>,
    failures: Mutex<HashSet<FixtureCall>>,
    state_errors: Mutex<HashMap<String, ApiError>>,
    subscriptions: Mutex<HashMap<SubscriptionHandle, (Vec<String>, Recipient<PushUpdate>)>>,
    next_handle: AtomicU64,
    call_count: AtomicU64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl FixtureApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an appliance with its state and capability tree.
    pub fn with_appliance(
        self,
        summary: ApplianceSummary,
        state: Value,
        capabilities: Option<Value>,
    ) -> Self {
        lock(&self.appliances).push(FixtureAppliance {
            summary,
            state,
            capabilities,
            info: None,
        });
        self
    }

    /// Load fixtures from a directory.
    ///
    /// Expected layout:
    /// - `appliances.json`: appliance list.
    /// - `<appliance_id>/state.json`: appliance state, required.
    /// - `<appliance_id>/capabilities.json`: capability tree, optional.
    /// - `<appliance_id>/info.json`: appliance metadata, optional.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, ServiceError> {
        let dir = dir.as_ref();
        let list = fs::read_to_string(dir.join("appliances.json"))?;
        let summaries: Vec<ApplianceSummary> = serde_json::from_str(&list)?;

        let api = Self::new();
        for summary in summaries {
            let appliance_dir = dir.join(&summary.id);
            let state: Value =
                serde_json::from_str(&fs::read_to_string(appliance_dir.join("state.json"))?)?;
            let capabilities = read_optional(&appliance_dir.join("capabilities.json"))?;
            let info = read_optional(&appliance_dir.join("info.json"))?;
            debug!(
                "[{}] Loaded fixture (capabilities: {})",
                summary.id,
                capabilities.is_some()
            );
            lock(&api.appliances).push(FixtureAppliance {
                summary,
                state,
                capabilities,
                info,
            });
        }
        info!(
            "Loaded {} appliance fixtures from {}",
            lock(&api.appliances).len(),
            dir.display()
        );
        Ok(api)
    }

    /// Replace the state returned for an appliance.
    pub fn set_state(&self, appliance_id: &str, state: Value) {
        if let Some(appliance) = lock(&self.appliances)
            .iter_mut()
            .find(|a| a.summary.id == appliance_id)
        {
            appliance.state = state;
        }
    }

    /// Let the next command execution fail with the given error.
    pub fn push_command_error(&self, error: ApiError) {
        lock(&self.command_errors).push_back(error);
    }

    /// Let all calls of the given operation fail.
    pub fn fail(&self, call: FixtureCall) {
        lock(&self.failures).insert(call);
    }

    /// Let the state requests of one appliance fail with the given error.
    pub fn fail_state(&self, appliance_id: &str, error: ApiError) {
        lock(&self.state_errors).insert(appliance_id.to_string(), error);
    }

    /// Executed commands: appliance id and command body.
    pub fn commands(&self) -> Vec<(String, Value)> {
        lock(&self.commands).clone()
    }

    /// Number of API calls.
    pub fn call_count(&self) -> u64 {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn active_subscriptions(&self) -> usize {
        lock(&self.subscriptions).len()
    }

    /// Deliver a state update to all subscribers of the appliance.
    pub fn push(&self, appliance_id: &str, data: Value) {
        for (ids, recipient) in lock(&self.subscriptions).values() {
            if ids.iter().any(|id| id == appliance_id) {
                recipient.do_send(PushUpdate {
                    appliance_id: appliance_id.to_string(),
                    data: data.clone(),
                });
            }
        }
    }

    fn check(&self, call: FixtureCall) -> Result<(), ApiError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if lock(&self.failures).contains(&call) {
            return Err(ApiError::Transport(format!("{call:?} unavailable")));
        }
        Ok(())
    }

    fn appliance(&self, appliance_id: &str) -> Result<FixtureAppliance, ApiError> {
        lock(&self.appliances)
            .iter()
            .find(|a| a.summary.id == appliance_id)
            .cloned()
            .ok_or_else(|| ApiError::Http {
                status: 404,
                message: format!("Appliance {appliance_id} not found"),
            })
    }
}

fn read_optional(path: &Path) -> Result<Option<Value>, ServiceError> {
    if !path.exists() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(&fs::read_to_string(path)?)?))
}

#[async_trait]
impl ApplianceApi for FixtureApi {
    async fn list_appliances(&self) -> Result<Vec<ApplianceSummary>, ApiError> {
        self.check(FixtureCall::ListAppliances)?;
        Ok(lock(&self.appliances)
            .iter()
            .map(|a| a.summary.clone())
            .collect())
    }

    async fn get_appliance_info(&self, appliance_id: &str) -> Result<Value, ApiError> {
        self.check(FixtureCall::ApplianceInfo)?;
        Ok(self.appliance(appliance_id)?.info.unwrap_or(Value::Null))
    }

    async fn get_state(&self, appliance_id: &str) -> Result<Value, ApiError> {
        self.check(FixtureCall::State)?;
        if let Some(error) = lock(&self.state_errors).get(appliance_id) {
            return Err(error.clone());
        }
        Ok(self.appliance(appliance_id)?.state)
    }

    async fn get_capabilities(&self, appliance_id: &str) -> Result<Value, ApiError> {
        self.check(FixtureCall::Capabilities)?;
        self.appliance(appliance_id)?
            .capabilities
            .ok_or_else(|| ApiError::Http {
                status: 404,
                message: "No capabilities".into(),
            })
    }

    async fn execute_command(&self, appliance_id: &str, command: Value) -> Result<Value, ApiError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        lock(&self.commands).push((appliance_id.to_string(), command));
        if let Some(error) = lock(&self.command_errors).pop_front() {
            return Err(error);
        }
        Ok(Value::Null)
    }

    async fn subscribe_state_updates(
        &self,
        appliance_ids: Vec<String>,
        recipient: Recipient<PushUpdate>,
    ) -> Result<SubscriptionHandle, ApiError> {
        self.check(FixtureCall::Subscribe)?;
        let handle = SubscriptionHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        lock(&self.subscriptions).insert(handle, (appliance_ids, recipient));
        Ok(handle)
    }

    async fn close_subscription(&self, handle: SubscriptionHandle) -> Result<(), ApiError> {
        if lock(&self.subscriptions).remove(&handle).is_none() {
            warn!("Unknown {handle}");
        }
        Ok(())
    }
}
