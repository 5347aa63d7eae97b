// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Custom application errors with conversions from common Rust and 3rd-party errors.
//!
//! - [`ServiceError`]: setup, polling and internal coordinator failures.
//! - [`CommandError`]: user actionable entity write failures. Raw transport errors are never
//!   exposed to the caller, they are classified with [`classify_command_error`].

use crate::api::ApiError;
use crate::capability::CapabilityDescriptor;
use actix::MailboxError;
use actix::dev::SendError;
use derive_more::Display;
use log::error;

#[derive(Debug, Display, PartialEq)]
pub enum ServiceError {
    #[display("Internal server error: {_0}")]
    InternalServerError(String),

    #[display("Internal serialization error: {_0}")]
    SerializationError(String),

    #[display("Appliance list unavailable: {_0}")]
    ApplianceListUnavailable(String),

    #[display("[{appliance_id}] Appliance state unavailable: {message}")]
    StateUnavailable {
        appliance_id: String,
        message: String,
    },

    #[display("Authentication failed: {_0}")]
    AuthenticationFailed(String),

    #[display("Update failed: {_0}")]
    UpdateFailed(String),

    #[display("Not found: {_0}")]
    NotFound(String),

    #[display("Coordinator is not running")]
    NotRunning,
}

impl std::error::Error for ServiceError {}

impl From<std::io::Error> for ServiceError {
    fn from(e: std::io::Error) -> Self {
        ServiceError::InternalServerError(format!("{e:?}"))
    }
}

impl From<MailboxError> for ServiceError {
    fn from(e: MailboxError) -> Self {
        ServiceError::InternalServerError(format!("Internal message error: {e:?}"))
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(e: serde_json::Error) -> Self {
        error!("{e:?}");
        ServiceError::SerializationError(e.to_string())
    }
}

impl From<strum::ParseError> for ServiceError {
    fn from(e: strum::ParseError) -> Self {
        ServiceError::SerializationError(e.to_string())
    }
}

impl<T> From<SendError<T>> for ServiceError {
    fn from(e: SendError<T>) -> Self {
        ServiceError::InternalServerError(format!("Error sending internal message: {e:?}"))
    }
}

/// Entity write failure.
#[derive(Debug, Display, Clone, PartialEq)]
pub enum CommandError {
    #[display("Remote control is disabled for this appliance ({_0}). Please check the appliance settings.")]
    RemoteControlDisabled(String),

    #[display("Command rejected by the appliance: {_0}")]
    CommandValidation(String),

    #[display("Appliance is disconnected or not available")]
    ApplianceOffline,

    #[display("Too many requests. Please wait a moment and try again.")]
    RateLimited,

    #[display("Authentication failed: {_0}")]
    Authentication(String),

    #[display("Entity '{_0}' does not accept commands")]
    NotWritable(String),

    #[display("Unknown entity: {_0}")]
    UnknownEntity(String),

    #[display("Unexpected error: {_0}")]
    Unexpected(String),
}

impl std::error::Error for CommandError {}

impl From<MailboxError> for CommandError {
    fn from(e: MailboxError) -> Self {
        CommandError::Unexpected(format!("Internal message error: {e:?}"))
    }
}

/// Translate a failed command execution into the user facing [`CommandError`] taxonomy.
///
/// # Arguments
///
/// * `error`: error returned by the appliance API.
/// * `attr`: attribute the command was sent for.
/// * `capability`: capability of the attribute, used to describe validation failures.
pub fn classify_command_error(
    error: &ApiError,
    attr: &str,
    capability: &CapabilityDescriptor,
) -> CommandError {
    let (status, message) = match error {
        ApiError::Authentication(msg) => return CommandError::Authentication(msg.clone()),
        ApiError::Http { status, message } => (Some(*status), message.as_str()),
        ApiError::Transport(msg) => (None, msg.as_str()),
    };
    let lower = message.to_lowercase();

    if matches!(status, Some(401) | Some(403)) {
        return CommandError::Authentication(message.to_string());
    }
    if status == Some(429) || lower.contains("rate limit") || lower.contains("too many requests")
    {
        return CommandError::RateLimited;
    }
    if lower.contains("command_validation_error") || lower.contains("validation") {
        return CommandError::CommandValidation(describe_validation_failure(attr, capability));
    }
    if lower.contains("disconnected") || lower.contains("offline") || lower.contains("not connected")
    {
        return CommandError::ApplianceOffline;
    }

    CommandError::Unexpected(message.to_string())
}

fn describe_validation_failure(attr: &str, capability: &CapabilityDescriptor) -> String {
    let mut msg = format!("invalid value for '{attr}'");
    if let Some(value_type) = capability.value_type {
        msg.push_str(&format!(", expected type {value_type}"));
    }
    match (capability.min, capability.max) {
        (Some(min), Some(max)) => msg.push_str(&format!(", range {min}..{max}")),
        (Some(min), None) => msg.push_str(&format!(", minimum {min}")),
        (None, Some(max)) => msg.push_str(&format!(", maximum {max}")),
        (None, None) => {}
    }
    if let Some(step) = capability.step {
        msg.push_str(&format!(", step {step}"));
    }
    if let Some(values) = capability.values.as_ref().filter(|v| !v.is_empty()) {
        let keys: Vec<&str> = values.keys().map(|k| k.as_str()).collect();
        msg.push_str(&format!(", allowed values: {}", keys.join(", ")));
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn temperature_capability() -> CapabilityDescriptor {
        CapabilityDescriptor::parse(
            "targetTemperatureC",
            &json!({"access": "readwrite", "type": "temperature", "min": 15.56, "max": 32.22, "step": 1}),
        )
    }

    #[rstest]
    #[case(ApiError::Authentication("token expired".into()), "Authentication")]
    #[case(ApiError::Http { status: 401, message: "Unauthorized".into() }, "Authentication")]
    #[case(ApiError::Http { status: 429, message: "slow down".into() }, "RateLimited")]
    #[case(ApiError::Transport("Rate limit exceeded".into()), "RateLimited")]
    #[case(ApiError::Http { status: 406, message: "COMMAND_VALIDATION_ERROR: bad value".into() }, "CommandValidation")]
    #[case(ApiError::Http { status: 409, message: "Appliance DISCONNECTED".into() }, "ApplianceOffline")]
    #[case(ApiError::Transport("connection reset by peer".into()), "Unexpected")]
    fn classify_error(#[case] error: ApiError, #[case] expected: &str) {
        let result = classify_command_error(&error, "targetTemperatureC", &temperature_capability());
        let variant = match result {
            CommandError::Authentication(_) => "Authentication",
            CommandError::RateLimited => "RateLimited",
            CommandError::CommandValidation(_) => "CommandValidation",
            CommandError::ApplianceOffline => "ApplianceOffline",
            CommandError::Unexpected(_) => "Unexpected",
            _ => "other",
        };
        assert_eq!(expected, variant);
    }

    #[test]
    fn validation_error_describes_capability() {
        let error = ApiError::Http {
            status: 406,
            message: "command_validation_error".into(),
        };
        let result = classify_command_error(&error, "targetTemperatureC", &temperature_capability());
        match result {
            CommandError::CommandValidation(msg) => {
                assert!(msg.contains("targetTemperatureC"), "{msg}");
                assert!(msg.contains("type temperature"), "{msg}");
                assert!(msg.contains("range 15.56..32.22"), "{msg}");
                assert!(msg.contains("step 1"), "{msg}");
            }
            _ => panic!("Expected CommandValidation, got: {result:?}"),
        }
    }

    #[test]
    fn unexpected_error_keeps_raw_message() {
        let error = ApiError::Transport("socket closed unexpectedly".into());
        let result = classify_command_error(&error, "mode", &temperature_capability());
        assert_eq!(
            CommandError::Unexpected("socket closed unexpectedly".into()),
            result
        );
    }
}
