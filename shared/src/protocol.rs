//! JSON wire types for the poll/submit protocol
//!
//! Request fields are all optional on the wire so that a missing field can be
//! answered with the protocol's own error body instead of a decoder error.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{non_empty, EndpointId};

/// Errors raised while validating an incoming request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("Missing user, device, or command")]
    MissingCommandFields,

    #[error("Missing user or device")]
    MissingEndpoint,

    #[error("Missing user, device, or text")]
    MissingDirectiveFields,
}

/// `POST /command` body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default)]
    pub command: Option<String>,
}

impl SubmitRequest {
    pub fn new(user: &str, device: &str, command: &str) -> Self {
        Self {
            user: Some(user.into()),
            device: Some(device.into()),
            command: Some(command.into()),
        }
    }

    /// Split into the target endpoint and command token
    pub fn validate(&self) -> Result<(EndpointId, String), RequestError> {
        let endpoint = EndpointId::from_parts(self.user.as_deref(), self.device.as_deref())
            .ok_or(RequestError::MissingCommandFields)?;
        let command =
            non_empty(self.command.as_deref()).ok_or(RequestError::MissingCommandFields)?;
        Ok((endpoint, command.to_string()))
    }
}

/// `POST /command` success body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub success: bool,
}

impl SubmitResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// Query string for `GET /poll`, `GET /pending` and `GET /status`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EndpointQuery {
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub device: Option<String>,
}

impl EndpointQuery {
    pub fn new(user: &str, device: &str) -> Self {
        Self {
            user: Some(user.into()),
            device: Some(device.into()),
        }
    }

    pub fn validate(&self) -> Result<EndpointId, RequestError> {
        EndpointId::from_parts(self.user.as_deref(), self.device.as_deref())
            .ok_or(RequestError::MissingEndpoint)
    }

    /// True when neither field was supplied at all
    pub fn is_empty(&self) -> bool {
        non_empty(self.user.as_deref()).is_none() && non_empty(self.device.as_deref()).is_none()
    }
}

/// `GET /poll` body. `command` is `null` when nothing is pending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollResponse {
    pub command: Option<String>,
}

/// `GET /status` body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub online: bool,
}

/// `POST /directives` body: raw AI reply text to scan for directives
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectiveRequest {
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

impl DirectiveRequest {
    pub fn validate(&self) -> Result<(EndpointId, &str), RequestError> {
        let endpoint = EndpointId::from_parts(self.user.as_deref(), self.device.as_deref())
            .ok_or(RequestError::MissingDirectiveFields)?;
        let text = non_empty(self.text.as_deref()).ok_or(RequestError::MissingDirectiveFields)?;
        Ok((endpoint, text))
    }
}

/// `POST /directives` body: tokens queued, in order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectiveResponse {
    pub queued: Vec<String>,
}

/// `GET /pending` body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingResponse {
    pub pending: usize,
    pub oldest_age_ms: Option<u64>,
    pub online: bool,
}

/// Error body for every non-2xx response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
