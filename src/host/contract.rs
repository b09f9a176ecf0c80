//! Versioned command/response envelopes for the NDJSON host bridge.

use serde::{Deserialize, Serialize};

use crate::error::NpaError;

/// Contract version for command/response envelopes.
pub const PROTOCOL_VERSION: u32 = 1;

/// Commands understood by the host bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandName {
    /// Payload: a document descriptor.
    #[serde(rename = "search.run")]
    SearchRun,
    /// Payload: a registry record.
    #[serde(rename = "search.consolidated")]
    SearchConsolidated,
    /// Payload: `{descriptor, candidate}`.
    #[serde(rename = "search.explain")]
    SearchExplain,
    #[serde(rename = "search.stats")]
    SearchStats,
    /// Payload: `{candidate, path}`.
    #[serde(rename = "document.download")]
    DocumentDownload,
    #[serde(rename = "host.stop")]
    HostStop,
}

impl CommandName {
    /// Render command name to wire format.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SearchRun => "search.run",
            Self::SearchConsolidated => "search.consolidated",
            Self::SearchExplain => "search.explain",
            Self::SearchStats => "search.stats",
            Self::DocumentDownload => "document.download",
            Self::HostStop => "host.stop",
        }
    }
}

/// A versioned command envelope from client -> host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    pub v: u32,
    pub request_id: String,
    pub command: CommandName,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl CommandEnvelope {
    /// Build a v1 command envelope.
    #[must_use]
    pub fn new(
        request_id: impl Into<String>,
        command: CommandName,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            v: PROTOCOL_VERSION,
            request_id: request_id.into(),
            command,
            payload,
        }
    }

    /// Validate envelope version and request id.
    pub fn validate(&self) -> Result<(), NpaError> {
        if self.v != PROTOCOL_VERSION {
            return Err(NpaError::Protocol(format!(
                "unsupported contract version {}; expected {PROTOCOL_VERSION}",
                self.v
            )));
        }
        if self.request_id.trim().is_empty() {
            return Err(NpaError::Protocol("request_id cannot be empty".to_owned()));
        }
        Ok(())
    }
}

/// A versioned response envelope from host -> client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub v: u32,
    pub request_id: String,
    pub ok: bool,
    pub payload: serde_json::Value,
    pub error: Option<String>,
}

impl ResponseEnvelope {
    /// Build a successful response envelope.
    #[must_use]
    pub fn ok(request_id: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            v: PROTOCOL_VERSION,
            request_id: request_id.into(),
            ok: true,
            payload,
            error: None,
        }
    }

    /// Build an error response envelope.
    #[must_use]
    pub fn error(request_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            v: PROTOCOL_VERSION,
            request_id: request_id.into(),
            ok: false,
            payload: serde_json::Value::Null,
            error: Some(message.into()),
        }
    }
}
