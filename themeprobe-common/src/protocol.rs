//! Cross-context wire protocol
//!
//! Every message is a JSON object `{ type, id, version, ...payload }`.
//! `id` correlates a reply with its request. `version` must equal
//! [`PROTOCOL_VERSION`] byte for byte or the receiver drops the message.

use crate::model::ProbeRunResult;
use crate::Result;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Protocol compatibility tag
pub const PROTOCOL_VERSION: &str = "theme-probe/v1";

/// Correlation id used by a listener's unsolicited startup READY
pub const INIT_ID: &str = "init";

/// Message envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub id: String,
    pub version: String,
    #[serde(flatten)]
    pub body: MessageBody,
}

/// Message payloads, tagged by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MessageBody {
    /// Reachability probe sent by the bridge
    #[serde(rename = "THEME_PROBE_PING")]
    Ping,

    /// Handshake reply carrying the listener's declared origin
    #[serde(rename = "THEME_PROBE_READY")]
    Ready { origin: String },

    /// Run a full probe for a layer name or `all`
    #[serde(rename = "THEME_PROBE_RUN")]
    Run { screen: String },

    /// Run outcome: exactly one of `result` / `error` is set
    #[serde(rename = "THEME_PROBE_RESULT")]
    Result {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<Box<ProbeRunResult>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        summary: Option<RunSummary>,
    },
}

impl MessageBody {
    /// Wire `type` tag, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            MessageBody::Ping => "THEME_PROBE_PING",
            MessageBody::Ready { .. } => "THEME_PROBE_READY",
            MessageBody::Run { .. } => "THEME_PROBE_RUN",
            MessageBody::Result { .. } => "THEME_PROBE_RESULT",
        }
    }
}

/// Short summary sent alongside a successful result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub total_elements: usize,
}

impl Envelope {
    fn new(id: impl Into<String>, body: MessageBody) -> Self {
        Self {
            id: id.into(),
            version: PROTOCOL_VERSION.to_string(),
            body,
        }
    }

    /// Fresh, globally unique correlation token
    pub fn new_id() -> String {
        Uuid::new_v4().to_string()
    }

    pub fn ping() -> Self {
        Self::new(Self::new_id(), MessageBody::Ping)
    }

    pub fn ready(id: &str, origin: &str) -> Self {
        Self::new(
            id,
            MessageBody::Ready {
                origin: origin.to_string(),
            },
        )
    }

    pub fn run(screen: &str) -> Self {
        Self::new(
            Self::new_id(),
            MessageBody::Run {
                screen: screen.to_string(),
            },
        )
    }

    pub fn result(id: &str, result: ProbeRunResult) -> Self {
        let summary = RunSummary {
            total_elements: result.items.len(),
        };
        Self::new(
            id,
            MessageBody::Result {
                result: Some(Box::new(result)),
                error: None,
                summary: Some(summary),
            },
        )
    }

    pub fn failure(id: &str, error: impl Into<String>) -> Self {
        Self::new(
            id,
            MessageBody::Result {
                result: None,
                error: Some(error.into()),
                summary: None,
            },
        )
    }

    /// True when the sender speaks exactly this protocol version
    pub fn is_compatible(&self) -> bool {
        self.version == PROTOCOL_VERSION
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
