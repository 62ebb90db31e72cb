//! Classified channel messages and inbound frame parsing.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

/// Presentation class of a message. Advisory only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Progress or status output.
    #[default]
    Info,
    /// A failure.
    Error,
    /// A completed step.
    Success,
    /// Something worth attention that did not fail.
    Warning,
}

impl MessageKind {
    /// Every kind, in display order.
    pub const ALL: [MessageKind; 4] = [
        MessageKind::Info,
        MessageKind::Error,
        MessageKind::Success,
        MessageKind::Warning,
    ];

    /// Lowercase wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Info => "info",
            MessageKind::Error => "error",
            MessageKind::Success => "success",
            MessageKind::Warning => "warning",
        }
    }

    fn from_wire(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backend stage that produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "lowercase")]
pub enum MessageSource {
    /// Output of the contract build.
    Compiler,
    /// Output of a deployment.
    Deployer,
    /// Output of a contract call.
    Invoker,
}

impl MessageSource {
    fn from_wire(s: &str) -> Option<Self> {
        match s {
            "compiler" => Some(MessageSource::Compiler),
            "deployer" => Some(MessageSource::Deployer),
            "invoker" => Some(MessageSource::Invoker),
            _ => None,
        }
    }
}

/// One entry of the channel history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ChannelMessage {
    /// Severity of the message.
    #[serde(rename = "type")]
    pub kind: MessageKind,
    /// Text shown to the user.
    pub message: String,
    /// Pipeline stage that produced it, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<MessageSource>,
    /// When the message was appended.
    #[ts(type = "string")]
    pub timestamp: DateTime<Utc>,
}

impl ChannelMessage {
    /// A message stamped with the current time.
    pub fn new(kind: MessageKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
            timestamp: Utc::now(),
        }
    }

    /// Attribute the message to a pipeline stage.
    pub fn with_source(mut self, source: MessageSource) -> Self {
        self.source = Some(source);
        self
    }
}

impl fmt::Display for ChannelMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {:<7} {}",
            self.timestamp.format("%H:%M:%S"),
            self.kind.as_str(),
            self.message
        )
    }
}

/// An inbound text frame after classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// A JSON object. Unknown or missing `type` falls back to `info`; a
    /// missing or empty `message` falls back to the raw frame text.
    Structured {
        kind: MessageKind,
        message: String,
        source: Option<MessageSource>,
    },
    /// Anything that is not a JSON object, kept verbatim.
    Raw(String),
}

impl InboundFrame {
    /// Parse a text frame. Unrecognized JSON or plain text becomes an info message.
    pub fn parse(text: &str) -> Self {
        let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(text) else {
            return InboundFrame::Raw(text.to_string());
        };
        let kind = fields
            .get("type")
            .and_then(Value::as_str)
            .and_then(MessageKind::from_wire)
            .unwrap_or_default();
        let message = fields
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .unwrap_or(text)
            .to_string();
        let source = fields
            .get("source")
            .and_then(Value::as_str)
            .and_then(MessageSource::from_wire);
        InboundFrame::Structured {
            kind,
            message,
            source,
        }
    }

    /// Kind the frame will be shown as.
    pub fn kind(&self) -> MessageKind {
        match self {
            InboundFrame::Structured { kind, .. } => *kind,
            InboundFrame::Raw(_) => MessageKind::Info,
        }
    }

    /// Convert into a history entry.
    pub fn into_message(self) -> ChannelMessage {
        match self {
            InboundFrame::Structured {
                kind,
                message,
                source,
            } => ChannelMessage {
                kind,
                message,
                source,
                timestamp: Utc::now(),
            },
            InboundFrame::Raw(text) => ChannelMessage::new(MessageKind::Info, text),
        }
    }
}
