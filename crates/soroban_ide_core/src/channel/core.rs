//! Connection state machine of the live channel, free of any I/O.
//!
//! The driver feeds transport events in and acts on what comes back: the
//! message to publish, or the delay before the next connection attempt.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::backoff::ReconnectPolicy;
use super::history::MessageHistory;
use super::message::{ChannelMessage, InboundFrame, MessageKind};

/// Appended when the transport opens.
pub const CONNECTED_MESSAGE: &str = "Connected to build server";
/// Appended on a transport error.
pub const ERROR_MESSAGE: &str = "WebSocket connection error";
/// Appended when the transport closes.
pub const DISCONNECTED_MESSAGE: &str = "Disconnected from build server";

/// Connection state of the live channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// No connection and none in progress.
    #[default]
    Disconnected,
    /// A connection attempt is in progress.
    Connecting,
    /// Open. Frames can be sent.
    Connected,
}

/// State machine and history of one live channel session.
#[derive(Debug, Clone, Default)]
pub struct ChannelCore {
    state: ConnectionState,
    history: MessageHistory,
    policy: ReconnectPolicy,
    /// Closes since the last successful open.
    attempt: u32,
    reconnect_scheduled: bool,
}

impl ChannelCore {
    /// A disconnected core with an empty history of `history_capacity` messages.
    pub fn new(policy: ReconnectPolicy, history_capacity: usize) -> Self {
        Self {
            policy,
            history: MessageHistory::new(history_capacity),
            ..Self::default()
        }
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Retained messages.
    pub fn history(&self) -> &MessageHistory {
        &self.history
    }

    /// Mutable access to the retained messages.
    pub fn history_mut(&mut self) -> &mut MessageHistory {
        &mut self.history
    }

    /// Reconnect delay schedule.
    pub fn policy(&self) -> ReconnectPolicy {
        self.policy
    }

    /// True only while connected.
    pub fn can_send(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// `Disconnected -> Connecting`. Returns false from any other state.
    pub fn begin_connect(&mut self) -> bool {
        if self.state != ConnectionState::Disconnected {
            return false;
        }
        self.state = ConnectionState::Connecting;
        self.reconnect_scheduled = false;
        true
    }

    /// The transport opened.
    pub fn on_open(&mut self) -> ChannelMessage {
        self.state = ConnectionState::Connected;
        self.attempt = 0;
        self.append(ChannelMessage::new(MessageKind::Info, CONNECTED_MESSAGE))
    }

    /// An inbound text frame. Never dropped.
    pub fn on_frame(&mut self, text: &str) -> ChannelMessage {
        self.append(InboundFrame::parse(text).into_message())
    }

    /// A transport error. Reconnection is left to the close that follows.
    pub fn on_error(&mut self) -> ChannelMessage {
        self.append(ChannelMessage::new(MessageKind::Error, ERROR_MESSAGE))
    }

    /// The transport closed.
    ///
    /// Returns the warning appended and, the first time after a connect
    /// attempt, the delay before the single scheduled reconnect.
    pub fn on_close(&mut self) -> (ChannelMessage, Option<Duration>) {
        self.state = ConnectionState::Disconnected;
        let message = self.append(ChannelMessage::new(MessageKind::Warning, DISCONNECTED_MESSAGE));
        if self.reconnect_scheduled {
            return (message, None);
        }
        self.reconnect_scheduled = true;
        self.attempt = self.attempt.saturating_add(1);
        (message, Some(self.policy.delay(self.attempt)))
    }

    /// The reconnect timer fired.
    pub fn on_reconnect_due(&mut self) -> bool {
        self.begin_connect()
    }

    /// Append a locally produced message.
    pub fn append(&mut self, message: ChannelMessage) -> ChannelMessage {
        self.history.push(message.clone());
        message
    }

    /// Leave the session: no further reconnects are scheduled.
    pub fn shutdown(&mut self) {
        self.state = ConnectionState::Disconnected;
        self.reconnect_scheduled = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(core: &ChannelCore) -> Vec<MessageKind> {
        core.history().iter().map(|m| m.kind).collect()
    }

    #[test]
    fn test_connect_cycle() {
        let mut core = ChannelCore::default();
        assert_eq!(core.state(), ConnectionState::Disconnected);
        assert!(core.begin_connect());
        assert!(!core.begin_connect());
        assert_eq!(core.state(), ConnectionState::Connecting);

        let message = core.on_open();
        assert_eq!(message.message, CONNECTED_MESSAGE);
        assert!(core.can_send());

        core.on_frame(r#"{"type":"success","message":"done"}"#);
        let (warning, delay) = core.on_close();
        assert_eq!(warning.kind, MessageKind::Warning);
        assert_eq!(delay, Some(Duration::from_secs(3)));
        assert!(!core.can_send());
        assert_eq!(
            kinds(&core),
            [MessageKind::Info, MessageKind::Success, MessageKind::Warning]
        );
    }

    #[test]
    fn test_error_does_not_reconnect() {
        let mut core = ChannelCore::default();
        core.begin_connect();
        core.on_open();
        core.on_error();
        assert_eq!(core.state(), ConnectionState::Connected);
    }

    #[test]
    fn test_exactly_one_reconnect_per_close() {
        let mut core = ChannelCore::default();
        core.begin_connect();
        assert!(core.on_close().1.is_some());
        assert!(core.on_close().1.is_none());
        assert!(core.on_reconnect_due());
        assert_eq!(core.state(), ConnectionState::Connecting);
        assert!(!core.on_reconnect_due());
    }

    #[test]
    fn test_delay_is_fixed_across_cycles() {
        let mut core = ChannelCore::default();
        for _ in 0..50 {
            core.begin_connect();
            core.on_error();
            let (_, delay) = core.on_close();
            assert_eq!(delay, Some(Duration::from_millis(3000)));
        }
        assert_eq!(core.history().len(), 100);
    }

    #[test]
    fn test_shutdown_stops_scheduling() {
        let mut core = ChannelCore::default();
        core.begin_connect();
        core.on_open();
        core.shutdown();
        assert_eq!(core.on_close().1, None);
    }
}
