//! Read/send handle over the live channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{broadcast, mpsc};

use super::core::{ChannelCore, ConnectionState};
use super::history::MessageCounts;
use super::message::{ChannelMessage, MessageKind, MessageSource};
use crate::error::Result;

const BROADCAST_CAPACITY: usize = 256;

/// State shared between the driver task and every router handle.
#[derive(Debug)]
pub(crate) struct ChannelShared {
    core: Mutex<ChannelCore>,
    appended: broadcast::Sender<ChannelMessage>,
    running: AtomicBool,
}

impl ChannelShared {
    pub(crate) fn new(core: ChannelCore) -> Self {
        let (appended, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            core: Mutex::new(core),
            appended,
            running: AtomicBool::new(true),
        }
    }

    pub(crate) fn with_core<R>(&self, f: impl FnOnce(&mut ChannelCore) -> R) -> R {
        let mut core = self.core.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut core)
    }

    /// Run a core transition that appends a message, then publish it.
    pub(crate) fn append(&self, f: impl FnOnce(&mut ChannelCore) -> ChannelMessage) {
        let message = self.with_core(f);
        let _ = self.appended.send(message);
    }

    /// Close transition; publishes the warning and returns the reconnect delay.
    pub(crate) fn close(&self) -> Option<Duration> {
        let (message, delay) = self.with_core(|core| core.on_close());
        let _ = self.appended.send(message);
        delay
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub(crate) fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.with_core(|core| core.shutdown());
    }
}

/// Cloneable handle for reading the message history and sending frames.
///
/// # Example
///
/// ```ignore
/// let router = client.router();
/// let mut updates = router.subscribe();
/// router.send(&serde_json::json!({ "type": "ping" }))?;
/// while let Ok(message) = updates.recv().await {
///     println!("{}", message);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MessageRouter {
    shared: Arc<ChannelShared>,
    outgoing: mpsc::UnboundedSender<String>,
}

impl MessageRouter {
    pub(crate) fn new(shared: Arc<ChannelShared>, outgoing: mpsc::UnboundedSender<String>) -> Self {
        Self { shared, outgoing }
    }

    /// A router with no connection behind it. Sends are always dropped;
    /// local messages can still be recorded.
    pub fn detached(history_capacity: usize) -> Self {
        let core = ChannelCore::new(Default::default(), history_capacity);
        let (outgoing, _) = mpsc::unbounded_channel();
        Self::new(Arc::new(ChannelShared::new(core)), outgoing)
    }

    /// Every retained message, oldest first.
    pub fn messages(&self) -> Vec<ChannelMessage> {
        self.shared.with_core(|core| core.history().to_vec())
    }

    /// The last `n` retained messages, oldest first.
    pub fn tail(&self, n: usize) -> Vec<ChannelMessage> {
        self.shared.with_core(|core| core.history().tail(n))
    }

    /// Number of retained messages.
    pub fn len(&self) -> usize {
        self.shared.with_core(|core| core.history().len())
    }

    /// True when no messages are retained.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Per-kind counts over the retained messages.
    pub fn counts(&self) -> MessageCounts {
        self.shared.with_core(|core| core.history().counts())
    }

    /// Messages dropped from the front of the history so far.
    pub fn evicted(&self) -> u64 {
        self.shared.with_core(|core| core.history().evicted())
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.shared.with_core(|core| core.state())
    }

    /// True while frames can be sent.
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Serialize `payload` as JSON and send it if connected.
    ///
    /// Returns `Ok(false)` when the frame was dropped because the channel is
    /// not connected. Nothing is queued for later.
    pub fn send<T: Serialize + ?Sized>(&self, payload: &T) -> Result<bool> {
        let text = serde_json::to_string(payload)?;
        self.shared.with_core(|core| {
            if !core.can_send() {
                log::debug!("[LiveChannel] dropping frame while {:?}", core.state());
                return Ok(false);
            }
            Ok(self.outgoing.send(text).is_ok())
        })
    }

    /// Append a locally produced message (e.g. pipeline progress).
    pub fn record(
        &self,
        kind: MessageKind,
        text: impl Into<String>,
        source: Option<MessageSource>,
    ) -> ChannelMessage {
        let message = match source {
            Some(source) => ChannelMessage::new(kind, text).with_source(source),
            None => ChannelMessage::new(kind, text),
        };
        let appended = message.clone();
        self.shared.append(move |core| core.append(message));
        appended
    }

    /// Drop the retained history.
    pub fn clear(&self) {
        self.shared.with_core(|core| core.history_mut().clear());
    }

    /// Receive every message appended from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ChannelMessage> {
        self.shared.appended.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detached_router_drops_sends() {
        let router = MessageRouter::detached(10);
        assert_eq!(router.state(), ConnectionState::Disconnected);
        assert!(!router.send(&json!({ "type": "ping" })).unwrap());
    }

    #[test]
    fn test_record_and_read() {
        let router = MessageRouter::detached(2);
        let mut updates = router.subscribe();
        router.record(MessageKind::Info, "Compiling...", Some(MessageSource::Compiler));
        router.record(MessageKind::Success, "Compiled", Some(MessageSource::Compiler));
        router.record(MessageKind::Error, "boom", None);

        let texts: Vec<_> = router.messages().into_iter().map(|m| m.message).collect();
        assert_eq!(texts, ["Compiled", "boom"]);
        assert_eq!(router.messages()[0].source, Some(MessageSource::Compiler));
        assert_eq!(router.messages()[1].source, None);
        assert_eq!(router.evicted(), 1);
        assert_eq!(router.counts().error, 1);
        assert_eq!(updates.try_recv().unwrap().message, "Compiling...");

        router.clear();
        assert!(router.is_empty());
    }

    #[test]
    fn test_send_while_connected() {
        let shared = Arc::new(ChannelShared::new(ChannelCore::default()));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let router = MessageRouter::new(Arc::clone(&shared), tx);
        shared.with_core(|core| core.begin_connect());
        shared.append(|core| core.on_open());

        assert!(router.is_connected());
        assert!(router.send(&json!({ "action": "build" })).unwrap());
        assert_eq!(rx.try_recv().unwrap(), r#"{"action":"build"}"#);
    }
}
