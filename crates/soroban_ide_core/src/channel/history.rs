//! Bounded FIFO history of channel messages.

use std::collections::VecDeque;

use serde::Serialize;
use ts_rs::TS;

use super::message::{ChannelMessage, MessageKind};

/// Number of messages kept unless configured otherwise.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Per-kind message counts, as shown in the build output header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MessageCounts {
    /// Info messages.
    pub info: usize,
    /// Error messages.
    pub error: usize,
    /// Success messages.
    pub success: usize,
    /// Warning messages.
    pub warning: usize,
}

impl MessageCounts {
    fn add(&mut self, kind: MessageKind) {
        match kind {
            MessageKind::Info => self.info += 1,
            MessageKind::Error => self.error += 1,
            MessageKind::Success => self.success += 1,
            MessageKind::Warning => self.warning += 1,
        }
    }
}

/// The most recent `capacity` messages, oldest first.
#[derive(Debug, Clone)]
pub struct MessageHistory {
    messages: VecDeque<ChannelMessage>,
    capacity: usize,
    evicted: u64,
}

impl Default for MessageHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl MessageHistory {
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            messages: VecDeque::with_capacity(capacity),
            capacity,
            evicted: 0,
        }
    }

    /// Append, evicting the oldest message when full.
    pub fn push(&mut self, message: ChannelMessage) {
        if self.messages.len() == self.capacity {
            self.messages.pop_front();
            self.evicted += 1;
        }
        self.messages.push_back(message);
    }

    /// Retained messages, oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &ChannelMessage> {
        self.messages.iter()
    }

    /// Copy of the retained messages.
    pub fn to_vec(&self) -> Vec<ChannelMessage> {
        self.messages.iter().cloned().collect()
    }

    /// The last `n` messages, oldest first.
    pub fn tail(&self, n: usize) -> Vec<ChannelMessage> {
        let skip = self.messages.len().saturating_sub(n);
        self.messages.iter().skip(skip).cloned().collect()
    }

    /// Newest message.
    pub fn last(&self) -> Option<&ChannelMessage> {
        self.messages.back()
    }

    /// Number of retained messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// True when nothing is retained.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Maximum number of retained messages.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Messages dropped by eviction since creation.
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    /// Per-kind counts over the retained messages.
    pub fn counts(&self) -> MessageCounts {
        let mut counts = MessageCounts::default();
        for message in &self.messages {
            counts.add(message.kind);
        }
        counts
    }

    /// Drop every message. The eviction count is kept.
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(n: usize) -> ChannelMessage {
        ChannelMessage::new(MessageKind::Info, format!("m{n}"))
    }

    #[test]
    fn test_evicts_oldest_first() {
        let mut history = MessageHistory::new(3);
        for n in 1..=4 {
            history.push(numbered(n));
        }
        let texts: Vec<_> = history.iter().map(|m| m.message.as_str()).collect();
        assert_eq!(texts, ["m2", "m3", "m4"]);
        assert_eq!(history.evicted(), 1);
    }

    #[test]
    fn test_default_capacity_bound() {
        let mut history = MessageHistory::default();
        for n in 1..=DEFAULT_HISTORY_CAPACITY + 1 {
            history.push(numbered(n));
        }
        assert_eq!(history.len(), DEFAULT_HISTORY_CAPACITY);
        assert_eq!(history.iter().next().unwrap().message, "m2");
        assert_eq!(history.last().unwrap().message, "m101");
    }

    #[test]
    fn test_tail() {
        let mut history = MessageHistory::new(10);
        for n in 1..=5 {
            history.push(numbered(n));
        }
        let tail: Vec<_> = history.tail(2).into_iter().map(|m| m.message).collect();
        assert_eq!(tail, ["m4", "m5"]);
        assert_eq!(history.tail(50).len(), 5);
    }

    #[test]
    fn test_counts() {
        let mut history = MessageHistory::new(10);
        history.push(ChannelMessage::new(MessageKind::Error, "e"));
        history.push(ChannelMessage::new(MessageKind::Warning, "w"));
        history.push(ChannelMessage::new(MessageKind::Warning, "w"));
        let counts = history.counts();
        assert_eq!(counts.error, 1);
        assert_eq!(counts.warning, 2);
        assert_eq!(counts.info, 0);
    }

    #[test]
    fn test_zero_capacity_is_raised() {
        let mut history = MessageHistory::new(0);
        history.push(numbered(1));
        history.push(numbered(2));
        assert_eq!(history.len(), 1);
        assert_eq!(history.capacity(), 1);
    }
}
