//! Live channel to the build server.
//!
//! The build server streams compiler, deployer and invoker output over a
//! WebSocket. This module keeps that connection alive and retains a bounded
//! history of classified messages for display.
//!
//! ## Layers
//!
//! - [`ChannelCore`]: the connection state machine and history, no I/O.
//! - [`LiveChannelClient`]: tokio task driving the core over a
//!   [`ChannelConnector`] (feature `native-channel`).
//! - [`MessageRouter`]: cloneable handle for reading history, subscribing to
//!   new messages and sending frames.
//!
//! ## Lifecycle
//!
//! ```text
//! Disconnected -> Connecting -> Connected
//!      ^                            |
//!      +---- close (after delay) ---+
//! ```
//!
//! Every close schedules exactly one reconnect after the policy delay (3 s by
//! default). Errors are logged into the history but only the close that
//! follows them triggers reconnection.

mod backoff;
mod core;
mod history;
mod message;

#[cfg(feature = "native-channel")]
mod client;
#[cfg(feature = "native-channel")]
mod router;
#[cfg(feature = "native-channel")]
mod transport;

pub use backoff::{DEFAULT_RECONNECT_DELAY, ReconnectPolicy};
pub use core::{
    CONNECTED_MESSAGE, ChannelCore, ConnectionState, DISCONNECTED_MESSAGE, ERROR_MESSAGE,
};
pub use history::{DEFAULT_HISTORY_CAPACITY, MessageCounts, MessageHistory};
pub use message::{ChannelMessage, InboundFrame, MessageKind, MessageSource};

#[cfg(feature = "native-channel")]
pub use client::{ChannelOptions, LiveChannelClient};
#[cfg(feature = "native-channel")]
pub use router::MessageRouter;
#[cfg(feature = "native-channel")]
pub use transport::{
    ChannelConnector, TransportConnection, TransportEvent, TransportPeer, TungsteniteConnector,
    parse_channel_url,
};
