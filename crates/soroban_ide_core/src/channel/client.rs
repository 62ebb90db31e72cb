//! Tokio driver that keeps the live channel connected.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::backoff::ReconnectPolicy;
use super::core::ChannelCore;
use super::history::DEFAULT_HISTORY_CAPACITY;
use super::router::{ChannelShared, MessageRouter};
use super::transport::{ChannelConnector, TransportEvent};

/// Tuning for a [`LiveChannelClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelOptions {
    /// Delay schedule between reconnect attempts.
    pub policy: ReconnectPolicy,
    /// Number of messages kept in history.
    pub history_capacity: usize,
}

impl Default for ChannelOptions {
    fn default() -> Self {
        Self {
            policy: ReconnectPolicy::default(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

/// Reconnect-forever client for the build server's event stream.
///
/// Owns the background task; dropping the client or calling
/// [`shutdown`](Self::shutdown) ends the session.
pub struct LiveChannelClient {
    shared: Arc<ChannelShared>,
    router: MessageRouter,
    task: Option<JoinHandle<()>>,
}

impl LiveChannelClient {
    /// Start connecting to `url` in a background task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        url: impl Into<String>,
        connector: Arc<dyn ChannelConnector>,
        options: ChannelOptions,
    ) -> Self {
        let url = url.into();
        let shared = Arc::new(ChannelShared::new(ChannelCore::new(
            options.policy,
            options.history_capacity,
        )));
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let router = MessageRouter::new(Arc::clone(&shared), outgoing_tx);

        log::info!("[LiveChannel] starting for {}", url);
        let task = tokio::spawn(run_channel(
            url,
            connector,
            Arc::clone(&shared),
            outgoing_rx,
        ));

        Self {
            shared,
            router,
            task: Some(task),
        }
    }

    /// A handle to the message history and send queue.
    pub fn router(&self) -> MessageRouter {
        self.router.clone()
    }

    /// False once the client has been shut down.
    pub fn is_running(&self) -> bool {
        self.shared.is_running()
    }

    /// Stop the driver task. The history stays readable through routers.
    pub fn shutdown(&mut self) {
        if let Some(task) = self.task.take() {
            log::info!("[LiveChannel] shutting down");
            self.shared.stop();
            task.abort();
        }
    }
}

impl Drop for LiveChannelClient {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn run_channel(
    url: String,
    connector: Arc<dyn ChannelConnector>,
    shared: Arc<ChannelShared>,
    mut outgoing_rx: mpsc::UnboundedReceiver<String>,
) {
    while shared.is_running() {
        if !shared.with_core(|core| core.begin_connect()) {
            break;
        }
        log::info!("[LiveChannel] connecting to {}", url);

        match connector.connect(&url).await {
            Ok(mut connection) => {
                // Frames accepted before the previous disconnect are stale.
                while outgoing_rx.try_recv().is_ok() {}
                shared.append(|core| core.on_open());
                log::info!("[LiveChannel] connected");

                loop {
                    tokio::select! {
                        event = connection.incoming.recv() => match event {
                            Some(TransportEvent::Frame(text)) => {
                                shared.append(|core| core.on_frame(&text));
                            }
                            Some(TransportEvent::Error(e)) => {
                                log::warn!("[LiveChannel] transport error: {}", e);
                                shared.append(|core| core.on_error());
                            }
                            Some(TransportEvent::Closed) | None => break,
                        },
                        Some(text) = outgoing_rx.recv() => {
                            if connection.outgoing.send(text).is_err() {
                                log::debug!("[LiveChannel] transport gone, frame dropped");
                            }
                        }
                    }
                }
            }
            Err(e) => {
                log::error!("[LiveChannel] connection failed: {}", e);
                shared.append(|core| core.on_error());
            }
        }

        let delay = shared.close();
        if !shared.is_running() {
            break;
        }
        let Some(delay) = delay else {
            break;
        };
        log::info!("[LiveChannel] reconnecting in {}ms", delay.as_millis());
        tokio::time::sleep(delay).await;
    }

    log::info!("[LiveChannel] loop ended");
}
