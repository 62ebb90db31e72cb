//! Transport seam of the live channel.
//!
//! A [`ChannelConnector`] opens one duplex connection and hands back a pair
//! of queues: text frames to send, and [`TransportEvent`]s received. The
//! WebSocket implementation runs the socket in its own task.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use crate::backend::BoxFuture;
use crate::error::{IdeError, Result};

/// Something that happened on an open connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Inbound text frame.
    Frame(String),
    /// Transport error. A `Closed` follows.
    Error(String),
    /// Final event of a connection.
    Closed,
}

/// An open connection as seen by the channel driver.
#[derive(Debug)]
pub struct TransportConnection {
    /// Frames to send.
    pub outgoing: mpsc::UnboundedSender<String>,
    /// Events received.
    pub incoming: mpsc::UnboundedReceiver<TransportEvent>,
}

/// The transport-side ends of a [`TransportConnection`].
#[derive(Debug)]
pub struct TransportPeer {
    /// Where the transport reports events.
    pub events: mpsc::UnboundedSender<TransportEvent>,
    /// Frames the driver wants sent.
    pub outgoing: mpsc::UnboundedReceiver<String>,
}

impl TransportConnection {
    /// A connection plus the peer handles a transport drives it with.
    pub fn pair() -> (TransportConnection, TransportPeer) {
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        (
            TransportConnection {
                outgoing: out_tx,
                incoming: event_rx,
            },
            TransportPeer {
                events: event_tx,
                outgoing: out_rx,
            },
        )
    }
}

/// Opens connections to the event stream.
pub trait ChannelConnector: Send + Sync {
    /// Open a connection to `url`.
    fn connect<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<TransportConnection>>;
}

/// Validate a channel URL (`ws://` or `wss://`).
pub fn parse_channel_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| IdeError::Connection(format!("{raw}: {e}")))?;
    match url.scheme() {
        "ws" | "wss" => Ok(url),
        other => Err(IdeError::Connection(format!(
            "{raw}: unsupported scheme '{other}'"
        ))),
    }
}

/// WebSocket connector built on tokio-tungstenite.
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteConnector;

impl ChannelConnector for TungsteniteConnector {
    fn connect<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<TransportConnection>> {
        Box::pin(async move {
            let url = parse_channel_url(url)?;
            let (stream, _) = tokio_tungstenite::connect_async(url.as_str())
                .await
                .map_err(|e| IdeError::Connection(e.to_string()))?;
            let (connection, peer) = TransportConnection::pair();
            tokio::spawn(pump_socket(stream, peer));
            Ok(connection)
        })
    }
}

/// Shuttle frames between the socket and the peer queues until either side
/// goes away. Dropping the connection's sender closes the socket.
async fn pump_socket<S>(stream: S, peer: TransportPeer)
where
    S: StreamExt<Item = std::result::Result<Message, tokio_tungstenite::tungstenite::Error>>
        + SinkExt<Message>
        + Unpin,
    <S as futures_util::Sink<Message>>::Error: std::fmt::Display,
{
    let TransportPeer {
        events,
        mut outgoing,
    } = peer;
    let (mut write, mut read) = stream.split();

    loop {
        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let _ = events.send(TransportEvent::Frame(text.as_str().to_string()));
                    }
                    Some(Ok(Message::Binary(data))) => {
                        let text = String::from_utf8_lossy(&data).into_owned();
                        let _ = events.send(TransportEvent::Frame(text));
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        log::warn!("[LiveChannel] socket error: {}", e);
                        let _ = events.send(TransportEvent::Error(e.to_string()));
                        break;
                    }
                }
            }
            text = outgoing.recv() => match text {
                Some(text) => {
                    if let Err(e) = write.send(Message::Text(text.into())).await {
                        log::warn!("[LiveChannel] failed to send frame: {}", e);
                        let _ = events.send(TransportEvent::Error(e.to_string()));
                        break;
                    }
                }
                None => {
                    log::debug!("[LiveChannel] driver gone, closing socket");
                    let _ = write.send(Message::Close(None)).await;
                    break;
                }
            },
        }
    }

    let _ = events.send(TransportEvent::Closed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_CHANNEL_URL;

    #[test]
    fn test_parse_channel_url() {
        assert!(parse_channel_url(DEFAULT_CHANNEL_URL).is_ok());
        assert!(parse_channel_url("wss://ide.example.com/ws").is_ok());
        assert!(matches!(
            parse_channel_url("http://localhost:8000"),
            Err(IdeError::Connection(_))
        ));
        assert!(parse_channel_url("not a url").is_err());
    }

    #[test]
    fn test_pair_wires_both_directions() {
        let (mut connection, mut peer) = TransportConnection::pair();
        connection.outgoing.send("ping".into()).unwrap();
        peer.events.send(TransportEvent::Closed).unwrap();
        assert_eq!(peer.outgoing.try_recv().unwrap(), "ping");
        assert_eq!(connection.incoming.try_recv().unwrap(), TransportEvent::Closed);
    }
}
