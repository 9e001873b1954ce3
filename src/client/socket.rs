//! Subscription Socket Client
//!
//! One WebSocket connection per client, multiplexing any number of
//! subscriptions. A background driver task owns the socket: commands
//! (subscribe/unsubscribe) go in over a channel, and incoming `{id, event}`
//! replies are dispatched to the matching subscription's channel.
//!
//! Dropping a subscription receiver ends that subscription (the driver
//! notices on the next delivery and sends `UNSUB`); dropping the last
//! `SocketClient` handle closes the connection.

use std::collections::HashMap;

use futures_util::{Sink, SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::shared::error::SharedError;
use crate::shared::event::{ChangeEvent, SocketReply, SocketRequest};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

enum Command {
    Subscribe {
        id: String,
        route: String,
        tx: mpsc::UnboundedSender<ChangeEvent>,
    },
    Unsubscribe {
        id: String,
    },
}

/// Handle to the subscription socket; cheap to clone
#[derive(Clone)]
pub struct SocketClient {
    cmd_tx: mpsc::UnboundedSender<Command>,
}

/// Turn an http(s) base URL into the ws(s) endpoint URL
fn ws_url(base_url: &str, token: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        base.to_string()
    };
    format!("{}/api/ws?token={}", base, token)
}

impl SocketClient {
    /// Connect and authenticate the subscription socket
    pub async fn connect(base_url: &str, token: &str) -> Result<Self, SharedError> {
        let url = ws_url(base_url, token);
        let (socket, _response) = connect_async(url.as_str())
            .await
            .map_err(|e| SharedError::store_unavailable(format!("socket connect: {}", e)))?;

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        tokio::spawn(drive(socket, cmd_rx));
        Ok(Self { cmd_tx })
    }

    /// Open a subscription to a route (`/api/<collection>[/<docId>]`)
    ///
    /// Returns the subscription id and the event receiver. Only events
    /// published after the server processes the SUB are delivered.
    pub fn subscribe(
        &self,
        route: impl Into<String>,
    ) -> (String, mpsc::UnboundedReceiver<ChangeEvent>) {
        let id = uuid::Uuid::new_v4().to_string();
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = self.cmd_tx.send(Command::Subscribe {
            id: id.clone(),
            route: route.into(),
            tx,
        });
        (id, rx)
    }

    /// Close a subscription; it receives no further events
    pub fn unsubscribe(&self, id: &str) {
        let _ = self.cmd_tx.send(Command::Unsubscribe { id: id.to_string() });
    }
}

/// The driver task: owns the socket until every handle is gone
async fn drive(socket: Socket, mut cmd_rx: mpsc::UnboundedReceiver<Command>) {
    let (mut sink, mut stream) = socket.split();
    let mut routes: HashMap<String, mpsc::UnboundedSender<ChangeEvent>> = HashMap::new();

    loop {
        tokio::select! {
            command = cmd_rx.recv() => {
                match command {
                    Some(Command::Subscribe { id, route, tx }) => {
                        routes.insert(id.clone(), tx);
                        let request = SocketRequest::Subscribe { id, route };
                        if !send_request(&mut sink, &request).await {
                            break;
                        }
                    }
                    Some(Command::Unsubscribe { id }) => {
                        routes.remove(&id);
                        let request = SocketRequest::Unsubscribe { id };
                        if !send_request(&mut sink, &request).await {
                            break;
                        }
                    }
                    None => {
                        // Every client handle dropped
                        let _ = sink.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        let reply = match serde_json::from_str::<SocketReply>(&text) {
                            Ok(reply) => reply,
                            Err(e) => {
                                tracing::debug!("[Socket] malformed reply: {}", e);
                                continue;
                            }
                        };
                        let gone = match routes.get(&reply.id) {
                            Some(tx) => tx.send(reply.event).is_err(),
                            None => false,
                        };
                        if gone {
                            // Receiver dropped: tidy up server-side too
                            let id = reply.id;
                            routes.remove(&id);
                            let request = SocketRequest::Unsubscribe { id };
                            if !send_request(&mut sink, &request).await {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!("[Socket] receive error: {}", e);
                        break;
                    }
                }
            }
        }
    }
    tracing::debug!("[Socket] driver stopped, {} subscriptions dropped", routes.len());
}

async fn send_request(
    sink: &mut (impl Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin),
    request: &SocketRequest,
) -> bool {
    let text = match serde_json::to_string(request) {
        Ok(text) => text,
        Err(e) => {
            tracing::error!("[Socket] serialize failed: {}", e);
            return true;
        }
    };
    match sink.send(Message::Text(text)).await {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!("[Socket] send failed: {}", e);
            false
        }
    }
}
