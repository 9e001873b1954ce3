//! WebSocket Fan-out
//!
//! One persistent socket per client carries every subscription that client
//! holds. The client sends `SUB`/`UNSUB` requests addressed by route; the
//! server multiplexes the matching bus streams back as `{id, event}`
//! replies.
//!
//! Connection lifecycle:
//!
//! - The upgrade requires a valid `?token=…` (401 otherwise).
//! - Each `SUB` is checked against the authorization gate before any event
//!   flows.
//! - Dropping the connection destroys all of its subscriptions; a destroyed
//!   subscription never receives another message.
//! - A slow client that lags a bus buffer skips the overwritten events
//!   (logged) rather than stalling publishers.

use std::pin::Pin;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use futures_util::future;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamMap};

use crate::backend::auth::token::verify_token;
use crate::backend::auth::{Action, Actor};
use crate::backend::error::ApiError;
use crate::backend::server::state::AppState;
use crate::shared::event::{ChangeEvent, SocketReply, SocketRequest, SubscribeTarget};

type EventStream = Pin<Box<dyn Stream<Item = ChangeEvent> + Send>>;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    token: Option<String>,
}

/// `GET /api/ws?token=...`: upgrade to the subscription socket
pub async fn ws_handler(
    State(app): State<AppState>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    let Some(token) = query.token else {
        return ApiError::Unauthorized.into_response();
    };
    let claims = match verify_token(&token, &app.config.auth_secret) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!("[Ws] rejected upgrade: {}", e);
            return ApiError::Unauthorized.into_response();
        }
    };

    let actor = Actor::user(claims.sub);
    ws.on_upgrade(move |socket| handle_socket(socket, app, actor))
}

/// Build the filtered event stream for one subscription
fn subscription_stream(app: &AppState, target: &SubscribeTarget) -> EventStream {
    let rx = app.bus.subscribe_raw(target.collection);
    let doc_id = target.doc_id.clone();
    let stream = BroadcastStream::new(rx).filter_map(move |result| {
        future::ready(match result {
            Ok(event) => match &doc_id {
                Some(doc_id) if !event.touches(doc_id) => None,
                _ => Some(event),
            },
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                tracing::warn!("[Ws] subscription lagged, skipped {} events", skipped);
                None
            }
        })
    });
    Box::pin(stream)
}

async fn handle_socket(socket: WebSocket, app: AppState, actor: Actor) {
    tracing::info!("[Ws] connection opened for '{}'", actor.id);
    let (mut sender, mut receiver) = socket.split();
    let mut subs: StreamMap<String, EventStream> = StreamMap::new();

    loop {
        tokio::select! {
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        let request = match serde_json::from_str::<SocketRequest>(text.as_str()) {
                            Ok(request) => request,
                            Err(e) => {
                                tracing::debug!("[Ws] malformed request: {}", e);
                                continue;
                            }
                        };
                        match request {
                            SocketRequest::Subscribe { id, route } => {
                                let Some(target) = SubscribeTarget::parse(&route) else {
                                    tracing::debug!("[Ws] bad route '{}'", route);
                                    continue;
                                };
                                let allowed = app
                                    .auth
                                    .check(
                                        &actor,
                                        Action::Sub,
                                        target.collection,
                                        None,
                                        target.doc_id.as_deref(),
                                    )
                                    .await
                                    .unwrap_or(false);
                                if !allowed {
                                    tracing::warn!(
                                        "[Ws] '{}' denied subscription to {}", actor.id, route
                                    );
                                    continue;
                                }
                                subs.insert(id, subscription_stream(&app, &target));
                            }
                            SocketRequest::Unsubscribe { id } => {
                                subs.remove(&id);
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {} // ping/pong handled by the transport
                    Some(Err(e)) => {
                        tracing::debug!("[Ws] receive error: {}", e);
                        break;
                    }
                }
            }
            delivery = subs.next(), if !subs.is_empty() => {
                let Some((id, event)) = delivery else { continue };
                let reply = SocketReply { id, event };
                let text = match serde_json::to_string(&reply) {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::error!("[Ws] serialize failed: {}", e);
                        continue;
                    }
                };
                if sender.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
        }
    }

    tracing::info!("[Ws] connection closed for '{}', {} subscriptions dropped", actor.id, subs.len());
}
