// src/handlers/realtime.rs

// GET /ws?token=<accessToken>
// O navegador não envia cabeçalhos no WebSocket, então o token vem na query
// (o cabeçalho Authorization também é aceito).

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::HeaderMap,
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::{sync::broadcast, time::Duration};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::{bearer_token, AuthenticatedUser},
        policy::Operation,
    },
    services::realtime::{RealtimeEvent, Subscription},
};

const PING_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
pub struct WsAuthQuery {
    token: Option<String>,
}

pub async fn realtime_ws(
    State(app_state): State<AppState>,
    Query(query): Query<WsAuthQuery>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, AppError> {
    let token = query
        .token
        .as_deref()
        .or_else(|| bearer_token(&headers))
        .ok_or(AppError::InvalidToken)?;

    let claims = app_state.auth_service.verify_access_token(token).map_err(|e| {
        tracing::debug!("Token do WebSocket recusado: {}", e);
        AppError::InvalidToken
    })?;
    let user = AuthenticatedUser::from(claims);
    Operation::RealtimeConnect.capability().check(Some(&user))?;

    Ok(ws.on_upgrade(move |socket| session(socket, app_state, user)))
}

async fn session(socket: WebSocket, app_state: AppState, user: AuthenticatedUser) {
    let Subscription { user_id, session_id, mut events, mut admin_events } =
        app_state.realtime.connect(user.id, user.is_admin());
    let (mut sink, mut stream) = socket.split();

    tracing::info!(%user_id, session_id, admin = admin_events.is_some(), "🔌 WebSocket conectado");

    let mut ping_interval = tokio::time::interval(PING_INTERVAL);
    ping_interval.tick().await; // o primeiro tick é imediato

    loop {
        tokio::select! {
            _ = ping_interval.tick() => {
                if sink.send(Message::Ping(Vec::new().into())).await.is_err() {
                    break;
                }
            }

            event = events.recv() => {
                // None: a sessão foi substituída por uma conexão mais nova
                let Some(event) = event else { break };
                if send_event(&mut sink, &event).await.is_err() {
                    break;
                }
            }

            event = recv_admin(&mut admin_events) => {
                match event {
                    Ok(event) => {
                        if send_event(&mut sink, &event).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(%user_id, lagged = n, "Sessão de admin perdeu eventos");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }

            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) if text.as_str().trim() == "ping" => {
                        if sink.send(Message::Text("pong".into())).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    _ => {}
                }
            }
        }
    }

    app_state.realtime.disconnect(user_id, session_id);
    tracing::info!(%user_id, session_id, "WebSocket desconectado");
}

/// Sessões sem grupo de admin nunca recebem deste ramo.
async fn recv_admin(
    rx: &mut Option<broadcast::Receiver<RealtimeEvent>>,
) -> Result<RealtimeEvent, broadcast::error::RecvError> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn send_event(
    sink: &mut futures::stream::SplitSink<WebSocket, Message>,
    event: &RealtimeEvent,
) -> Result<(), axum::Error> {
    let json = match serde_json::to_string(event) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!("Falha ao serializar evento: {}", e);
            return Ok(());
        }
    };
    sink.send(Message::Text(json.into())).await
}
