use actix_web::web::Bytes;
use actix_web::{HttpRequest, HttpResponse, web};
use actix_ws::{Message, ProtocolError};
use futures_util::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::verifier::TokenVerifier;
use crate::socket::hub::SocketHub;
use crate::socket::protocol::ServerEvent;

/// Query params for the WebSocket handshake endpoint.
#[derive(Debug, serde::Deserialize)]
pub struct WsQuery {
    pub token: String,
}

/// GET /api/socket?token=<jwt>
///
/// Upgrades the HTTP connection to a WebSocket and registers it with the hub
/// so the user receives order notifications.
/// Authenticates via query param token (browsers can't send Authorization headers
/// during the WebSocket handshake).
pub async fn ws_connect(
    req: HttpRequest,
    stream: web::Payload,
    query: web::Query<WsQuery>,
    verifier: web::Data<Arc<TokenVerifier>>,
    hub: web::Data<Arc<SocketHub>>,
) -> Result<HttpResponse, actix_web::Error> {
    let user = verifier
        .authenticate(&query.token)
        .await
        .map_err(|e| actix_web::error::ErrorUnauthorized(format!("Invalid token: {e}")))?;

    let (response, session, msg_stream) = actix_ws::handle(&req, stream)?;

    let (session_id, rx) = hub.join(&user.id).await;

    actix_web::rt::spawn(handle_ws_session(
        session,
        msg_stream,
        rx,
        user.id,
        session_id,
        hub.get_ref().clone(),
    ));

    Ok(response)
}

/// What the session loop does with one item from the client stream.
#[derive(Debug, PartialEq)]
enum Inbound {
    Pong(Bytes),
    Ignore,
    Close,
}

/// An ended stream (`None`) closes the session just like a Close frame, so a
/// client that drops the connection is still unregistered.
fn classify(msg: Option<Result<Message, ProtocolError>>) -> Inbound {
    match msg {
        Some(Ok(Message::Ping(bytes))) => Inbound::Pong(bytes),
        Some(Ok(Message::Close(_))) | Some(Err(_)) | None => Inbound::Close,
        Some(Ok(_)) => Inbound::Ignore,
    }
}

/// Forwards hub events to the client until either side closes, then
/// unregisters the session.
async fn handle_ws_session(
    mut session: actix_ws::Session,
    mut msg_stream: actix_ws::MessageStream,
    mut rx: mpsc::UnboundedReceiver<ServerEvent>,
    user_id: String,
    session_id: Uuid,
    hub: Arc<SocketHub>,
) {
    loop {
        tokio::select! {
            msg = msg_stream.next() => {
                match classify(msg) {
                    Inbound::Pong(bytes) => {
                        if session.pong(&bytes).await.is_err() {
                            break;
                        }
                    }
                    Inbound::Ignore => {}
                    Inbound::Close => {
                        debug!(%user_id, %session_id, "Socket client disconnected");
                        break;
                    }
                }
            }
            event = rx.recv() => {
                let Some(event) = event else { break };
                let json = match serde_json::to_string(&event) {
                    Ok(j) => j,
                    Err(e) => {
                        warn!(error = %e, "Failed to serialize socket event");
                        continue;
                    }
                };
                if session.text(json).await.is_err() {
                    break;
                }
            }
        }
    }

    hub.leave(&user_id, session_id).await;
    let _ = session.close(None).await;
}
