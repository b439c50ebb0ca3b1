//! WebSocket connection state machine.
//!
//! Handles the read/write loop for a single WebSocket connection,
//! dispatching incoming commands and forwarding filtered events.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::messages::{SelectorSet, WsCommand, WsMessage, WsMessageType};
use super::subscription::SubscriptionManager;
use crate::api::dto::PoolDetailResponse;
use crate::domain::{PoolEvent, PoolId};
use crate::service::PoolService;

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads commands from the client and dispatches them.
/// - Forwards matching events from the [`broadcast::Receiver`] to the client.
pub async fn run_connection(
    socket: WebSocket,
    mut event_rx: broadcast::Receiver<PoolEvent>,
    pool_service: Arc<PoolService>,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut subs = SubscriptionManager::new();

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let reply = handle_text_message(&text, &mut subs, &pool_service).await;
                        if ws_tx.send(Message::text(reply.to_json())).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
            event = event_rx.recv() => {
                match event {
                    Ok(pool_event) => {
                        if subs.matches(pool_event.pool_id()) {
                            let json = WsMessage::event(&pool_event).to_json();
                            if ws_tx.send(Message::text(json)).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "ws client lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::debug!("ws connection closed");
}

/// Handles a text message from the client and returns the reply envelope.
pub async fn handle_text_message(
    text: &str,
    subs: &mut SubscriptionManager,
    pool_service: &PoolService,
) -> WsMessage {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        return WsMessage::error(String::new(), 400, "malformed JSON");
    };
    if msg.msg_type != WsMessageType::Command {
        return WsMessage::error(msg.id, 400, "expected a command message");
    }
    let command = match serde_json::from_value::<WsCommand>(msg.payload) {
        Ok(command) => command,
        Err(e) => return WsMessage::error(msg.id, 404, &format!("unknown command: {e}")),
    };

    match command {
        WsCommand::Subscribe { pool_ids } => match SelectorSet::parse(&pool_ids) {
            Ok(selection) => {
                subs.subscribe(&selection);
                WsMessage::response(
                    msg.id,
                    serde_json::json!({
                        "subscribed": selection.ids,
                        "count": subs.count(),
                        "wildcard": subs.is_subscribed_all(),
                    }),
                )
            }
            Err(bad) => WsMessage::error(msg.id, 400, &format!("invalid pool id: {bad}")),
        },
        WsCommand::Unsubscribe { pool_ids } => match SelectorSet::parse(&pool_ids) {
            Ok(selection) => {
                subs.unsubscribe(&selection);
                WsMessage::response(
                    msg.id,
                    serde_json::json!({
                        "unsubscribed": selection.ids,
                        "remaining_count": subs.count(),
                        "wildcard": subs.is_subscribed_all(),
                    }),
                )
            }
            Err(bad) => WsMessage::error(msg.id, 400, &format!("invalid pool id: {bad}")),
        },
        WsCommand::GetPool { pool_id } => {
            let pool_id = PoolId::new(pool_id);
            match pool_service.get_pool(pool_id).await {
                Ok(pool) => WsMessage::response(
                    msg.id,
                    serde_json::to_value(PoolDetailResponse::from_pool(pool_id, &pool))
                        .unwrap_or_default(),
                ),
                Err(e) => WsMessage::error(msg.id, e.error_code(), &e.to_string()),
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{EventBus, NewPool, PoolRegistry, Principal, RegistrySettings};
    use crate::service::ChainClock;

    fn service() -> PoolService {
        let registry =
            PoolRegistry::in_memory(RegistrySettings::default(), vec![Principal::new("ST1TEST")]);
        PoolService::new(registry, ChainClock::new(0), EventBus::new(16))
    }

    fn command(id: &str, payload: serde_json::Value) -> String {
        serde_json::json!({
            "id": id,
            "type": "command",
            "timestamp": "2024-01-01T00:00:00Z",
            "payload": payload,
        })
        .to_string()
    }

    #[tokio::test]
    async fn malformed_json_is_rejected() {
        let mut subs = SubscriptionManager::new();
        let reply = handle_text_message("{nope", &mut subs, &service()).await;
        assert_eq!(reply.msg_type, WsMessageType::Error);
        assert_eq!(reply.payload["code"], 400);
    }

    #[tokio::test]
    async fn subscribe_then_unsubscribe() {
        let svc = service();
        let mut subs = SubscriptionManager::new();
        let text = command(
            "s1",
            serde_json::json!({ "command": "subscribe", "pool_ids": [0, "*"] }),
        );
        let reply = handle_text_message(&text, &mut subs, &svc).await;
        assert_eq!(reply.msg_type, WsMessageType::Response);
        assert_eq!(reply.id, "s1");
        assert_eq!(reply.payload["wildcard"], true);
        assert!(subs.matches(None));

        let text = command(
            "u1",
            serde_json::json!({ "command": "unsubscribe", "pool_ids": ["*"] }),
        );
        let reply = handle_text_message(&text, &mut subs, &svc).await;
        assert_eq!(reply.payload["remaining_count"], 1);
        assert!(!subs.matches(None));
        assert!(subs.matches(Some(PoolId::new(0))));
    }

    #[tokio::test]
    async fn unknown_command_is_404() {
        let mut subs = SubscriptionManager::new();
        let text = command("x", serde_json::json!({ "command": "swap" }));
        let reply = handle_text_message(&text, &mut subs, &service()).await;
        assert_eq!(reply.msg_type, WsMessageType::Error);
        assert_eq!(reply.payload["code"], 404);
    }

    #[tokio::test]
    async fn get_pool_returns_state_or_registry_error() {
        let svc = service();
        let mut subs = SubscriptionManager::new();
        let text = command("g", serde_json::json!({ "command": "get_pool", "pool_id": 0 }));
        let reply = handle_text_message(&text, &mut subs, &svc).await;
        assert_eq!(reply.payload["code"], 107);

        let Ok(()) = svc
            .set_governance_address(Principal::new("ST2GOV"))
            .await
        else {
            panic!("governance should be set");
        };
        let args = NewPool {
            name: "AlphaPool".into(),
            min_deposit: 100,
            max_deposit: 10_000,
            yield_rate: 10,
            duration: 30,
            penalty: 5,
            threshold: 50,
            pool_type: "staking".into(),
            interest_rate: 5,
            lock_period: 10,
            currency: "STX".into(),
            defi_protocol: "alex".into(),
        };
        let Ok(_) = svc.create_pool(&Principal::new("ST1TEST"), &args).await else {
            panic!("pool should be created");
        };
        let reply = handle_text_message(&text, &mut subs, &svc).await;
        assert_eq!(reply.msg_type, WsMessageType::Response);
        assert_eq!(reply.payload["name"], "AlphaPool");
        assert_eq!(reply.payload["pool_type"], "staking");
    }
}
