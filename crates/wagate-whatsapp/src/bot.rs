//! `whatsapp-rust` backend: builds and runs the bot, translates its events.
//!
//! The library owns the protocol: Noise handshake, Signal encryption, key
//! storage. Its SQLite key store lives inside the auth directory, so wiping
//! that directory forgets the device.

use async_trait::async_trait;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};
use wacore::types::events::Event;
use wacore_binary::jid::Jid;
use wagate_core::{
    auth::AuthState,
    error::GatewayError,
    event::{AccountIdentity, Credentials, DisconnectReason, IncomingMessage, SessionEvent},
    traits::{SessionBackend, SessionHandle},
};
use whatsapp_rust::bot::Bot;
use whatsapp_rust::client::Client;
use whatsapp_rust_sqlite_storage::SqliteStore;
use whatsapp_rust_tokio_transport::TokioWebSocketTransportFactory;
use whatsapp_rust_ureq_http_client::UreqHttpClient;

/// Session backend using the WhatsApp Web protocol.
pub struct WhatsAppBackend {
    device_name: String,
}

impl WhatsAppBackend {
    pub fn new(device_name: impl Into<String>) -> Self {
        Self {
            device_name: device_name.into(),
        }
    }
}

#[async_trait]
impl SessionBackend for WhatsAppBackend {
    fn name(&self) -> &str {
        "whatsapp"
    }

    async fn connect(
        &self,
        auth: &AuthState,
        events: mpsc::Sender<SessionEvent>,
    ) -> Result<Arc<dyn SessionHandle>, GatewayError> {
        let db_path = auth.session_db_path();
        let db_path = db_path.to_string_lossy();
        info!("WhatsApp bot building (session: {db_path})...");

        let store = Arc::new(
            SqliteStore::new(&db_path)
                .await
                .map_err(|e| GatewayError::Backend(format!("whatsapp store init failed: {e}")))?,
        );

        let mut bot = Bot::builder()
            .with_backend(store)
            .with_transport_factory(TokioWebSocketTransportFactory::new())
            .with_http_client(UreqHttpClient::new())
            .with_device_props(
                Some(self.device_name.clone()),
                None,
                Some(waproto::whatsapp::device_props::PlatformType::Desktop),
            )
            .on_event(move |event, client| {
                let tx = events.clone();
                async move {
                    for translated in translate_event(event, &client).await {
                        if tx.send(translated).await.is_err() {
                            debug!("session listener detached, dropping WhatsApp events");
                            break;
                        }
                    }
                }
            })
            .build()
            .await
            .map_err(|e| GatewayError::Backend(format!("whatsapp bot build failed: {e}")))?;

        let client = bot.client();
        // Reconnects are driven by the session manager only.
        client.enable_auto_reconnect.store(false, Ordering::Relaxed);

        // Runs in the background until the client disconnects.
        let _handle = bot
            .run()
            .await
            .map_err(|e| GatewayError::Backend(format!("whatsapp bot run failed: {e}")))?;

        info!("WhatsApp bot started");
        Ok(Arc::new(WhatsAppSession { client }))
    }
}

/// A running bot's client.
struct WhatsAppSession {
    client: Arc<Client>,
}

#[async_trait]
impl SessionHandle for WhatsAppSession {
    async fn send_text(&self, jid: &str, text: &str) -> Result<String, GatewayError> {
        let to: Jid = jid
            .parse()
            .map_err(|e| GatewayError::Backend(format!("invalid whatsapp JID '{jid}': {e}")))?;

        let msg = waproto::whatsapp::Message {
            conversation: Some(text.to_string()),
            ..Default::default()
        };

        self.client
            .send_message(to, msg)
            .await
            .map_err(|e| GatewayError::Backend(e.to_string()))
    }

    async fn logout(&self) -> Result<(), GatewayError> {
        self.client.disconnect().await;
        Ok(())
    }

    async fn close(&self) {
        debug!("closing superseded WhatsApp client");
        self.client.disconnect().await;
    }
}

/// Map a library event onto the session events the manager understands.
async fn translate_event(event: Event, client: &Arc<Client>) -> Vec<SessionEvent> {
    match event {
        Event::PairingQrCode { code, .. } => vec![SessionEvent::Qr(code)],
        Event::PairSuccess(_) => {
            info!("WhatsApp pairing successful");
            Vec::new()
        }
        Event::Connected(_) => {
            let identity = AccountIdentity {
                id: client
                    .get_pn()
                    .await
                    .map(|jid| jid.to_string())
                    .unwrap_or_default(),
                name: Some(client.get_push_name().await).filter(|name| !name.is_empty()),
            };
            vec![
                SessionEvent::CredentialsUpdated(Credentials::new(identity.clone())),
                SessionEvent::Open(identity),
            ]
        }
        Event::Disconnected(_) => vec![SessionEvent::Closed(DisconnectReason::ConnectionLost)],
        Event::LoggedOut(_) => vec![SessionEvent::Closed(DisconnectReason::LoggedOut)],
        Event::Message(msg, info) => vec![SessionEvent::Message(IncomingMessage {
            id: info.id.clone(),
            from: info.source.sender.to_string(),
            from_me: info.source.is_from_me,
            push_name: Some(info.push_name.clone()).filter(|name| !name.is_empty()),
            text: message_text(&msg),
        })],
        _ => Vec::new(),
    }
}

/// Text body of a message, looking through device-sent, ephemeral, and
/// view-once wrappers.
fn message_text(msg: &waproto::whatsapp::Message) -> Option<String> {
    let inner = msg
        .device_sent_message
        .as_ref()
        .and_then(|d| d.message.as_deref())
        .or_else(|| {
            msg.ephemeral_message
                .as_ref()
                .and_then(|e| e.message.as_deref())
        })
        .or_else(|| {
            msg.view_once_message
                .as_ref()
                .and_then(|v| v.message.as_deref())
        })
        .unwrap_or(msg);

    inner
        .conversation
        .as_deref()
        .or_else(|| {
            inner
                .extended_text_message
                .as_ref()
                .and_then(|e| e.text.as_deref())
        })
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_text_plain_conversation() {
        let msg = waproto::whatsapp::Message {
            conversation: Some("hi".to_string()),
            ..Default::default()
        };
        assert_eq!(message_text(&msg).as_deref(), Some("hi"));
    }

    #[test]
    fn test_message_text_none_for_media() {
        let msg = waproto::whatsapp::Message::default();
        assert_eq!(message_text(&msg), None);
    }

    #[test]
    fn test_direct_jid_parses() {
        let jid: Jid = "628111222333@s.whatsapp.net".parse().unwrap();
        assert_eq!(jid.user, "628111222333");
    }
}
