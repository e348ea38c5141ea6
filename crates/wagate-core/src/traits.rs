use crate::{auth::AuthState, error::GatewayError, event::SessionEvent};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

/// A WhatsApp client capable of opening sessions.
///
/// Every backend (the real `whatsapp-rust` bot, test doubles) implements
/// this trait so the session manager never touches the protocol library.
#[async_trait]
pub trait SessionBackend: Send + Sync {
    /// Human-readable backend name.
    fn name(&self) -> &str;

    /// Open a new connection using the given auth state.
    ///
    /// Lifecycle events for this connection are pushed into `events` until
    /// the returned handle is logged out or dropped.
    async fn connect(
        &self,
        auth: &AuthState,
        events: mpsc::Sender<SessionEvent>,
    ) -> Result<Arc<dyn SessionHandle>, GatewayError>;
}

/// A live connection returned by [`SessionBackend::connect`].
#[async_trait]
pub trait SessionHandle: Send + Sync {
    /// Send a text message to a full JID. Returns the message ID.
    async fn send_text(&self, jid: &str, text: &str) -> Result<String, GatewayError>;

    /// Log out and close the connection.
    async fn logout(&self) -> Result<(), GatewayError>;

    /// Drop the connection but keep the device paired. Called on a handle
    /// that has been replaced by a newer connection.
    async fn close(&self);
}
