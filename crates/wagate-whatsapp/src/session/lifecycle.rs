//! Connection lifecycle events, reconnects, and logout.

use super::{ConnectionState, SessionManager, SessionState};
use crate::qr::generate_qr_terminal;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use wagate_core::{
    auth::AuthState,
    error::GatewayError,
    event::{DisconnectReason, IncomingMessage, SessionEvent},
};

impl SessionManager {
    /// Apply one event from the connection tagged `generation`.
    pub(super) async fn handle_event(&self, generation: u64, auth: &AuthState, event: SessionEvent) {
        let mut state = self.inner.state.lock().await;
        if state.generation != generation {
            debug!("dropping event from detached session {generation}");
            return;
        }

        match event {
            SessionEvent::Qr(code) => self.on_qr(&mut state, code),
            SessionEvent::Open(identity) => {
                info!("WhatsApp connected as {}", identity.id);
                state.qr = None;
                state.phase = ConnectionState::Connected;
                state.identity = Some(identity);
            }
            SessionEvent::Closed(reason) => {
                state.phase = ConnectionState::Disconnected;
                state.identity = None;
                if self.should_reconnect(&state, &reason) {
                    drop(state);
                    self.schedule_reconnect();
                }
            }
            SessionEvent::CredentialsUpdated(creds) => {
                // Saved under the lock so nothing else sees the session
                // before the new credentials are on disk.
                if let Err(e) = auth.save_creds(&creds) {
                    error!("failed to save credentials: {e}");
                }
            }
            SessionEvent::Message(msg) => on_message(&msg),
        }
    }

    fn on_qr(&self, state: &mut SessionState, code: String) {
        if state.phase == ConnectionState::Connected {
            debug!("ignoring QR code while connected");
            return;
        }
        info!("QR code generated, scan from /api/qr endpoint");
        if self.inner.config.print_qr_terminal {
            match generate_qr_terminal(&code) {
                Ok(rendered) => println!("{rendered}"),
                Err(e) => warn!("terminal QR render failed: {e}"),
            }
        }
        state.qr = Some(code);
        state.phase = ConnectionState::AwaitingScan;
    }

    fn should_reconnect(&self, state: &SessionState, reason: &DisconnectReason) -> bool {
        let reconnect = state.reconnect_enabled && !reason.is_logged_out();
        info!("connection closed ({reason:?}), reconnecting: {reconnect}");
        reconnect
    }

    /// Open the first connection in the background. A failed attempt is
    /// retried like a dropped connection.
    pub fn start(&self) {
        self.schedule_connect(Duration::ZERO);
    }

    /// Reconnect after the fixed delay. No backoff, no retry cap.
    fn schedule_reconnect(&self) {
        self.schedule_connect(self.inner.config.reconnect_delay());
    }

    fn schedule_connect(&self, delay: Duration) {
        let manager = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            manager.connect_or_retry().await;
        });
    }

    /// Re-enable reconnects and start a fresh pairing cycle after the
    /// post-logout delay.
    fn schedule_relogin(&self) {
        let manager = self.clone();
        let delay = self.inner.config.relogin_delay();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            manager.inner.state.lock().await.reconnect_enabled = true;
            manager.connect_or_retry().await;
        });
    }

    async fn connect_or_retry(&self) {
        {
            let state = self.inner.state.lock().await;
            if !state.reconnect_enabled {
                debug!("reconnect disabled, skipping connect");
                return;
            }
            if state.is_live() {
                debug!("session already live, skipping reconnect");
                return;
            }
        }

        if let Err(e) = self.connect().await {
            let retry = self.reconnect_enabled().await;
            error!("connect failed: {e}, retrying: {retry}");
            if retry {
                self.schedule_reconnect();
            }
        }
    }

    /// Log out and wipe the auth state, then start a new pairing cycle.
    ///
    /// Safe to call with no session. The reconnect flag stays off until the
    /// auth directory is gone so a close event from the old connection
    /// cannot resurrect it.
    pub async fn logout(&self) -> Result<(), GatewayError> {
        let (handle, previous) = {
            let mut state = self.inner.state.lock().await;
            state.reconnect_enabled = false;
            let previous = state.phase;
            state.phase = ConnectionState::LoggingOut;
            (state.handle.clone(), previous)
        };

        if let Some(handle) = handle {
            if let Err(e) = handle.logout().await {
                error!("WhatsApp logout failed: {e}");
                self.restore_after_failed_logout(previous).await;
                return Err(e);
            }
        }

        {
            let mut state = self.inner.state.lock().await;
            // Already logged out above, nothing left to close.
            let _ = state.detach();
            state.qr = None;
            state.identity = None;
        }

        if let Err(e) = AuthState::remove(self.auth_dir()) {
            error!("failed to delete auth state: {e}");
            self.restore_after_failed_logout(ConnectionState::Disconnected)
                .await;
            return Err(e);
        }

        self.inner.state.lock().await.phase = ConnectionState::Disconnected;
        info!(
            "logged out, new pairing cycle in {}ms",
            self.inner.config.relogin_delay_ms
        );
        self.schedule_relogin();
        Ok(())
    }

    async fn restore_after_failed_logout(&self, phase: ConnectionState) {
        let mut state = self.inner.state.lock().await;
        state.reconnect_enabled = true;
        state.phase = phase;
    }
}

/// Observation-only hook for inbound messages.
fn on_message(msg: &IncomingMessage) {
    if msg.from_me {
        return;
    }
    match msg.text.as_deref() {
        Some(text) => info!("received message from {}: {text}", sender_label(msg)),
        None => debug!(
            "received non-text message {} from {}",
            msg.id,
            sender_label(msg)
        ),
    }
}

/// `Name (jid)` when the sender has a push name, the bare JID otherwise.
pub(super) fn sender_label(msg: &IncomingMessage) -> String {
    match msg.push_name.as_deref() {
        Some(name) => format!("{name} ({})", msg.from),
        None => msg.from.clone(),
    }
}
