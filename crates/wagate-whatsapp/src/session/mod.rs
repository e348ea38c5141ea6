//! Session manager: owns the single connection to WhatsApp.
//!
//! Holds the session handle, the pending QR challenge, and the reconnect
//! flag behind one lock. Backends push [`SessionEvent`]s into a channel;
//! a pump task per connection feeds them to the lifecycle handlers.
//! Every connection gets a generation number so events from a detached or
//! superseded connection are dropped.

mod lifecycle;


use std::path::Path;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info};
use wagate_core::{
    auth::AuthState,
    config::WhatsAppConfig,
    error::GatewayError,
    event::{AccountIdentity, SessionEvent},
    jid::normalize_recipient,
    traits::{SessionBackend, SessionHandle},
};

const EVENT_BUFFER: usize = 32;

/// Connection phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    AwaitingScan,
    Connected,
    LoggingOut,
}

/// Snapshot for `GET /api/status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    pub connected: bool,
    pub phone_number: Option<String>,
    pub name: Option<String>,
}

/// What `GET /api/qr` should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QrStatus {
    /// A QR challenge is waiting to be scanned.
    Pending(String),
    /// No QR needed, the session is live.
    Connected,
    /// Nothing to show yet.
    NotReady,
}

pub(crate) struct SessionState {
    pub(crate) phase: ConnectionState,
    pub(crate) handle: Option<Arc<dyn SessionHandle>>,
    pub(crate) qr: Option<String>,
    pub(crate) identity: Option<AccountIdentity>,
    pub(crate) reconnect_enabled: bool,
    pub(crate) generation: u64,
    pump: Option<JoinHandle<()>>,
}

impl SessionState {
    fn new() -> Self {
        Self {
            phase: ConnectionState::Disconnected,
            handle: None,
            qr: None,
            identity: None,
            reconnect_enabled: true,
            generation: 0,
            pump: None,
        }
    }

    /// Stop listening to the current connection's events and hand back its
    /// handle so the caller can close it outside the lock.
    fn detach(&mut self) -> Option<Arc<dyn SessionHandle>> {
        self.generation += 1;
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
        self.handle.take()
    }

    fn is_live(&self) -> bool {
        self.phase == ConnectionState::Connected && self.handle.is_some()
    }
}

struct Inner {
    backend: Arc<dyn SessionBackend>,
    config: WhatsAppConfig,
    state: Mutex<SessionState>,
}

/// Shared context for the connection lifecycle and the HTTP handlers.
///
/// Cloning is cheap; all clones share the same state.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl SessionManager {
    pub fn new(backend: Arc<dyn SessionBackend>, config: WhatsAppConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                backend,
                config,
                state: Mutex::new(SessionState::new()),
            }),
        }
    }

    pub fn auth_dir(&self) -> &Path {
        Path::new(&self.inner.config.auth_dir)
    }

    /// Open a connection with the persisted auth state.
    ///
    /// Any previous connection is detached and replaced. Success only means
    /// the backend accepted the attempt; pairing and login progress arrive
    /// later as events.
    pub async fn connect(&self) -> Result<(), GatewayError> {
        self.inner.state.lock().await.phase = ConnectionState::Connecting;

        let auth = match AuthState::load_or_create(self.auth_dir()) {
            Ok(auth) => auth,
            Err(e) => {
                self.inner.state.lock().await.phase = ConnectionState::Disconnected;
                return Err(e);
            }
        };
        if auth.is_registered() {
            info!("restoring saved session from {}", auth.dir().display());
        } else {
            info!("no saved session, starting a new pairing cycle");
        }

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let handle = match self.inner.backend.connect(&auth, tx).await {
            Ok(handle) => handle,
            Err(e) => {
                error!("{} connect failed: {e}", self.inner.backend.name());
                self.inner.state.lock().await.phase = ConnectionState::Disconnected;
                return Err(e);
            }
        };

        let superseded = {
            let mut state = self.inner.state.lock().await;
            let superseded = state.detach();
            let generation = state.generation;
            state.handle = Some(handle);
            state.identity = None;
            state.pump = Some(tokio::spawn(self.clone().pump(generation, auth, rx)));
            info!(
                "{} connection opened (session {generation})",
                self.inner.backend.name()
            );
            superseded
        };

        if let Some(old) = superseded {
            old.close().await;
        }
        Ok(())
    }

    async fn pump(self, generation: u64, auth: AuthState, mut rx: mpsc::Receiver<SessionEvent>) {
        while let Some(event) = rx.recv().await {
            self.handle_event(generation, &auth, event).await;
        }
        tracing::debug!("session {generation} event stream ended");
    }

    /// Send a text message to a phone number or JID.
    ///
    /// Fails with [`GatewayError::NotConnected`] unless the session is live.
    /// Backend errors are returned unchanged.
    pub async fn send_message(&self, phone: &str, text: &str) -> Result<String, GatewayError> {
        let handle = {
            let state = self.inner.state.lock().await;
            match state.handle.as_ref() {
                Some(handle) if state.is_live() => handle.clone(),
                _ => return Err(GatewayError::NotConnected),
            }
        };

        let jid = normalize_recipient(phone);
        let msg_id = handle.send_text(&jid, text).await?;
        info!("sent message {msg_id} to {jid}");
        Ok(msg_id)
    }

    pub async fn status(&self) -> SessionStatus {
        let state = self.inner.state.lock().await;
        if !state.is_live() {
            return SessionStatus {
                connected: false,
                phone_number: None,
                name: None,
            };
        }
        let identity = state.identity.clone().unwrap_or_default();
        SessionStatus {
            connected: true,
            phone_number: Some(identity.id).filter(|id| !id.is_empty()),
            name: identity.name,
        }
    }

    pub async fn qr_status(&self) -> QrStatus {
        let state = self.inner.state.lock().await;
        if let Some(ref qr) = state.qr {
            QrStatus::Pending(qr.clone())
        } else if state.is_live() {
            QrStatus::Connected
        } else {
            QrStatus::NotReady
        }
    }

    pub async fn state(&self) -> ConnectionState {
        self.inner.state.lock().await.phase
    }

    pub async fn reconnect_enabled(&self) -> bool {
        self.inner.state.lock().await.reconnect_enabled
    }
}
