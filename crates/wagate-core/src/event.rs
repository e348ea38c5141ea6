//! Events pushed by a session backend into the session manager.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity of the paired account, readable once the connection is open.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountIdentity {
    /// Account JID (e.g. `5511999887766:3@s.whatsapp.net`).
    pub id: String,
    /// Push name of the account, if set.
    pub name: Option<String>,
}

/// Credential material the backend asks us to persist.
///
/// The protocol keys themselves live in the library's own store inside the
/// auth directory; this record tracks which account they belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub identity: AccountIdentity,
    pub updated_at: DateTime<Utc>,
}

impl Credentials {
    pub fn new(identity: AccountIdentity) -> Self {
        Self {
            identity,
            updated_at: Utc::now(),
        }
    }
}

/// Why a connection closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The account unlinked this device. Permanent: never reconnect.
    LoggedOut,
    /// Socket dropped or the server closed the stream.
    ConnectionLost,
}

impl DisconnectReason {
    /// Whether the close is an explicit, permanent logout.
    pub fn is_logged_out(&self) -> bool {
        matches!(self, Self::LoggedOut)
    }
}

/// A message received on the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub id: String,
    /// Sender JID.
    pub from: String,
    pub from_me: bool,
    pub push_name: Option<String>,
    /// Text body, if the message carried one.
    pub text: Option<String>,
}

/// Lifecycle and traffic events from a session backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A new pairing QR challenge.
    Qr(String),
    /// The connection is open and the account is logged in.
    Open(AccountIdentity),
    /// The connection closed.
    Closed(DisconnectReason),
    /// Credentials rotated and must be persisted.
    CredentialsUpdated(Credentials),
    /// An inbound message.
    Message(IncomingMessage),
}
