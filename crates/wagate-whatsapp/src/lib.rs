//! # wagate-whatsapp
//!
//! WhatsApp session lifecycle for wagate: the session manager, QR
//! rendering, and the `whatsapp-rust` backend.

pub mod bot;
pub mod qr;
pub mod session;

pub use bot::WhatsAppBackend;
pub use session::{ConnectionState, QrStatus, SessionManager, SessionStatus};
