//! Recipient address helpers.
//!
//! WhatsApp addresses users as `<phone>@<server>`. Direct messages go to the
//! default user server; anything already carrying that suffix is left alone.

/// Server suffix for one-to-one chats.
pub const DEFAULT_USER_SERVER: &str = "s.whatsapp.net";

/// Normalize a phone number or address into a direct-message JID string.
///
/// `628111222333` becomes `628111222333@s.whatsapp.net`; an identifier that
/// already contains `@s.whatsapp.net` is returned unchanged.
pub fn normalize_recipient(identifier: &str) -> String {
    let suffix = format!("@{DEFAULT_USER_SERVER}");
    if identifier.contains(&suffix) {
        identifier.to_string()
    } else {
        format!("{identifier}{suffix}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_phone_gets_suffix() {
        assert_eq!(
            normalize_recipient("628111222333"),
            "628111222333@s.whatsapp.net"
        );
    }

    #[test]
    fn test_full_jid_passes_through() {
        assert_eq!(
            normalize_recipient("5511999887766@s.whatsapp.net"),
            "5511999887766@s.whatsapp.net"
        );
    }

    #[test]
    fn test_suffix_appended_exactly_once() {
        for phone in ["1", "15551234567", "+15551234567", "4412345"] {
            let jid = normalize_recipient(phone);
            assert_eq!(jid.matches("@s.whatsapp.net").count(), 1);
            assert!(jid.starts_with(phone));
        }
    }

    #[test]
    fn test_other_servers_still_get_direct_suffix() {
        // Only the direct-message suffix is recognized.
        assert_eq!(
            normalize_recipient("120363001234567890@g.us"),
            "120363001234567890@g.us@s.whatsapp.net"
        );
    }
}
