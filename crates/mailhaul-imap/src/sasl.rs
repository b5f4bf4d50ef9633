//! SASL initial responses for AUTHENTICATE.
//!
//! Both supported mechanisms are single-shot: the server answers the bare
//! `AUTHENTICATE <mech>` with a continuation, the client sends one base64
//! blob, done.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// PLAIN initial response (RFC 4616).
///
/// Format: base64 of `\0<username>\0<password>`. The leading NUL is the
/// empty authorization identity (same as the authentication identity).
#[must_use]
pub fn plain_initial_response(username: &str, password: &str) -> String {
    let auth_string = format!("\0{username}\0{password}");
    STANDARD.encode(auth_string.as_bytes())
}

/// XOAUTH2 initial response (Google/Microsoft proprietary).
///
/// Format: base64 of `user=<user>\x01auth=Bearer <token>\x01\x01`.
#[must_use]
pub fn xoauth2_initial_response(user: &str, access_token: &str) -> String {
    let auth_string = format!("user={user}\x01auth=Bearer {access_token}\x01\x01");
    STANDARD.encode(auth_string.as_bytes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;

    #[test]
    fn plain_is_nul_separated() {
        let encoded = plain_initial_response("user@example.com", "hunter2");
        let raw = STANDARD.decode(encoded).unwrap();
        assert_eq!(raw, b"\0user@example.com\0hunter2");
    }

    #[test]
    fn xoauth2_carries_bearer_token() {
        let encoded = xoauth2_initial_response("user@example.com", "ya29.token123");
        let raw = STANDARD.decode(encoded).unwrap();
        assert_eq!(
            raw,
            b"user=user@example.com\x01auth=Bearer ya29.token123\x01\x01"
        );
    }
}
