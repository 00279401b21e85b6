//! Key derivation for HNAP sessions
//!
//! Every secret in the protocol is an HMAC-MD5 digest rendered as uppercase hex:
//!
//! 1. `private_key    = HMAC(public_key + password, challenge)`
//! 2. `login_password = HMAC(private_key, challenge)`
//! 3. `HNAP_AUTH      = HMAC(private_key, millis + action_uri) + " " + millis`

use crate::error::{HnapError, Result};
use crate::message::action_uri;
use hmac::{Hmac, Mac};
use md5::Md5;

type HmacMd5 = Hmac<Md5>;

/// Length of a digest in hex characters
pub const DIGEST_HEX_LEN: usize = 32;

/// Keyed digest of `message` under `key`, as uppercase hex
pub fn digest(key: &str, message: &str) -> Result<String> {
    let mut mac =
        HmacMd5::new_from_slice(key.as_bytes()).map_err(|e| HnapError::KeyDerivation(e.to_string()))?;
    mac.update(message.as_bytes());
    Ok(hex::encode_upper(mac.finalize().into_bytes()))
}

/// Derive the session private key from the login challenge
pub fn derive_private_key(public_key: &str, challenge: &str, clear_password: &str) -> Result<String> {
    digest(&format!("{public_key}{clear_password}"), challenge)
}

/// Derive the password sent in the login confirmation
pub fn derive_hashed_password(private_key: &str, challenge: &str) -> Result<String> {
    digest(private_key, challenge)
}

/// Build the `HNAP_AUTH` header value for `action` at the current time
pub fn derive_request_auth(private_key: &str, action: &str) -> Result<String> {
    derive_request_auth_at(private_key, action, chrono::Utc::now().timestamp_millis())
}

/// Build the `HNAP_AUTH` header value for `action` at `epoch_millis`
pub fn derive_request_auth_at(private_key: &str, action: &str, epoch_millis: i64) -> Result<String> {
    let message = format!("{epoch_millis}{}", action_uri(action));
    let auth = digest(private_key, &message)?;
    Ok(format!("{auth} {epoch_millis}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_upper_hex(s: &str) -> bool {
        s.chars().all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
    }

    #[test]
    fn test_digest_rfc2104_vector() {
        let d = digest("Jefe", "what do ya want for nothing?").unwrap();
        assert_eq!(d, "750C783E6AB0B503EAA86E310A5DB738");
    }

    #[test]
    fn test_private_key_is_deterministic_upper_hex() {
        let a = derive_private_key("PUBKEY123", "CHALLENGE456", "hunter2").unwrap();
        let b = derive_private_key("PUBKEY123", "CHALLENGE456", "hunter2").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), DIGEST_HEX_LEN);
        assert!(is_upper_hex(&a), "not uppercase hex: {a}");

        // Password is appended to the public key, not to the challenge
        assert_eq!(a, digest("PUBKEY123hunter2", "CHALLENGE456").unwrap());
        assert_ne!(a, derive_private_key("PUBKEY123", "CHALLENGE456", "hunter3").unwrap());
    }

    #[test]
    fn test_hashed_password_uses_private_key() {
        let private_key = derive_private_key("pk", "ch", "pw").unwrap();
        let hashed = derive_hashed_password(&private_key, "ch").unwrap();
        assert_eq!(hashed, digest(&private_key, "ch").unwrap());
        assert_eq!(hashed.len(), DIGEST_HEX_LEN);
    }

    #[test]
    fn test_request_auth_format() {
        let auth = derive_request_auth_at("KEY", "GetMultipleHNAPs", 1_700_000_000_123).unwrap();
        let (tag, ts) = auth.split_once(' ').unwrap();
        assert_eq!(ts, "1700000000123");
        assert_eq!(tag.len(), DIGEST_HEX_LEN);
        assert!(is_upper_hex(tag));
        let expected = digest(
            "KEY",
            "1700000000123\"http://purenetworks.com/HNAP1/GetMultipleHNAPs\"",
        )
        .unwrap();
        assert_eq!(tag, expected);
    }

    #[test]
    fn test_request_auth_timestamp_non_decreasing() {
        let first = derive_request_auth("KEY", "Login").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = derive_request_auth("KEY", "Login").unwrap();

        let ts = |s: &str| s.split_once(' ').unwrap().1.parse::<i64>().unwrap();
        assert!(ts(&second) >= ts(&first));
    }
}
