//! Checksum functions (§6): Blake2b, 4-byte digest, UTF-8 input, hex output,
//! inputs concatenated without a separator. A 2^32 collision space is
//! accepted for the retry-window scope this system operates in (§9).

use blake2::digest::consts::U4;
use blake2::{Blake2b, Digest};

type Blake2b32 = Blake2b<U4>;

fn digest_hex(parts: &[&str]) -> String {
    let mut hasher = Blake2b32::new();
    for part in parts {
        hasher.update(part.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// `call_chk_sum = H(phone || message)` — the cycle's deduplication key.
pub fn call_checksum(phone: &str, message: &str) -> String {
    digest_hex(&[phone, message])
}

/// `msg_chk_sum = H(message)` — the stable name of the audio artifact.
pub fn message_checksum(message: &str) -> String {
    digest_hex(&[message])
}

/// `unique_chk_sum = H(phone || message || first_dial)` — identity of one
/// particular attempt-sequence. `first_dial` is formatted the same way on
/// every call site (RFC 3339) so the checksum is reproducible.
pub fn unique_checksum(phone: &str, message: &str, first_dial: chrono::DateTime<chrono::Utc>) -> String {
    digest_hex(&[phone, message, &first_dial.to_rfc3339()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn message_checksum_is_deterministic() {
        assert_eq!(message_checksum("fire"), message_checksum("fire"));
    }

    #[test]
    fn message_checksum_is_four_bytes_hex() {
        let h = message_checksum("fire");
        assert_eq!(h.len(), 8);
        assert!(hex::decode(&h).is_ok());
    }

    #[test]
    fn call_checksum_distinguishes_phone_and_message() {
        assert_ne!(call_checksum("+15550001", "fire"), call_checksum("+15550002", "fire"));
        assert_ne!(call_checksum("+15550001", "fire"), call_checksum("+15550001", "flood"));
    }

    #[test]
    fn call_checksum_does_not_confuse_concatenation_boundaries() {
        // "ab"+"c" and "a"+"bc" would collide under a naive separator-free
        // concatenation if inputs were ambiguous; checksums over (phone,
        // message) pairs still need to differ whenever the pair differs.
        assert_ne!(call_checksum("ab", "c"), call_checksum("a", "bc"));
    }

    #[test]
    fn unique_checksum_varies_with_first_dial() {
        let t1 = chrono::Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let t2 = chrono::Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 1).unwrap();
        assert_ne!(unique_checksum("+15550001", "fire", t1), unique_checksum("+15550001", "fire", t2));
    }
}
