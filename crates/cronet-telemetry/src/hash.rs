//! Stable hashing of negotiated protocol names.

use sha2::{Digest, Sha256};

/// First eight bytes of the SHA-256 digest of `protocol`, big-endian; `0` for an empty name.
#[must_use]
pub fn protocol_hash(protocol: &str) -> i64 {
    if protocol.is_empty() {
        return 0;
    }
    let digest = Sha256::digest(protocol.as_bytes());
    let mut prefix = [0_u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    i64::from_be_bytes(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_protocol_hashes_to_zero() {
        assert_eq!(protocol_hash(""), 0);
    }

    #[test]
    fn hash_is_the_digest_prefix() {
        let expected = i64::from_be_bytes(
            Sha256::digest(b"h2")[..8]
                .try_into()
                .expect("eight bytes"),
        );
        assert_eq!(protocol_hash("h2"), expected);
        assert_ne!(protocol_hash("h2"), protocol_hash("h3"));
        assert_eq!(protocol_hash("quic/1+spdy/3"), protocol_hash("quic/1+spdy/3"));
    }
}
