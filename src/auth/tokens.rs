use chrono::{DateTime, Duration, FixedOffset, Utc};
use rand::{RngCore, rngs::OsRng};
use sha2::{Digest, Sha256};

const REFRESH_TOKEN_BYTES: usize = 32;

/// 256 bits from the OS CSPRNG, hex encoded.
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    bytes_to_hex(&bytes)
}

pub fn hash_refresh_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    bytes_to_hex(&hasher.finalize())
}

pub fn refresh_token_expiry(ttl_days: i64) -> DateTime<FixedOffset> {
    (Utc::now() + Duration::days(ttl_days)).fixed_offset()
}

fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{:02x}", b));
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::{generate_refresh_token, hash_refresh_token, refresh_token_expiry};

    #[test]
    fn refresh_tokens_are_random_hex() {
        let first = generate_refresh_token();
        let second = generate_refresh_token();

        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(first, second);
    }

    #[test]
    fn hash_is_deterministic_sha256() {
        assert_eq!(
            hash_refresh_token("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(hash_refresh_token("abc"), hash_refresh_token("abc"));
        assert_ne!(hash_refresh_token("abc"), hash_refresh_token("abd"));
    }

    #[test]
    fn expiry_is_days_from_now() {
        let expires = refresh_token_expiry(7);
        let expected = Utc::now() + Duration::days(7);
        let drift = (expected - expires.with_timezone(&Utc)).num_seconds().abs();
        assert!(drift <= 2);
    }
}
