use rand::RngCore;
use sha3::{Digest, Sha3_256};
use subtle::ConstantTimeEq;

const SCHEME: &str = "sha3-256";
const SALT_LEN: usize = 16;

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02X}", b)).collect()
}

fn salted_digest(salt_hex: &str, pwd: &str) -> String {
    let mut hasher = Sha3_256::default();
    hasher.update(salt_hex.as_bytes());
    hasher.update(pwd.as_bytes());
    to_hex(&hasher.finalize())
}

/// Hashes `pwd` with a fresh random salt.
///
/// Output format: `sha3-256$<salt hex>$<digest hex>`.
pub fn hash_password(pwd: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    let salt_hex = to_hex(&salt);
    let digest = salted_digest(&salt_hex, pwd);
    format!("{SCHEME}${salt_hex}${digest}")
}

pub fn verify_password(pwd: &str, stored: &str) -> bool {
    let mut parts = stored.splitn(3, '$');
    let (Some(scheme), Some(salt_hex), Some(expected)) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    if scheme != SCHEME {
        return false;
    }
    let actual = salted_digest(salt_hex, pwd);
    actual.as_bytes().ct_eq(expected.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let stored = hash_password("hunter22");
        assert!(stored.starts_with("sha3-256$"));
        assert!(verify_password("hunter22", &stored));
        assert!(!verify_password("hunter23", &stored));
    }

    #[test]
    fn same_password_gets_different_salts() {
        assert_ne!(hash_password("secret1"), hash_password("secret1"));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!verify_password("x", ""));
        assert!(!verify_password("x", "md5$aa$bb"));
        assert!(!verify_password("x", "sha3-256$onlysalt"));
    }
}
