use md5::{Digest, Md5};

use crate::error::{HashError, HashResult};

/// Hex-encoded blake3 digest of `data`. Blob rows and blob paths are keyed by it.
pub fn hash_bytes(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}

/// Hex-encoded MD5 digest of `data`, as Conan v1 clients expect in file snapshots.
pub fn md5_bytes(data: &[u8]) -> String {
    format!("{:x}", Md5::digest(data))
}

/// Checks that `data` hashes to `expected`, ignoring case.
///
/// # Errors
///
/// * [`HashError::Mismatch`] if the digests differ.
pub fn verify_bytes(data: &[u8], expected: &str) -> HashResult<()> {
    let actual = hash_bytes(data);
    if actual.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(HashError::Mismatch {
            expected: expected.to_string(),
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_bytes() {
        let digest = hash_bytes(b"[settings]\nos=Linux\n");
        assert_eq!(digest.len(), 64);
        assert_eq!(digest, hash_bytes(b"[settings]\nos=Linux\n"));
        assert_ne!(digest, hash_bytes(b"[settings]\nos=Windows\n"));
    }

    #[test]
    fn test_md5_bytes() {
        assert_eq!(md5_bytes(b""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(md5_bytes(b"abc"), "900150983cd24fb0d6963f7d28e17f72");
    }

    #[test]
    fn test_verify_bytes() {
        let expected = hash_bytes(b"content").to_uppercase();
        assert!(verify_bytes(b"content", &expected).is_ok());
        assert!(matches!(
            verify_bytes(b"tampered", &expected),
            Err(HashError::Mismatch { .. })
        ));
    }
}
