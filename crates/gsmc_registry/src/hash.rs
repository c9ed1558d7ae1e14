use sha2::{Digest, Sha512};
use thiserror::Error;

/// Length of a hex-encoded SHA-512 digest.
const SHA512_HEX_LEN: usize = 128;

#[derive(Debug, Error)]
pub enum HashError {
    #[error("Hash mismatch: expected {expected}, actual {actual}")]
    Mismatch { expected: String, actual: String },

    #[error("Invalid hash format: {0}")]
    InvalidFormat(String),
}

pub struct HashVerifier;

impl HashVerifier {
    /// Compute SHA-512 hash of bytes
    pub fn compute(bytes: &[u8]) -> String {
        let mut hasher = Sha512::new();
        hasher.update(bytes);
        hex::encode(hasher.finalize())
    }

    /// Start an incremental hash, for artifacts that are streamed to disk.
    pub fn incremental() -> IncrementalHash {
        IncrementalHash {
            hasher: Sha512::new(),
            len: 0,
        }
    }

    /// Verify hash matches expected value
    pub fn verify(bytes: &[u8], expected: &str) -> Result<(), HashError> {
        Self::verify_hex(&Self::compute(bytes), expected)
    }

    /// Compare an already computed digest against the expected value.
    pub fn verify_hex(actual: &str, expected: &str) -> Result<(), HashError> {
        if expected.len() != SHA512_HEX_LEN || !expected.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(HashError::InvalidFormat(expected.to_string()));
        }

        if actual.eq_ignore_ascii_case(expected) {
            Ok(())
        } else {
            Err(HashError::Mismatch {
                expected: expected.to_string(),
                actual: actual.to_string(),
            })
        }
    }
}

/// SHA-512 state fed chunk by chunk.
pub struct IncrementalHash {
    hasher: Sha512,
    len: u64,
}

impl IncrementalHash {
    pub fn update(&mut self, chunk: &[u8]) {
        self.hasher.update(chunk);
        self.len += chunk.len() as u64;
    }

    /// Number of bytes hashed so far.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn finish(self) -> String {
        hex::encode(self.hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // `printf "hello world" | shasum -a 512`
    const HELLO_WORLD: &str = "309ecc489c12d6eb4cc40f50c902f2b4d0ed77ee511a7c7a9bcd3ca86d4cd86f989dd35bc5ff499670da34255b45b0cfd830e81f605dcf7dc5542e93ae9cd76f";

    #[test]
    fn test_compute() {
        assert_eq!(HashVerifier::compute(b"hello world"), HELLO_WORLD);
    }

    #[test]
    fn test_verify_success() {
        assert!(HashVerifier::verify(b"hello world", HELLO_WORLD).is_ok());
    }

    #[test]
    fn test_verify_case_insensitive() {
        let upper = HELLO_WORLD.to_uppercase();
        assert!(HashVerifier::verify(b"hello world", &upper).is_ok());
    }

    #[test]
    fn test_verify_mismatch() {
        let wrong = format!("0{}", &HELLO_WORLD[1..]);
        match HashVerifier::verify(b"hello world", &wrong) {
            Err(HashError::Mismatch { expected, actual }) => {
                assert_eq!(expected, wrong);
                assert_eq!(actual, HELLO_WORLD);
            }
            _ => panic!("Expected Mismatch error"),
        }
    }

    #[test]
    fn test_verify_rejects_sha256_length() {
        let sha256 = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";
        match HashVerifier::verify(b"hello world", sha256) {
            Err(HashError::InvalidFormat(h)) => assert_eq!(h, sha256),
            _ => panic!("Expected InvalidFormat error"),
        }
    }

    #[test]
    fn test_incremental_matches_one_shot() {
        let mut hash = HashVerifier::incremental();
        hash.update(b"hello ");
        hash.update(b"world");
        assert_eq!(hash.len(), 11);
        assert_eq!(hash.finish(), HELLO_WORLD);
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_compute_returns_valid_hash(bytes in any::<Vec<u8>>()) {
            let hash = HashVerifier::compute(&bytes);

            prop_assert_eq!(hash.len(), SHA512_HEX_LEN);
            prop_assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
            prop_assert!(hash.chars().all(|c| !c.is_ascii_uppercase()));
        }

        #[test]
        fn test_incremental_split_anywhere(bytes in any::<Vec<u8>>(), split in any::<prop::sample::Index>()) {
            let at = if bytes.is_empty() { 0 } else { split.index(bytes.len()) };
            let mut hash = HashVerifier::incremental();
            hash.update(&bytes[..at]);
            hash.update(&bytes[at..]);
            prop_assert_eq!(hash.finish(), HashVerifier::compute(&bytes));
        }
    }
}
