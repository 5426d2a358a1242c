//! Content addressing.
//!
//! Assets are addressed by a SHA-256 digest of their filename, not of their
//! contents, so one name always maps to one identifier across runs.

use sha2::{Digest, Sha256};

pub const DEFAULT_PREFIX: &str = "Asset_";
pub const DEFAULT_DIGEST_WIDTH: usize = 12;
pub const MIN_DIGEST_WIDTH: usize = 4;
pub const MAX_DIGEST_WIDTH: usize = 64;

/// The full lowercase hex digest of a filename.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentAddress(String);

impl ContentAddress {
    pub fn of(filename: &str) -> Self {
        Self(format!("{:x}", Sha256::digest(filename.as_bytes())))
    }

    pub fn digest(&self) -> &str {
        &self.0
    }

    /// The first `width` hex digits.
    pub fn short(&self, width: usize) -> &str {
        &self.0[..width.min(self.0.len())]
    }
}

/// Derives generated identifiers: `<prefix><first width hex digits>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Addresser {
    prefix: String,
    width: usize,
}

impl Addresser {
    /// `prefix` must start a valid Go identifier; `width` is clamped to
    /// `4..=64`.
    pub fn new(prefix: impl Into<String>, width: usize) -> Self {
        Self {
            prefix: prefix.into(),
            width: width.clamp(MIN_DIGEST_WIDTH, MAX_DIGEST_WIDTH),
        }
    }

    pub fn address(&self, filename: &str) -> ContentAddress {
        ContentAddress::of(filename)
    }

    pub fn identifier(&self, address: &ContentAddress) -> String {
        format!("{}{}", self.prefix, address.short(self.width))
    }

    pub fn width(&self) -> usize {
        self.width
    }
}

impl Default for Addresser {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX, DEFAULT_DIGEST_WIDTH)
    }
}

/// True when `prefix` followed by hex digits is a Go identifier.
pub fn is_valid_prefix(prefix: &str) -> bool {
    let mut chars = prefix.chars();
    matches!(chars.next(), Some(c) if c == '_' || c.is_alphabetic())
        && chars.all(|c| c == '_' || c.is_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_sha256_of_filename() {
        // sha256("") is well known.
        assert_eq!(
            ContentAddress::of("").digest(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_identifier_is_deterministic() {
        let addresser = Addresser::default();
        let a = addresser.identifier(&addresser.address("templates/index.html"));
        let b = addresser.identifier(&addresser.address("templates/index.html"));
        assert_eq!(a, b);
        assert!(a.starts_with("Asset_"));
        assert_eq!(a.len(), "Asset_".len() + 12);
        assert!(a["Asset_".len()..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_distinct_names_distinct_identifiers() {
        let addresser = Addresser::default();
        let a = addresser.identifier(&addresser.address("a.txt"));
        let b = addresser.identifier(&addresser.address("b.txt"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_width_is_clamped() {
        assert_eq!(Addresser::new("X", 1).width(), MIN_DIGEST_WIDTH);
        assert_eq!(Addresser::new("X", 1000).width(), MAX_DIGEST_WIDTH);
        let address = ContentAddress::of("x");
        assert_eq!(Addresser::new("X", 1000).identifier(&address), format!("X{}", address.digest()));
    }

    #[test]
    fn test_prefix_validation() {
        assert!(is_valid_prefix("Asset_"));
        assert!(is_valid_prefix("_embed"));
        assert!(!is_valid_prefix(""));
        assert!(!is_valid_prefix("1x"));
        assert!(!is_valid_prefix("a-b"));
    }
}
