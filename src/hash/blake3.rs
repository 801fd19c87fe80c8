//! BLAKE3 chunk fingerprinting.

use crate::chunk::ChunkHash;

/// Computes BLAKE3 fingerprints of sealed chunks.
#[derive(Debug, Clone, Default)]
pub struct Blake3Hasher {
    state: blake3::Hasher,
}

impl Blake3Hasher {
    /// Creates a new hasher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fingerprints one encoded chunk, leaving the hasher ready for the next.
    pub fn fingerprint(&mut self, data: &[u8]) -> ChunkHash {
        self.state.update(data);
        let hash = ChunkHash::new(self.state.finalize().into());
        self.state.reset();
        hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_matches_one_shot() {
        let mut hasher = Blake3Hasher::new();
        let hash = hasher.fingerprint(b"hello world");
        assert_eq!(hash.as_bytes(), blake3::hash(b"hello world").as_bytes());
    }

    #[test]
    fn test_hasher_resets_between_chunks() {
        let mut hasher = Blake3Hasher::new();
        let first = hasher.fingerprint(b"chunk");
        let second = hasher.fingerprint(b"chunk");
        assert_eq!(first, second);
        assert_ne!(first, hasher.fingerprint(b"other"));
    }
}
