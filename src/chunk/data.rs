//! The Chunk type - one sealed, fixed-length block of an array.

use bytes::Bytes;
use std::fmt;

use super::ChunkHash;

/// A sealed chunk of a chunked array.
///
/// A chunk holds exactly `chunk_len` items of its array, encoded
/// little-endian. Once sealed it is never modified; this is the unit handed
/// to the compression backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// Encoded item bytes.
    pub data: Bytes,

    /// Index of the first item of this chunk within the array.
    pub offset: u64,

    /// Number of items in the chunk.
    pub nitems: usize,

    /// Fingerprint of `data` (if computed).
    pub hash: Option<ChunkHash>,
}

impl Chunk {
    /// Creates a chunk from encoded bytes.
    pub fn new(data: impl Into<Bytes>, offset: u64, nitems: usize) -> Self {
        Self {
            data: data.into(),
            offset,
            nitems,
            hash: None,
        }
    }

    /// Sets the hash.
    pub fn set_hash(mut self, hash: ChunkHash) -> Self {
        self.hash = Some(hash);
        self
    }

    /// Returns the number of items.
    pub fn len(&self) -> usize {
        self.nitems
    }

    /// Returns true if the chunk holds no items.
    pub fn is_empty(&self) -> bool {
        self.nitems == 0
    }

    /// Returns the number of encoded bytes.
    pub fn nbytes(&self) -> usize {
        self.data.len()
    }

    /// Returns the item range covered by this chunk.
    pub fn range(&self) -> std::ops::Range<u64> {
        self.offset..self.offset + self.nitems as u64
    }

    /// Returns true if the item at `index` lives in this chunk.
    pub fn contains(&self, index: u64) -> bool {
        self.range().contains(&index)
    }
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Chunk({} items, {} bytes @ {}",
            self.nitems,
            self.nbytes(),
            self.offset
        )?;
        if let Some(hash) = self.hash {
            write!(f, ", hash={}", &hash.to_hex()[..16])?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let chunk = Chunk::new(vec![0u8; 16], 32, 4);
        assert_eq!(chunk.len(), 4);
        assert_eq!(chunk.nbytes(), 16);
        assert!(!chunk.is_empty());
        assert!(chunk.hash.is_none());
    }

    #[test]
    fn test_range() {
        let chunk = Chunk::new(vec![0u8; 8], 100, 8);
        assert_eq!(chunk.range(), 100..108);
        assert!(chunk.contains(100));
        assert!(chunk.contains(107));
        assert!(!chunk.contains(108));
    }

    #[test]
    fn test_display() {
        let chunk = Chunk::new(vec![0u8; 8], 100, 2).set_hash(ChunkHash::new([0xab; 32]));
        let s = chunk.to_string();
        assert!(s.contains("2 items"));
        assert!(s.contains("8 bytes @ 100"));
        assert!(s.contains("hash=abababab"));
    }
}
