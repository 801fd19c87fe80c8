//! Chunk types.
//!
//! - [`Chunk`] - Sealed block of encoded items with offset and fingerprint
//! - [`ChunkHash`] - 32-byte BLAKE3 fingerprint

mod data;
mod hash;

pub use data::Chunk;
pub use hash::ChunkHash;
