//! Chunk size selection from an expected dataset volume.
//!
//! Larger chunks compress better and need less per-chunk bookkeeping, but
//! every chunk is fully resident in memory even for tiny arrays. The curve
//! below favours small chunks for small datasets and saturates at 1 MiB:
//!
//! | expected size | chunk size |
//! |---------------|------------|
//! | <= 0.1 KB     | 4 KiB      |
//! | 1 MB          | 64 KiB     |
//! | >= 10 GB      | 1 MiB      |
//!
//! # Example
//!
//! ```
//! use carrayrs::calc_chunk_size;
//!
//! assert_eq!(calc_chunk_size(1.0)?, 64 * 1024);
//! assert_eq!(calc_chunk_size(5e6)?, 1024 * 1024);
//! # Ok::<(), carrayrs::CArrayError>(())
//! ```

use tracing::debug;

use crate::error::CArrayError;

/// Base unit the sizing curve is scaled from (1 KiB).
pub const BASE_CHUNK_SIZE: usize = 1024;

/// Smallest expected size considered, in MB (0.1 KB).
pub const MIN_EXPECTED_SIZE_MB: f64 = 1e-4;

/// Largest expected size considered, in MB (10 GB).
pub const MAX_EXPECTED_SIZE_MB: f64 = 1e4;

/// Decade of [`MIN_EXPECTED_SIZE_MB`].
pub const MIN_ZONE: i32 = -4;

/// Decade of [`MAX_EXPECTED_SIZE_MB`].
pub const MAX_ZONE: i32 = 4;

/// Offset added to the decade to get the power-of-two multiplier.
const ZONE_SHIFT: i32 = 6;

/// Number of bytes in one MB for the purpose of size estimates.
const BYTES_PER_MB: f64 = (1u64 << 20) as f64;

// Exact decade boundaries, so quantization never depends on log10 rounding.
const DECADES: [f64; 9] = [1e-4, 1e-3, 1e-2, 1e-1, 1e0, 1e1, 1e2, 1e3, 1e4];

/// Clamps an expected size into `[MIN_EXPECTED_SIZE_MB, MAX_EXPECTED_SIZE_MB]`.
pub fn limit_expected_size(expected_mb: f64) -> f64 {
    expected_mb.clamp(MIN_EXPECTED_SIZE_MB, MAX_EXPECTED_SIZE_MB)
}

/// Returns the decade (`floor(log10(x))`) of an expected size, after clamping.
///
/// The result is always within `MIN_ZONE..=MAX_ZONE`.
pub fn size_zone(expected_mb: f64) -> i32 {
    let clamped = limit_expected_size(expected_mb);
    let below = DECADES.iter().take_while(|&&d| d <= clamped).count();
    MIN_ZONE + below.saturating_sub(1) as i32
}

/// Chunk size in bytes for a dataset whose size falls in decade `zone`.
///
/// Computes `BASE_CHUNK_SIZE * 2^(zone + 6)`; `zone` is clamped into
/// `MIN_ZONE..=MAX_ZONE`.
pub fn chunk_size_formula(zone: i32) -> usize {
    let zone = zone.clamp(MIN_ZONE, MAX_ZONE);
    BASE_CHUNK_SIZE << (zone + ZONE_SHIFT) as u32
}

/// Computes the recommended chunk size in bytes for `expected_mb` megabytes.
///
/// # Errors
///
/// Returns [`CArrayError::InvalidArgument`] if `expected_mb` is NaN or
/// negative. Zero and values beyond the clamp bounds are accepted.
pub fn calc_chunk_size(expected_mb: f64) -> Result<usize, CArrayError> {
    if expected_mb.is_nan() {
        return Err(CArrayError::invalid("expected size must be a number"));
    }
    if expected_mb < 0.0 {
        return Err(CArrayError::invalid("expected size must be non-negative"));
    }

    let zone = size_zone(expected_mb);
    let chunk_size = chunk_size_formula(zone);
    debug!(expected_mb, zone, chunk_size, "computed chunk size");
    Ok(chunk_size)
}

/// Converts an item count and item width into an expected size in MB.
pub fn expected_size_mb(nitems: u64, item_size: usize) -> f64 {
    nitems as f64 * item_size as f64 / BYTES_PER_MB
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_values() {
        assert_eq!(calc_chunk_size(1e-4).unwrap(), 4096);
        assert_eq!(calc_chunk_size(1.0).unwrap(), 65536);
        assert_eq!(calc_chunk_size(1e4).unwrap(), 1048576);
    }

    #[test]
    fn test_every_decade() {
        let expected = [4, 8, 16, 32, 64, 128, 256, 512, 1024];
        for (decade, kib) in DECADES.iter().zip(expected) {
            assert_eq!(calc_chunk_size(*decade).unwrap(), kib * 1024);
        }
    }

    #[test]
    fn test_quantizes_down() {
        // Anything in [1, 10) MB lands in the 1 MB bucket.
        assert_eq!(calc_chunk_size(9.99).unwrap(), 65536);
        assert_eq!(calc_chunk_size(10.0).unwrap(), 131072);
        // Sub-MB values round down, not toward zero.
        assert_eq!(calc_chunk_size(0.5).unwrap(), 32768);
    }

    #[test]
    fn test_clamping() {
        assert_eq!(calc_chunk_size(0.0).unwrap(), 4096);
        assert_eq!(calc_chunk_size(1e-12).unwrap(), 4096);
        assert_eq!(calc_chunk_size(1e9).unwrap(), 1048576);
        assert_eq!(calc_chunk_size(f64::INFINITY).unwrap(), 1048576);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(matches!(
            calc_chunk_size(-1.0),
            Err(CArrayError::InvalidArgument { .. })
        ));
        assert!(matches!(
            calc_chunk_size(f64::NAN),
            Err(CArrayError::InvalidArgument { .. })
        ));
        assert!(calc_chunk_size(f64::NEG_INFINITY).is_err());
    }

    #[test]
    fn test_size_zone_bounds() {
        assert_eq!(size_zone(0.0), MIN_ZONE);
        assert_eq!(size_zone(1.0), 0);
        assert_eq!(size_zone(123.0), 2);
        assert_eq!(size_zone(f64::MAX), MAX_ZONE);
    }

    #[test]
    fn test_formula_clamps_zone() {
        assert_eq!(chunk_size_formula(-100), 4096);
        assert_eq!(chunk_size_formula(100), 1048576);
    }

    #[test]
    fn test_expected_size_mb() {
        assert_eq!(expected_size_mb(1 << 20, 8), 8.0);
        assert_eq!(expected_size_mb(0, 8), 0.0);
    }
}
