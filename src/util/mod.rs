//! Small helpers shared by array operations.

use crate::error::CArrayError;

/// Returns the number of elements in the half-open range `start..stop` taken
/// every `step` elements.
///
/// # Errors
///
/// Returns [`CArrayError::InvalidArgument`] if `step` is not positive.
///
/// # Example
///
/// ```
/// use carrayrs::range_len;
///
/// assert_eq!(range_len(0, 10, 3)?, 4);
/// assert_eq!(range_len(5, 5, 1)?, 0);
/// # Ok::<(), carrayrs::CArrayError>(())
/// ```
pub fn range_len(start: i64, stop: i64, step: i64) -> Result<u64, CArrayError> {
    if step <= 0 {
        return Err(CArrayError::invalid("range step must be positive"));
    }
    if start >= stop {
        return Ok(0);
    }

    let span = stop.abs_diff(start);
    Ok((span - 1) / step as u64 + 1)
}
