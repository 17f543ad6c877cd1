//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Map a value from one range into another.
///
/// The value is not clamped, so values outside of `source_range` map to values outside of
/// `target_range`.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where 
    T: Float 
{
    target_range.0 
        + ((value - source_range.0) 
        * (target_range.1 - target_range.0) 
        / (source_range.1 - source_range.0))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_lin_map() {
        assert_eq!(lin_map((0f64, 1023f64), (0f64, 90f64), 0f64), 0f64);
        assert_eq!(lin_map((0f64, 1023f64), (0f64, 90f64), 1023f64), 90f64);
        assert_eq!(lin_map((0f64, 1023f64), (0f64, 90f64), 2046f64), 180f64);
        assert_eq!(lin_map((0f64, 1023f64), (0f64, 90f64), -1023f64), -90f64);
        assert_eq!(lin_map((-1f64, 1f64), (0f64, 10f64), 0f64), 5f64);
    }
}
