//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where 
    T: Float 
{
    target_range.0 
        + ((value - source_range.0) 
        * (target_range.1 - target_range.0) 
        / (source_range.1 - source_range.0))
}

pub fn clamp<T>(value: &T, min: &T, max: &T) -> T 
where
    T: Float
{
    let mut ret = *value;

    if ret > *max {
        ret = *max
    }
    if ret < *min {
        ret = *min
    }

    ret
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
/// 
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()`, violating the mathematical definition, if
/// `self` is much smaller than `rhs.abs()` in magnitude and `self < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float
{
    let r = lhs % rhs;
    if r < T::zero() { r + rhs.abs() } else { r }
}

/// Wrap a value into the half-open range `(min, max]`.
///
/// The range is treated as a continuous (circular) domain of length
/// `max - min`, so `min` itself maps onto `max`. Negative inputs are handled
/// with a euclidian remainder rather than the sign-following `%` operator.
///
/// `max` must be greater than `min`.
pub fn wrap_to_range<T>(value: T, min: T, max: T) -> T
where
    T: Float
{
    let modulus = max - min;

    // Shift so that the range starts at zero, take the remainder, then shift
    // back. The result lies in [min, max), which is then flipped at the lower
    // bound to give (min, max].
    let mut wrapped = rem_euclid(value - min, modulus) + min;

    if wrapped <= min {
        wrapped = wrapped + modulus;
    }
    if wrapped > max {
        wrapped = wrapped - modulus;
    }

    wrapped
}

/// Wrap an angle in degrees into `(-180, 180]`.
pub fn wrap_deg<T>(angle_deg: T) -> T
where
    T: Float
{
    let half_turn = T::from(180.0).unwrap();
    wrap_to_range(angle_deg, -half_turn, half_turn)
}

/// Get the shortest signed distance from `from` to `to` within a continuous
/// domain `[min, max]`.
///
/// The result `d` satisfies `from + d ≡ to (mod max - min)` and lies in
/// `(-(max - min)/2, (max - min)/2]`.
pub fn get_ang_dist<T>(from: T, to: T, min: T, max: T) -> T
where
    T: Float
{
    let half_span = (max - min) / T::from(2.0).unwrap();
    wrap_to_range(to - from, -half_span, half_span)
}
