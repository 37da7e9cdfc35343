//! Pitch offset conversion.
//!
//! Events author pitch as an offset in cents of a semitone (100 per semitone). Playback devices
//! take a multiplicative rate where 1.0 is the clip's native speed. The mapping is exponential,
//! so an offset and its negation always yield reciprocal rates:
//!
//! ```
//! use petalvoice::pitch::cents_to_rate;
//!
//! let up = cents_to_rate(2400.0);
//! let down = cents_to_rate(-2400.0);
//! assert!((up - 2.427114).abs() < 1e-5);
//! assert!((up * down - 1.0).abs() < 1e-6);
//! ```

/// Cents of offset that scale the playback rate by a factor of e.
pub const CENTS_PER_NEPER: f64 = 2706.6565;

/// Largest rate [`cents_to_rate`] returns. The smallest is its reciprocal.
pub const MAX_RATE: f32 = 1024.0;

/// Converts a pitch offset in cents of a semitone into a device rate multiplier.
///
/// The result is clamped to `1 / MAX_RATE ..= MAX_RATE`. NaN maps to the native rate.
pub fn cents_to_rate(cents: f32) -> f32 {
    if cents.is_nan() {
        return 1.0;
    }
    let rate = (cents as f64 / CENTS_PER_NEPER).exp() as f32;
    rate.clamp(MAX_RATE.recip(), MAX_RATE)
}

/// Inverse of [`cents_to_rate`]. Non-positive rates map to `f32::NEG_INFINITY`.
pub fn rate_to_cents(rate: f32) -> f32 {
    if rate <= 0.0 {
        return f32::NEG_INFINITY;
    }
    ((rate as f64).ln() * CENTS_PER_NEPER) as f32
}
