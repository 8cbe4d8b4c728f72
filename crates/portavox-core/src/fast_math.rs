//! Fast approximations for coefficient computation.
//!
//! | Function | Replaces | Use case | Max error |
//! |----------|----------|----------|-----------|
//! | [`fast_tan`] | `libm::tanf` | SVF cutoff warping | < 0.1% (f < sr/4) |

/// Tangent via a 3/3 Padé approximant: `x·(15 − x²) / (15 − 6x²)`.
///
/// Valid for x ∈ \[0, π/3\]. Beyond that the error grows as tan approaches
/// its pole at π/2, so callers switch to `libm::tanf` for high cutoffs.
///
/// ```
/// use portavox_core::fast_math::fast_tan;
///
/// // 1 kHz @ 48 kHz
/// let x = core::f32::consts::PI * 1000.0 / 48000.0;
/// let exact = libm::tanf(x);
/// assert!((fast_tan(x) - exact).abs() / exact < 0.001);
/// ```
#[inline]
pub fn fast_tan(x: f32) -> f32 {
    let x2 = x * x;
    x * (15.0 - x2) / (15.0 - 6.0 * x2)
}
