//! Quantile Computation
//!
//! Quartiles use linear-interpolation ranking: quantile `p` sits at rank
//! `(n - 1) * p`, clamped to `[0, n - 1]`; a fractional rank interpolates
//! linearly between its floor and ceiling neighbors. This is the rule that
//! makes `[1,2,3,4,5]` yield q1 = 2, q3 = 4.

use crate::precision::PrecisionContext;
use bigdecimal::{BigDecimal, FromPrimitive, Zero};

/// Interpolation rank for quantile `p` over a sample of length `n`
fn quantile_rank(n: usize, p: f64) -> f64 {
    ((n - 1) as f64 * p).clamp(0.0, (n - 1) as f64)
}

/// Compute quantile `p` (in `[0, 1]`) from an already-sorted f64 slice
pub fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }

    let rank = quantile_rank(sorted.len(), p);
    let lower = rank.floor() as usize;
    let upper = (lower + 1).min(sorted.len() - 1);
    let fraction = rank - lower as f64;

    sorted[lower] + fraction * (sorted[upper] - sorted[lower])
}

/// Compute quantile `p` from an already-sorted decimal slice
///
/// Same ranking rule as [`quantile_sorted`], carried out in arbitrary
/// precision under `ctx`.
pub fn quantile_sorted_decimal(
    sorted: &[BigDecimal],
    p: f64,
    ctx: &PrecisionContext,
) -> BigDecimal {
    if sorted.is_empty() {
        return BigDecimal::zero();
    }
    if sorted.len() == 1 {
        return sorted[0].clone();
    }

    let rank = quantile_rank(sorted.len(), p);
    let lower = rank.floor() as usize;
    let upper = (lower + 1).min(sorted.len() - 1);
    let fraction = rank - lower as f64;

    if fraction == 0.0 {
        return sorted[lower].clone();
    }

    // fraction is in [0, 1) and exact enough at f64 resolution
    let frac = BigDecimal::from_f64(fraction).unwrap_or_else(BigDecimal::zero);
    let span = &sorted[upper] - &sorted[lower];
    ctx.round(&sorted[lower] + frac * span)
}
