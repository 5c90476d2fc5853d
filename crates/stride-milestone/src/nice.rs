//! Nice-number rounding
//!
//! A nice number has the form `m × 10^k` with `m ∈ {1, 2, 5}`.

const MANTISSAS: [f64; 3] = [1.0, 2.0, 5.0];

/// `m × 10^k`, computed by division for negative `k` so that e.g. `0.2`
/// comes out as the same bits as the literal.
fn nice(m: f64, k: i32) -> f64 {
    if k >= 0 {
        m * 10f64.powi(k)
    } else {
        m / 10f64.powi(-k)
    }
}

/// Exponent `k` with `10^k <= x < 10^(k+1)`
fn decade(x: f64) -> i32 {
    #[allow(clippy::cast_possible_truncation)]
    let mut k = x.log10().floor() as i32;
    if nice(1.0, k) > x {
        k -= 1;
    }
    if nice(1.0, k + 1) <= x {
        k += 1;
    }
    k
}

/// Snap `x` to the nearest nice number. Ties round up.
///
/// Non-positive and non-finite input maps to `0.0`. The function is
/// idempotent: nice numbers map to themselves.
#[must_use]
pub fn round_to_nice_number(x: f64) -> f64 {
    if !x.is_finite() || x <= 0.0 {
        return 0.0;
    }
    let k = decade(x);
    let mut best = nice(1.0, k);
    let candidates = MANTISSAS
        .iter()
        .map(|m| nice(*m, k))
        .chain(std::iter::once(nice(1.0, k + 1)));
    for candidate in candidates {
        if (candidate - x).abs() <= (best - x).abs() {
            best = candidate;
        }
    }
    best
}

/// Smallest nice number strictly greater than `x`
#[must_use]
pub fn next_nice_number(x: f64) -> f64 {
    if !x.is_finite() || x <= 0.0 {
        return 1.0;
    }
    let k = decade(x);
    MANTISSAS
        .iter()
        .map(|m| nice(*m, k))
        .find(|c| *c > x)
        .unwrap_or_else(|| nice(1.0, k + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snaps_to_nearest() {
        assert_eq!(round_to_nice_number(3.0), 2.0);
        assert_eq!(round_to_nice_number(4.0), 5.0);
        assert_eq!(round_to_nice_number(8.0), 10.0);
        assert_eq!(round_to_nice_number(130.0), 100.0);
        assert_eq!(round_to_nice_number(0.17), 0.2);
    }

    #[test]
    fn ties_round_up() {
        assert_eq!(round_to_nice_number(1.5), 2.0);
        assert_eq!(round_to_nice_number(7.5), 10.0);
    }

    #[test]
    fn nice_numbers_are_fixed_points() {
        for x in [0.01, 0.2, 0.5, 1.0, 2.0, 5.0, 10.0, 200.0, 5000.0, 1e6] {
            assert_eq!(round_to_nice_number(x), x);
        }
    }

    #[test]
    fn non_positive_maps_to_zero() {
        assert_eq!(round_to_nice_number(0.0), 0.0);
        assert_eq!(round_to_nice_number(-3.0), 0.0);
        assert_eq!(round_to_nice_number(f64::NAN), 0.0);
    }

    #[test]
    fn next_steps_through_sequence() {
        assert_eq!(next_nice_number(1.0), 2.0);
        assert_eq!(next_nice_number(2.0), 5.0);
        assert_eq!(next_nice_number(5.0), 10.0);
        assert_eq!(next_nice_number(10.0), 20.0);
        assert_eq!(next_nice_number(3.0), 5.0);
        assert_eq!(next_nice_number(0.0), 1.0);
    }
}
