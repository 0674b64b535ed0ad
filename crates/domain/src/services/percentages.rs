//! Percentage arithmetic for dashboard breakdowns.
//!
//! Rating breakdowns are reported with one decimal and must add up to exactly
//! 100.0. Shares are computed in tenths of a percent with integer arithmetic
//! and the tenths lost to flooring are handed out by largest remainder.

use crate::models::dashboard::{RatingBreakdown, RatingShare};

/// Tenths of a percent in a whole.
const TARGET_TENTHS: i64 = 1000;

/// Breaks rating counts (index 0 is rating 1) into shares summing to 100.0.
///
/// Ties between equal remainders go to the lower rating. All percentages are
/// zero when there are no ratings.
pub fn rating_breakdown(counts: [i64; 5]) -> RatingBreakdown {
    let counts = counts.map(|c| c.max(0));
    let total: i64 = counts.iter().sum();
    let mut tenths = [0i64; 5];

    if total > 0 {
        // (index, remainder numerator over `total`)
        let mut remainders: Vec<(usize, i64)> = Vec::with_capacity(5);
        let mut used = 0;
        for (idx, count) in counts.iter().enumerate() {
            let scaled = count * TARGET_TENTHS;
            tenths[idx] = scaled / total;
            used += tenths[idx];
            remainders.push((idx, scaled % total));
        }

        // stable: equal remainders keep rating order
        remainders.sort_by(|a, b| b.1.cmp(&a.1));
        let remaining = (TARGET_TENTHS - used).max(0) as usize;
        for i in 0..remaining {
            let (idx, _) = remainders[i % remainders.len()];
            tenths[idx] += 1;
        }
    }

    (0..5)
        .map(|idx| {
            (
                (idx + 1).to_string(),
                RatingShare {
                    count: counts[idx],
                    total,
                    percent: tenths[idx] as f64 / 10.0,
                },
            )
        })
        .collect()
}

/// `part / total` as a percentage rounded to one decimal; 0.0 for an empty total.
pub fn share_1dp(part: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    round_to(part as f64 / total as f64 * 100.0, 1)
}

/// Rounds to `decimals` places; exact halves go to the even neighbour.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}
