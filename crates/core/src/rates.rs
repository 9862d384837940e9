//! Rate formulas for monthly records.
//!
//! The covid rate is a plain percent change between the `today` and `week3`
//! slices. The ratio is rounded to two decimals *before* it is scaled to a
//! percentage, which is coarser than rounding the percentage; dashboards
//! already read values produced this way. Rounding works on the exact
//! integer ratio, never on an `f64`.

use serde::{Deserialize, Serialize};

use crate::record::OffsetSlots;
use crate::snapshot::{CovidCounters, FluCounters};

/// `numerator / denominator` rounded to an integer, ties to even.
fn div_round_ties_even(numerator: i128, denominator: i128) -> i128 {
    let (numerator, denominator) = if denominator < 0 {
        (-numerator, -denominator)
    } else {
        (numerator, denominator)
    };
    let quotient = numerator.div_euclid(denominator);
    let twice_rem = 2 * numerator.rem_euclid(denominator);
    if twice_rem > denominator || (twice_rem == denominator && quotient % 2 != 0) {
        quotient + 1
    } else {
        quotient
    }
}

/// `round((today - week3) / week3, 2) * 100`, or `0` when `week3` is zero.
///
/// Two-decimal rounding of the ratio is the same as integer rounding of
/// `100 * (today - week3) / week3`, so the result is always a whole percent.
pub fn monthly_rate(today: i64, week3: i64) -> f64 {
    if week3 == 0 {
        return 0.0;
    }
    let delta = (i128::from(today) - i128::from(week3)) * 100;
    div_round_ties_even(delta, i128::from(week3)) as f64
}

/// `numerator / denominator`, or `0` when the denominator is zero.
pub fn guarded_ratio(numerator: i64, denominator: i64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    numerator as f64 / denominator as f64
}

/// Derived fields of a covid monthly record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CovidRates {
    pub monthly_case_rate: f64,
    pub monthly_death_rate: f64,
}

impl CovidRates {
    pub fn from_slots(slots: &OffsetSlots<CovidCounters>) -> Self {
        let week3 = slots.week3.unwrap_or_default();
        Self {
            monthly_case_rate: monthly_rate(slots.today.cases, week3.cases),
            monthly_death_rate: monthly_rate(slots.today.deaths, week3.deaths),
        }
    }
}

/// Derived fields of a flu monthly record: the ILI share of sampled
/// patients today and three weeks back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FluRates {
    pub today_ili_rate: f64,
    pub week3_ili_rate: f64,
}

impl FluRates {
    pub fn from_slots(slots: &OffsetSlots<FluCounters>) -> Self {
        let week3 = slots.week3.unwrap_or_default();
        Self {
            today_ili_rate: guarded_ratio(slots.today.num_ili, slots.today.num_patients),
            week3_ili_rate: guarded_ratio(week3.num_ili, week3.num_patients),
        }
    }
}
