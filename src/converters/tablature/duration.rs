//! Rhythm unit + dots to exact duration

use crate::models::{Rhythm, RhythmUnit};
use crate::score::{DurationType, Fraction};

pub fn denominator(unit: RhythmUnit) -> i32 {
    match unit {
        RhythmUnit::Whole => 1,
        RhythmUnit::Half => 2,
        RhythmUnit::Quarter => 4,
        RhythmUnit::Eighth => 8,
        RhythmUnit::Sixteenth => 16,
        RhythmUnit::ThirtySecond => 32,
        RhythmUnit::SixtyFourth => 64,
    }
}

pub fn duration_type(unit: RhythmUnit) -> DurationType {
    match unit {
        RhythmUnit::Whole => DurationType::Whole,
        RhythmUnit::Half => DurationType::Half,
        RhythmUnit::Quarter => DurationType::Quarter,
        RhythmUnit::Eighth => DurationType::Eighth,
        RhythmUnit::Sixteenth => DurationType::Sixteenth,
        RhythmUnit::ThirtySecond => DurationType::ThirtySecond,
        RhythmUnit::SixtyFourth => DurationType::SixtyFourth,
    }
}

/// Most dots a rhythm may carry; extra dots are ignored
pub const MAX_DOTS: u8 = 3;

/// `1/d` plus `1/(d * 2 * i)` for each dot `i` in `1..=dots`
///
/// Dots past the first therefore add 1/(4d), 1/(6d)... rather than halving
/// each time; imported durations keep this arithmetic. Dots beyond
/// [`MAX_DOTS`] are dropped.
pub fn beat_duration(rhythm: Rhythm) -> Fraction {
    let d = denominator(rhythm.unit);
    let mut result = Fraction::new(1, d);
    for dot in 1..=i32::from(rhythm.dots.min(MAX_DOTS)) {
        result += Fraction::new(1, d * 2 * dot);
    }
    result
}
