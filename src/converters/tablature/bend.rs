//! Bend curve construction

use crate::models::{BendCurve, UNSET};
use crate::score::BendPoint;

/// Middle offset meaning "curve has no middle point"
const NO_MIDDLE: i32 = 12;

/// Offset used for a middle point stored as "exactly in the middle"
const MIDPOINT: i32 = 50;

const END: i32 = 100;

/// Build bend points: origin, up to two middle points, destination
pub fn bend_points(curve: &BendCurve) -> Vec<BendPoint> {
    let mut points = vec![BendPoint { time: 0, pitch: curve.origin_value }];

    let push_new = |points: &mut Vec<BendPoint>, p: BendPoint| {
        if points.last() != Some(&p) {
            points.push(p);
        }
    };

    let has_middle = curve.middle_offset1 != NO_MIDDLE && curve.middle_offset2 != NO_MIDDLE;
    if has_middle {
        let (o1, o2, dest) = (curve.middle_offset1, curve.middle_offset2, curve.destination_offset);
        if o1 >= 0 && o1 < dest {
            push_new(&mut points, BendPoint { time: o1, pitch: curve.middle_value });
        }
        if o2 >= 0 && o2 != o1 && o2 < dest {
            push_new(&mut points, BendPoint { time: o2, pitch: curve.middle_value });
        }
        if o1 == UNSET && o2 == UNSET && curve.middle_value != UNSET && (dest > MIDPOINT || dest == UNSET) {
            points.push(BendPoint { time: MIDPOINT, pitch: curve.middle_value });
        }
    }

    if curve.destination_offset <= 0 {
        points.push(BendPoint { time: END, pitch: curve.destination_value });
    } else {
        push_new(
            &mut points,
            BendPoint { time: curve.destination_offset, pitch: curve.destination_value },
        );
    }
    points
}
