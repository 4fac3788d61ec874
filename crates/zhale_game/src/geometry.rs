//! Line-segment intersection, the parametric form.
//!
//! Solves `p0 + s·(p1-p0) = p2 + t·(p3-p2)` and reports a hit only when both
//! parameters land in `[0, 1]`. Parallel and degenerate (zero-length)
//! segments have a near-zero denominator and report no intersection — never
//! a numeric fault.

use glam::Vec2;

const PARALLEL_EPS: f32 = 1e-6;

pub fn segment_intersection(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2) -> Option<Vec2> {
    let d1 = p1 - p0;
    let d2 = p3 - p2;

    let denom = d1.perp_dot(d2);
    if denom.abs() < PARALLEL_EPS {
        return None;
    }

    let diff = p2 - p0;
    let s = diff.perp_dot(d2) / denom;
    let t = diff.perp_dot(d1) / denom;
    if !(0.0..=1.0).contains(&s) || !(0.0..=1.0).contains(&t) {
        return None;
    }
    Some(p0 + d1 * s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crossing_segments_intersect_on_both() {
        let p0 = Vec2::new(10.0, 10.0);
        let p1 = Vec2::new(150.0, 150.0);
        let p2 = Vec2::new(40.0, 10.0);
        let p3 = Vec2::new(100.0, 150.0);

        let point = segment_intersection(p0, p1, p2, p3).expect("segments cross");

        // Reconstruct parameters from the reported point; both must be in [0,1]
        // and both segments must pass through the same point.
        let s = (point - p0).length() / (p1 - p0).length();
        let t = (point - p2).length() / (p3 - p2).length();
        assert!((0.0..=1.0).contains(&s));
        assert!((0.0..=1.0).contains(&t));
        assert!((p0 + (p1 - p0) * s - point).length() < 1e-3);
        assert!((p2 + (p3 - p2) * t - point).length() < 1e-3);
    }

    #[test]
    fn parallel_segments_do_not_intersect() {
        let hit = segment_intersection(
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(1.0, 1.0),
        );
        assert!(hit.is_none());
    }

    #[test]
    fn zero_length_segment_does_not_intersect() {
        let hit = segment_intersection(
            Vec2::new(5.0, 5.0),
            Vec2::new(5.0, 5.0),
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 10.0),
        );
        assert!(hit.is_none());
    }

    #[test]
    fn lines_crossing_outside_the_segments_do_not_intersect() {
        // The infinite lines cross at (0,0), outside both segments.
        let hit = segment_intersection(
            Vec2::new(1.0, 1.0),
            Vec2::new(2.0, 2.0),
            Vec2::new(1.0, -1.0),
            Vec2::new(2.0, -2.0),
        );
        assert!(hit.is_none());
    }

    #[test]
    fn shared_endpoint_counts_as_intersection() {
        let point = segment_intersection(
            Vec2::new(0.0, 0.0),
            Vec2::new(4.0, 4.0),
            Vec2::new(4.0, 4.0),
            Vec2::new(8.0, 0.0),
        )
        .expect("touching endpoints intersect");
        assert!((point - Vec2::new(4.0, 4.0)).length() < 1e-5);
    }
}
