//! Pairwise time-to-collision solvers
//!
//! Constant-velocity extrapolation only. Every degenerate case (zero-length
//! segment, no closing speed, never reaching contact range) comes back as
//! `f64::INFINITY` so the decision path never branches on errors.

use std::collections::HashMap;

use super::state::ObjectId;
use super::vector::Vector2D;
use crate::consts::EPSILON;

/// Time-to-collision between a moving point and a static segment.
///
/// Projects the point's offset from `segment_start` onto the segment and
/// solves for the time at which the along-segment component of the velocity
/// covers that projected distance. The hit only counts when the extrapolated
/// point projects inside the segment (small tolerance at both ends).
pub fn time_to_segment(
    velocity: Vector2D,
    position: Vector2D,
    segment_start: Vector2D,
    segment_end: Vector2D,
) -> f64 {
    let seg = segment_end - segment_start;
    let seg_len_sq = seg.dot(seg);
    if seg_len_sq <= EPSILON {
        return f64::INFINITY;
    }

    let v_dot_seg = velocity.dot(seg);
    if v_dot_seg.abs() <= EPSILON {
        return f64::INFINITY;
    }

    let rel_pos = position - segment_start;
    let t = rel_pos.dot(seg) / v_dot_seg;
    if t < 0.0 {
        return f64::INFINITY;
    }

    let contact = position + velocity * t;
    let proj = (contact - segment_start).dot(seg) / seg_len_sq;
    if (-EPSILON..=1.0 + EPSILON).contains(&proj) {
        t
    } else {
        f64::INFINITY
    }
}

/// Time until two moving circles come within `combined_radius` of each other.
///
/// Solves `|dp + dv t|^2 = r^2` and returns the smallest non-negative root.
/// Swapping the two agents gives the same answer.
pub fn time_to_agent(
    v1: Vector2D,
    p1: Vector2D,
    v2: Vector2D,
    p2: Vector2D,
    combined_radius: f64,
) -> f64 {
    let dv = v1 - v2;
    let dp = p1 - p2;

    let a = dv.dot(dv);
    if a <= EPSILON {
        return f64::INFINITY;
    }
    let b = 2.0 * dv.dot(dp);
    let c = dp.dot(dp) - combined_radius * combined_radius;

    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return f64::INFINITY;
    }

    let sqrt_disc = disc.sqrt();
    let t1 = (-b - sqrt_disc) / (2.0 * a);
    let t2 = (-b + sqrt_disc) / (2.0 * a);

    [t1, t2]
        .into_iter()
        .filter(|t| *t >= 0.0)
        .min_by(f64::total_cmp)
        .unwrap_or(f64::INFINITY)
}

/// Memo of agent-pair TTCs, keyed by the unordered id pair.
///
/// Lives for one decision scope (the engine uses one per tick) and is
/// dropped afterwards, so results never leak across ticks.
#[derive(Debug, Default)]
pub struct TtcCache {
    entries: HashMap<(ObjectId, ObjectId), f64>,
    hits: u64,
}

impl TtcCache {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn key(a: ObjectId, b: ObjectId) -> (ObjectId, ObjectId) {
        if a <= b { (a, b) } else { (b, a) }
    }

    pub fn get(&self, a: ObjectId, b: ObjectId) -> Option<f64> {
        self.entries.get(&Self::key(a, b)).copied()
    }

    /// Cached value for the pair, computing and storing it on a miss
    pub fn get_or_insert_with(&mut self, a: ObjectId, b: ObjectId, compute: impl FnOnce() -> f64) -> f64 {
        let key = Self::key(a, b);
        if let Some(&ttc) = self.entries.get(&key) {
            self.hits += 1;
            return ttc;
        }
        let ttc = compute();
        self.entries.insert(key, ttc);
        ttc
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of lookups served without recomputing
    pub fn hits(&self) -> u64 {
        self.hits
    }
}
