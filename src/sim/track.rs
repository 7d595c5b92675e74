//! Track boundary geometry and boundary time-to-collision
//!
//! The track is a closed band between an inner and an outer curve. Each
//! curve is a union of primitives:
//! - horizontal / vertical segments with a bounded extent
//! - slanted segments given by two endpoints
//! - circular arcs that only bound the curved end cap on one side
//!
//! A ray `position + t * velocity` is intersected with every primitive and
//! the earliest valid hit wins.

use serde::{Deserialize, Serialize};

use super::vector::Vector2D;
use crate::consts::{EPSILON, SPAWN_CAP_MARGIN, SPAWN_WALL_MARGIN};
use crate::settings::TrackGeometry;

/// Which end of the track an arc closes off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CapSide {
    /// Arc bounds the region `x <= center.x`
    Left,
    /// Arc bounds the region `x >= center.x`
    Right,
}

/// One geometric piece of a boundary curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Primitive {
    /// `y = y`, valid for `x in [x_min, x_max]`
    Horizontal { y: f64, x_min: f64, x_max: f64 },
    /// `x = x`, valid for `y in [y_min, y_max]`
    Vertical { x: f64, y_min: f64, y_max: f64 },
    /// Segment between two points with different x
    Slanted { start: Vector2D, end: Vector2D },
    /// Circle arc closing one end of the track
    Arc {
        center: Vector2D,
        radius: f64,
        side: CapSide,
    },
}

impl Primitive {
    /// Earliest valid hit time of the ray against this primitive
    pub fn time_to_hit(&self, position: Vector2D, velocity: Vector2D) -> Option<f64> {
        let (px, py) = (position.x(), position.y());
        let (vx, vy) = (velocity.x(), velocity.y());

        match *self {
            Primitive::Horizontal { y, x_min, x_max } => {
                if vy.abs() <= EPSILON {
                    return None;
                }
                let t = (y - py) / vy;
                let x_at_t = px + vx * t;
                (t > 0.0 && (x_min..=x_max).contains(&x_at_t)).then_some(t)
            }
            Primitive::Vertical { x, y_min, y_max } => {
                if vx.abs() <= EPSILON {
                    return None;
                }
                let t = (x - px) / vx;
                let y_at_t = py + vy * t;
                (t > EPSILON && (y_min..=y_max).contains(&y_at_t)).then_some(t)
            }
            Primitive::Slanted { start, end } => {
                let run = end.x() - start.x();
                if run.abs() <= EPSILON {
                    return None;
                }
                let m = (end.y() - start.y()) / run;
                let b = start.y() - m * start.x();

                let a = vy - m * vx;
                if a.abs() <= EPSILON {
                    return None;
                }
                let t = (m * px - py + b) / a;
                if t <= EPSILON {
                    return None;
                }
                let x_at_t = px + vx * t;
                let (x_min, x_max) = (start.x().min(end.x()), start.x().max(end.x()));
                (x_min..=x_max).contains(&x_at_t).then_some(t)
            }
            Primitive::Arc {
                center,
                radius,
                side,
            } => {
                let rel = position - center;
                let a = velocity.dot(velocity);
                let b = 2.0 * rel.dot(velocity);
                let c = rel.dot(rel) - radius * radius;

                let disc = b * b - 4.0 * a * c;
                if disc < 0.0 || a <= EPSILON {
                    return None;
                }
                let sqrt_disc = disc.sqrt();
                let t1 = (-b - sqrt_disc) / (2.0 * a);
                let t2 = (-b + sqrt_disc) / (2.0 * a);

                // Smallest strictly positive root
                let t = [t1, t2]
                    .into_iter()
                    .filter(|t| *t > EPSILON)
                    .min_by(f64::total_cmp)?;

                // The arc only bounds the curved end beyond the straights
                let x_at_t = px + vx * t;
                let beyond_straight = match side {
                    CapSide::Left => x_at_t <= center.x(),
                    CapSide::Right => x_at_t >= center.x(),
                };
                beyond_straight.then_some(t)
            }
        }
    }
}

/// A named primitive so diagnostics can say which wall is closest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryPiece {
    pub name: String,
    pub primitive: Primitive,
}

/// Start/finish line: a vertical span crossed in the `-x` direction.
///
/// A crossing only counts as a lap once the agent has been at or below
/// `checkpoint_y` (the far straight) since its previous lap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinishLine {
    pub x: f64,
    pub y_min: f64,
    pub y_max: f64,
    pub checkpoint_y: f64,
}

impl FinishLine {
    /// True when a step from `from` to `to` crosses the line moving toward -x
    pub fn crossed(&self, from: Vector2D, to: Vector2D) -> bool {
        if !(from.x() > self.x && to.x() <= self.x) {
            return false;
        }
        let dx = to.x() - from.x();
        let t = (self.x - from.x()) / dx;
        let y = from.y() + (to.y() - from.y()) * t;
        (self.y_min..=self.y_max).contains(&y)
    }

    /// True when `position` is on the far side of the track
    #[inline]
    pub fn reached_checkpoint(&self, position: Vector2D) -> bool {
        position.y() <= self.checkpoint_y
    }
}

/// Axis-aligned rectangle used for random spawn positions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnZone {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl SpawnZone {
    pub fn contains(&self, p: Vector2D) -> bool {
        (self.x_min..=self.x_max).contains(&p.x()) && (self.y_min..=self.y_max).contains(&p.y())
    }
}

/// The closed track: inner and outer boundary primitives
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackBoundary {
    pieces: Vec<BoundaryPiece>,
    finish_line: Option<FinishLine>,
}

impl TrackBoundary {
    /// Build a track from arbitrary primitives (no finish line)
    pub fn from_primitives(pieces: Vec<BoundaryPiece>) -> Self {
        Self {
            pieces,
            finish_line: None,
        }
    }

    /// Symmetric oval: straights at `y = ±inner` and `y = ±outer` over
    /// `x in [-half, half]`, closed by semicircular caps centred on `(±half, 0)`.
    pub fn oval(geometry: &TrackGeometry) -> Self {
        let half = geometry.left_rect_half;
        let inner = geometry.inner_radius;
        let outer = geometry.outer_radius;

        let mut pieces = Vec::with_capacity(8);
        for (name, y) in [
            ("inner_top", inner),
            ("inner_bottom", -inner),
            ("outer_top", outer),
            ("outer_bottom", -outer),
        ] {
            pieces.push(BoundaryPiece {
                name: name.to_string(),
                primitive: Primitive::Horizontal {
                    y,
                    x_min: -half,
                    x_max: half,
                },
            });
        }
        for (name, center_x, side) in [
            ("left", -half, CapSide::Left),
            ("right", half, CapSide::Right),
        ] {
            for (ring, radius) in [("inner", inner), ("outer", outer)] {
                pieces.push(BoundaryPiece {
                    name: format!("{ring}_{name}_cap"),
                    primitive: Primitive::Arc {
                        center: Vector2D::new(center_x, 0.0),
                        radius,
                        side,
                    },
                });
            }
        }

        Self {
            pieces,
            finish_line: Some(FinishLine {
                x: 0.0,
                y_min: inner,
                y_max: outer,
                checkpoint_y: -inner,
            }),
        }
    }

    pub fn pieces(&self) -> &[BoundaryPiece] {
        &self.pieces
    }

    pub fn finish_line(&self) -> Option<&FinishLine> {
        self.finish_line.as_ref()
    }

    /// Time until `position + t * velocity` first meets any boundary.
    ///
    /// `f64::INFINITY` when the velocity is (near) zero or no primitive is hit.
    pub fn time_to_boundary(&self, position: Vector2D, velocity: Vector2D) -> f64 {
        self.closest_hit(position, velocity)
            .map_or(f64::INFINITY, |(t, _)| t)
    }

    /// Earliest hit and the piece that produced it
    pub fn closest_hit(&self, position: Vector2D, velocity: Vector2D) -> Option<(f64, &BoundaryPiece)> {
        if velocity.x().abs() <= EPSILON && velocity.y().abs() <= EPSILON {
            return None;
        }
        self.pieces
            .iter()
            .filter_map(|piece| {
                piece
                    .primitive
                    .time_to_hit(position, velocity)
                    .map(|t| (t, piece))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
    }
}

impl TrackGeometry {
    /// Agents start on the top straight, left of the finish line
    pub fn agent_spawn_zone(&self) -> SpawnZone {
        SpawnZone {
            x_min: -self.left_rect_half + SPAWN_CAP_MARGIN,
            x_max: 0.0,
            y_min: self.inner_radius + SPAWN_WALL_MARGIN,
            y_max: self.outer_radius - SPAWN_WALL_MARGIN,
        }
    }

    /// Obstacles are scattered along the bottom straight
    pub fn obstacle_spawn_zone(&self) -> SpawnZone {
        SpawnZone {
            x_min: -self.left_rect_half + SPAWN_CAP_MARGIN,
            x_max: self.left_rect_half - SPAWN_CAP_MARGIN,
            y_min: -(self.outer_radius - SPAWN_WALL_MARGIN),
            y_max: -(self.inner_radius + SPAWN_WALL_MARGIN),
        }
    }

    /// Longest obstacle segment that fits between the walls
    pub fn max_obstacle_length(&self) -> f64 {
        (self.outer_radius - self.inner_radius) / 3.0
    }
}
