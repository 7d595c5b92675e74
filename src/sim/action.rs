//! Discrete maneuver catalog
//!
//! Every decision picks one of these eight actions. The catalog order is
//! significant: it is the tie-break order when the policy scores actions.

use serde::{Deserialize, Serialize};

/// Named maneuvers, in catalog order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Maintain,
    AccelSoft,
    BrakeSoft,
    BrakeHard,
    SteerLeft,
    SteerRight,
    OvertakeLeft,
    OvertakeRight,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Maintain => "maintain",
            ActionKind::AccelSoft => "accel_soft",
            ActionKind::BrakeSoft => "brake_soft",
            ActionKind::BrakeHard => "brake_hard",
            ActionKind::SteerLeft => "steer_left",
            ActionKind::SteerRight => "steer_right",
            ActionKind::OvertakeLeft => "overtake_left",
            ActionKind::OvertakeRight => "overtake_right",
        }
    }

    /// The catalog entry for this maneuver
    pub fn action(self) -> Action {
        CATALOG[self as usize]
    }
}

/// One maneuver: scale the current speed and turn the heading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub kind: ActionKind,
    /// Multiplier on current speed (>= 0)
    pub speed_factor: f64,
    /// Instantaneous heading change (radians, positive = left)
    pub steer_rad: f64,
}

const fn deg(d: f64) -> f64 {
    d * std::f64::consts::PI / 180.0
}

/// The fixed action catalog
pub const CATALOG: [Action; 8] = [
    Action { kind: ActionKind::Maintain, speed_factor: 1.0, steer_rad: 0.0 },
    Action { kind: ActionKind::AccelSoft, speed_factor: 1.05, steer_rad: 0.0 },
    Action { kind: ActionKind::BrakeSoft, speed_factor: 0.7, steer_rad: 0.0 },
    Action { kind: ActionKind::BrakeHard, speed_factor: 0.3, steer_rad: 0.0 },
    Action { kind: ActionKind::SteerLeft, speed_factor: 0.9, steer_rad: deg(6.0) },
    Action { kind: ActionKind::SteerRight, speed_factor: 0.9, steer_rad: -deg(6.0) },
    Action { kind: ActionKind::OvertakeLeft, speed_factor: 1.15, steer_rad: deg(10.0) },
    Action { kind: ActionKind::OvertakeRight, speed_factor: 1.15, steer_rad: -deg(10.0) },
];

/// Candidates considered when the boundary itself is the threat
pub const BOUNDARY_ESCAPES: [ActionKind; 5] = [
    ActionKind::SteerLeft,
    ActionKind::SteerRight,
    ActionKind::Maintain,
    ActionKind::OvertakeLeft,
    ActionKind::OvertakeRight,
];

impl Action {
    pub const MAINTAIN: Action = CATALOG[0];
    pub const ACCEL_SOFT: Action = CATALOG[1];
}
