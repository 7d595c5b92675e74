//! Live race standings
//!
//! Rebuilt from scratch every tick; nothing is carried between ticks.

use serde::{Deserialize, Serialize};

use crate::sim::state::{AgentSnapshot, AgentState, ObjectId};

/// A single leaderboard row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub id: ObjectId,
    /// Completed laps
    pub lap: u32,
    pub speed: f64,
    pub state: AgentState,
    pub fuel: f64,
    /// 1-indexed position
    pub rank: usize,
}

/// Rank agents by laps, then speed, both descending.
///
/// Crashed agents are left out. The sort is stable, so agents that tie on
/// both keys keep their input order.
pub fn rank<'a>(agents: impl IntoIterator<Item = &'a AgentSnapshot>) -> Vec<LeaderboardEntry> {
    let mut standing: Vec<&AgentSnapshot> = agents
        .into_iter()
        .filter(|a| a.state != AgentState::Crashed)
        .collect();

    standing.sort_by(|a, b| b.lap.cmp(&a.lap).then(b.speed.total_cmp(&a.speed)));

    standing
        .into_iter()
        .enumerate()
        .map(|(i, a)| LeaderboardEntry {
            id: a.id,
            lap: a.lap,
            speed: a.speed,
            state: a.state,
            fuel: a.fuel,
            rank: i + 1,
        })
        .collect()
}

/// Position of an agent in a ranked list (None if absent, e.g. crashed)
pub fn position_of(entries: &[LeaderboardEntry], id: ObjectId) -> Option<usize> {
    entries.iter().find(|e| e.id == id).map(|e| e.rank)
}
