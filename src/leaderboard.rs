//! Post-match leaderboard
//!
//! Ranks the local player and every known remote player by kills, then
//! remaining health, then name.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::sim::World;

/// A single leaderboard row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub kills: u32,
    pub hp: i32,
    /// Set for the local player's row
    pub is_local: bool,
}

/// Ranked leaderboard
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub entries: Vec<LeaderboardEntry>,
}

fn rank_order(a: &LeaderboardEntry, b: &LeaderboardEntry) -> Ordering {
    b.kills
        .cmp(&a.kills)
        .then(b.hp.cmp(&a.hp))
        .then_with(|| a.name.cmp(&b.name))
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the current match
    pub fn from_world(world: &World) -> Self {
        let mut board = Self::new();
        board.add(LeaderboardEntry {
            name: world.player.name.clone(),
            kills: world.kills,
            hp: world.player.hp,
            is_local: true,
        });
        for remote in world.remote_players.values() {
            let name = if remote.name.is_empty() {
                remote.id.clone()
            } else {
                remote.name.clone()
            };
            board.add(LeaderboardEntry {
                name,
                kills: remote.kills,
                hp: remote.hp.max(0),
                is_local: false,
            });
        }
        board
    }

    /// Insert an entry at its ranked position, returning the 1-indexed rank
    pub fn add(&mut self, entry: LeaderboardEntry) -> usize {
        let pos = self
            .entries
            .iter()
            .position(|e| rank_order(&entry, e) == Ordering::Less)
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, entry);
        pos + 1
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn winner(&self) -> Option<&LeaderboardEntry> {
        self.entries.first()
    }

    /// Rank of the local player (1-indexed)
    pub fn local_rank(&self) -> Option<usize> {
        self.entries.iter().position(|e| e.is_local).map(|i| i + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, kills: u32, hp: i32) -> LeaderboardEntry {
        LeaderboardEntry {
            name: name.to_string(),
            kills,
            hp,
            is_local: false,
        }
    }

    #[test]
    fn test_ranking_order() {
        let mut board = Leaderboard::new();
        board.add(entry("carol", 2, 50));
        board.add(entry("alice", 5, 0));
        board.add(entry("bob", 2, 80));
        board.add(entry("aaron", 2, 50));

        let names: Vec<_> = board.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["alice", "bob", "aaron", "carol"]);
        assert_eq!(board.winner().map(|e| e.name.as_str()), Some("alice"));
    }

    #[test]
    fn test_add_reports_rank() {
        let mut board = Leaderboard::new();
        assert_eq!(board.add(entry("a", 1, 10)), 1);
        assert_eq!(board.add(entry("b", 3, 10)), 1);
        assert_eq!(board.add(entry("c", 0, 10)), 3);
    }
}
