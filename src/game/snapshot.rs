//! Match snapshots and board summaries
//!
//! A `MatchSnapshot` is the complete match state written out as versioned
//! JSON, so an analysis session can stop and pick up again later. The
//! `BoardSummary` is a read-only digest of one player's side of the table.

use crate::core::{CardId, PlayerId, PlayerName};
use crate::game::restrictions::check_can_attack;
use crate::game::GameState;
use crate::{MtgError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Snapshot format written by this version
pub const SNAPSHOT_VERSION: &str = "1";

/// A saved match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchSnapshot {
    pub version: String,
    pub state: GameState,
}

impl MatchSnapshot {
    pub fn new(state: GameState) -> Self {
        MatchSnapshot {
            version: SNAPSHOT_VERSION.to_string(),
            state,
        }
    }

    /// Save this snapshot to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    /// Load a snapshot from a JSON file
    ///
    /// Snapshots from another format version are rejected.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let snapshot: MatchSnapshot = serde_json::from_str(&json)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(MtgError::SerializationError(format!(
                "unsupported snapshot version {} (expected {SNAPSHOT_VERSION})",
                snapshot.version
            )));
        }
        Ok(snapshot)
    }

    pub fn into_state(self) -> GameState {
        self.state
    }
}

/// Whether one creature could be declared as an attacker right now
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackerReport {
    pub card: CardId,
    pub name: String,
    pub power: i32,
    pub can_attack: bool,
    /// Why the creature cannot attack, when it cannot
    pub reason: Option<String>,
}

/// One player's side of the board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSummary {
    pub player: PlayerId,
    pub name: PlayerName,
    pub life: i32,
    pub hand_size: usize,
    pub creature_count: usize,
    pub land_count: usize,
    /// Sum of power across the player's creatures
    pub total_power: i32,
    /// Power of the player's creatures currently attacking
    pub attacking_power: i32,
    /// The opponent's attackers deal at least this player's life if unblocked
    pub lethal: bool,
    pub attackers: Vec<AttackerReport>,
}

impl GameState {
    /// Summarize a player's board
    ///
    /// Attacker reports are only filled in for the active player.
    pub fn board_summary(&self, player: PlayerId) -> Result<BoardSummary> {
        let p = self.get_player(player)?;

        let creatures: Vec<_> = self
            .battlefield_cards(player)
            .filter(|c| c.is_creature())
            .collect();
        let total_power = creatures.iter().map(|c| c.current_power().max(0)).sum();
        let attacking_power = creatures
            .iter()
            .filter(|c| c.attacking)
            .map(|c| c.current_power().max(0))
            .sum();

        let incoming: i32 = self
            .opponent_of(player)
            .map(|opp| {
                self.battlefield_cards(opp)
                    .filter(|c| c.is_creature() && c.attacking)
                    .map(|c| c.current_power().max(0))
                    .sum()
            })
            .unwrap_or(0);

        let attackers = if player == self.active_player() {
            creatures
                .iter()
                .map(|c| {
                    let verdict = check_can_attack(self, c);
                    AttackerReport {
                        card: c.id,
                        name: c.name.to_string(),
                        power: c.current_power(),
                        can_attack: verdict.is_ok(),
                        reason: verdict.err().map(|e| e.to_string()),
                    }
                })
                .collect()
        } else {
            Vec::new()
        };

        Ok(BoardSummary {
            player,
            name: p.name.clone(),
            life: p.life,
            hand_size: self.hand_cards(player).count(),
            creature_count: creatures.len(),
            land_count: self.battlefield_cards(player).filter(|c| c.is_land()).count(),
            total_power,
            attacking_power,
            lethal: incoming > 0 && incoming >= p.life,
            attackers,
        })
    }
}
