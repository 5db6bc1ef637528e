//! Priority protocol
//!
//! The active player receives priority at the start of every step. Passing
//! hands priority to the next player in seat order; once every player has
//! passed in succession the step ends.

use crate::core::PlayerId;
use crate::error::LegalityStage;
use crate::game::{Action, GameState, Phase, Step, VerbosityLevel};
use crate::history::StateChange;
use crate::{MtgError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Players who have passed priority in succession
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityTracker {
    passed: BTreeSet<PlayerId>,
}

impl PriorityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pass(&mut self, player: PlayerId) {
        self.passed.insert(player);
    }

    pub fn has_passed(&self, player: PlayerId) -> bool {
        self.passed.contains(&player)
    }

    pub fn clear(&mut self) {
        self.passed.clear();
    }

    pub fn passed(&self) -> &BTreeSet<PlayerId> {
        &self.passed
    }

    pub fn all_passed(&self, mut players: impl Iterator<Item = PlayerId>) -> bool {
        players.all(|p| self.passed.contains(&p))
    }
}

/// Result of a priority pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PassOutcome {
    /// Priority moved on to this player
    Rotated(PlayerId),
    /// Everyone passed; the match advanced to this step
    StepAdvanced(Step),
}

/// Snapshot of the priority situation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityInfo {
    pub active_player: PlayerId,
    pub priority_player: Option<PlayerId>,
    pub phase: Phase,
    pub step: Step,
    pub turn_number: u32,
    pub passed: Vec<PlayerId>,
}

impl GameState {
    pub fn has_priority(&self, player: PlayerId) -> bool {
        !self.priority.has_passed(player)
            && (player == self.turn.active_player || Some(player) == self.turn.priority_player)
    }

    /// Pass priority
    ///
    /// Rejected unless `player` holds priority. When every registered player
    /// has passed, the step advances and priority returns to the active player.
    pub fn pass_priority(&mut self, player: PlayerId) -> Result<PassOutcome> {
        if !self.is_registered(player) {
            return Err(MtgError::illegal(
                LegalityStage::Basic,
                format!("player {player} is not in this match"),
            ));
        }
        if !self.has_priority(player) {
            return Err(MtgError::illegal(
                LegalityStage::Timing,
                format!("player {player} does not have priority"),
            ));
        }

        self.priority.pass(player);
        self.changes.record(StateChange::PriorityPassed { player });
        self.logger.log(
            VerbosityLevel::Verbose,
            Some("priority"),
            &format!("player {player} passes priority"),
        );

        let everyone = self.players.iter().map(|p| p.id);
        if self.priority.all_passed(everyone) {
            self.advance_step();
            Ok(PassOutcome::StepAdvanced(self.turn.current_step))
        } else {
            let next = self.next_player_after(player);
            self.turn.priority_player = Some(next);
            self.changes.record(StateChange::PriorityChanged { player: Some(next) });
            Ok(PassOutcome::Rotated(next))
        }
    }

    /// Any action other than passing resets the pass sequence
    pub fn note_action_taken(&mut self, player: PlayerId) {
        self.priority.clear();
        if self.turn.priority_player != Some(player) && self.is_registered(player) {
            self.turn.priority_player = Some(player);
            self.changes.record(StateChange::PriorityChanged {
                player: Some(player),
            });
        }
    }

    /// Whether `responder` may respond to `action` right now
    pub fn can_respond_to(&self, action: &Action, responder: PlayerId) -> bool {
        action.is_stack_action()
            && self.is_registered(responder)
            && self.has_priority(responder)
    }

    pub fn priority_info(&self) -> PriorityInfo {
        PriorityInfo {
            active_player: self.turn.active_player,
            priority_player: self.turn.priority_player,
            phase: self.turn.current_phase(),
            step: self.turn.current_step,
            turn_number: self.turn.turn_number,
            passed: self.priority.passed().iter().copied().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CardId;
    use crate::game::RulesConfig;

    fn started() -> GameState {
        let mut state = GameState::new_two_player("Alice", "Bob", RulesConfig::default());
        state.logger.enable_capture();
        state.start_game().unwrap();
        state.set_step(Step::Main1);
        state
    }

    #[test]
    fn test_active_player_starts_with_priority() {
        let state = started();
        let (alice, bob) = (state.players[0].id, state.players[1].id);
        assert!(state.has_priority(alice));
        assert!(!state.has_priority(bob));
    }

    #[test]
    fn test_single_pass_rotates() {
        let mut state = started();
        let (alice, bob) = (state.players[0].id, state.players[1].id);

        let outcome = state.pass_priority(alice).unwrap();
        assert_eq!(outcome, PassOutcome::Rotated(bob));
        assert_eq!(state.current_step(), Step::Main1);
        assert!(!state.has_priority(alice));
        assert!(state.has_priority(bob));
    }

    #[test]
    fn test_two_passes_advance_one_step() {
        let mut state = started();
        let (alice, bob) = (state.players[0].id, state.players[1].id);

        state.pass_priority(alice).unwrap();
        let outcome = state.pass_priority(bob).unwrap();
        assert_eq!(outcome, PassOutcome::StepAdvanced(Step::BeginCombat));
        assert_eq!(state.current_step(), Step::BeginCombat);
        assert!(state.priority.passed().is_empty());
        assert_eq!(state.turn.priority_player, Some(alice));
    }

    #[test]
    fn test_pass_without_priority_rejected() {
        let mut state = started();
        let bob = state.players[1].id;
        let err = state.pass_priority(bob).unwrap_err();
        assert!(matches!(
            err,
            MtgError::IllegalAction {
                stage: LegalityStage::Timing,
                ..
            }
        ));
        assert!(state.priority.passed().is_empty());
    }

    #[test]
    fn test_action_clears_pass_set() {
        let mut state = started();
        let (alice, bob) = (state.players[0].id, state.players[1].id);
        state.pass_priority(alice).unwrap();
        state.note_action_taken(bob);
        assert!(state.priority.passed().is_empty());
        // Alice is active, so she may act again after Bob's action
        assert!(state.has_priority(alice));
    }

    #[test]
    fn test_can_respond_only_to_stack_actions() {
        let state = started();
        let (alice, bob) = (state.players[0].id, state.players[1].id);
        let cast = Action::CastSpell {
            player: bob,
            card: CardId::new(9),
        };
        let land = Action::PlayLand {
            player: bob,
            card: CardId::new(9),
        };
        assert!(state.can_respond_to(&cast, alice));
        assert!(!state.can_respond_to(&land, alice));
        assert!(!state.can_respond_to(&cast, bob));
    }

    #[test]
    fn test_priority_info() {
        let mut state = started();
        let alice = state.players[0].id;
        state.pass_priority(alice).unwrap();
        let info = state.priority_info();
        assert_eq!(info.active_player, alice);
        assert_eq!(info.phase, Phase::PreCombatMain);
        assert_eq!(info.passed, vec![alice]);
        assert_eq!(info.turn_number, 1);
    }
}
