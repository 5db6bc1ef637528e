//! Turn structure: the five phases and their twelve steps

use crate::core::PlayerId;
use crate::MtgError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Beginning,
    PreCombatMain,
    Combat,
    PostCombatMain,
    Ending,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Beginning => "beginning",
            Phase::PreCombatMain => "precombat main",
            Phase::Combat => "combat",
            Phase::PostCombatMain => "postcombat main",
            Phase::Ending => "ending",
        })
    }
}

/// Step of a turn, in turn order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Untap,
    Upkeep,
    Draw,
    Main1,
    BeginCombat,
    DeclareAttackers,
    DeclareBlockers,
    CombatDamage,
    EndCombat,
    Main2,
    End,
    Cleanup,
}

impl Step {
    pub const ALL: [Step; 12] = [
        Step::Untap,
        Step::Upkeep,
        Step::Draw,
        Step::Main1,
        Step::BeginCombat,
        Step::DeclareAttackers,
        Step::DeclareBlockers,
        Step::CombatDamage,
        Step::EndCombat,
        Step::Main2,
        Step::End,
        Step::Cleanup,
    ];

    /// Event-stream name, e.g. "declare_attackers"
    pub fn name(self) -> &'static str {
        match self {
            Step::Untap => "untap",
            Step::Upkeep => "upkeep",
            Step::Draw => "draw",
            Step::Main1 => "main1",
            Step::BeginCombat => "begin_combat",
            Step::DeclareAttackers => "declare_attackers",
            Step::DeclareBlockers => "declare_blockers",
            Step::CombatDamage => "combat_damage",
            Step::EndCombat => "end_combat",
            Step::Main2 => "main2",
            Step::End => "end",
            Step::Cleanup => "cleanup",
        }
    }

    pub fn phase(self) -> Phase {
        match self {
            Step::Untap | Step::Upkeep | Step::Draw => Phase::Beginning,
            Step::Main1 => Phase::PreCombatMain,
            Step::Main2 => Phase::PostCombatMain,
            Step::End | Step::Cleanup => Phase::Ending,
            _ => Phase::Combat,
        }
    }

    /// The following step, or `None` after Cleanup
    pub fn next(self) -> Option<Step> {
        Step::ALL.get(self as usize + 1).copied()
    }

    pub fn is_main(self) -> bool {
        matches!(self, Step::Main1 | Step::Main2)
    }

    /// Sorceries, creatures and lands are limited to main phases
    pub fn is_sorcery_speed(self) -> bool {
        self.is_main()
    }

    /// Nobody receives priority during Untap or (normally) Cleanup
    pub fn grants_priority(self) -> bool {
        !matches!(self, Step::Untap | Step::Cleanup)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Step {
    type Err = MtgError;

    /// Lenient: case, spaces and underscores are ignored, and the long
    /// names clients use ("end of turn", "precombat main") are accepted
    fn from_str(s: &str) -> crate::Result<Self> {
        let key: String = s
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .map(|c| c.to_ascii_lowercase())
            .collect();
        let alias = match key.as_str() {
            "main" | "precombatmain" => Some(Step::Main1),
            "postcombatmain" => Some(Step::Main2),
            "beginningofcombat" => Some(Step::BeginCombat),
            "endofcombat" => Some(Step::EndCombat),
            "endofturn" | "endstep" => Some(Step::End),
            _ => None,
        };
        alias
            .or_else(|| {
                Step::ALL
                    .into_iter()
                    .find(|step| step.name().replace('_', "") == key)
            })
            .ok_or_else(|| MtgError::ParseError(format!("unknown step '{s}'")))
    }
}

/// Whose turn it is, which step, and who holds priority
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnStructure {
    /// Starts at 1
    pub turn_number: u32,
    pub current_step: Step,
    pub active_player: PlayerId,
    pub priority_player: Option<PlayerId>,
}

impl TurnStructure {
    pub fn new(starting_player: PlayerId) -> Self {
        TurnStructure {
            turn_number: 1,
            current_step: Step::Untap,
            active_player: starting_player,
            priority_player: None,
        }
    }

    pub fn current_phase(&self) -> Phase {
        self.current_step.phase()
    }

    /// Move to the next step; returns false at Cleanup, where the turn ends
    pub fn advance_step(&mut self) -> bool {
        match self.current_step.next() {
            Some(step) => {
                self.current_step = step;
                true
            }
            None => false,
        }
    }

    pub fn next_turn(&mut self, next_player: PlayerId) {
        self.turn_number += 1;
        self.current_step = Step::Untap;
        self.active_player = next_player;
        self.priority_player = Some(next_player);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_follows_all() {
        for pair in Step::ALL.windows(2) {
            assert_eq!(pair[0].next(), Some(pair[1]));
        }
        assert_eq!(Step::Cleanup.next(), None);
        assert_eq!(Step::CombatDamage.phase(), Phase::Combat);
        assert_eq!(Step::Main2.phase(), Phase::PostCombatMain);
    }

    #[test]
    fn test_turn_wraps_at_cleanup() {
        let alice = PlayerId::new(1);
        let mut turn = TurnStructure::new(alice);
        let mut advanced = 0;
        while turn.advance_step() {
            advanced += 1;
        }
        assert_eq!(advanced, 11);
        assert_eq!(turn.current_step, Step::Cleanup);

        let bob = PlayerId::new(2);
        turn.next_turn(bob);
        assert_eq!(turn.turn_number, 2);
        assert_eq!(turn.current_step, Step::Untap);
        assert_eq!(turn.priority_player, Some(bob));
    }

    #[test]
    fn test_step_names_parse_leniently() {
        assert_eq!("Main1".parse::<Step>().unwrap(), Step::Main1);
        assert_eq!("declare_attackers".parse::<Step>().unwrap(), Step::DeclareAttackers);
        assert_eq!("Combat Damage".parse::<Step>().unwrap(), Step::CombatDamage);
        assert_eq!("end of turn".parse::<Step>().unwrap(), Step::End);
        assert!(matches!("lunch".parse::<Step>(), Err(MtgError::ParseError(_))));
        for step in Step::ALL {
            assert_eq!(step.to_string().parse::<Step>().unwrap(), step);
        }
    }

    #[test]
    fn test_serde_uses_event_names() {
        let json = serde_json::to_string(&Step::DeclareBlockers).unwrap();
        assert_eq!(json, "\"declare_blockers\"");
    }
}
