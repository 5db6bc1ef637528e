//! Player actions and their effect on the match state

use crate::core::{AbilityId, CardId, ManaCost, PlayerId};
use crate::game::{mana_payment, GameState, VerbosityLevel};
use crate::zones::Zone;
use crate::{MtgError, Result};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Actions a player can take
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Play a land from hand
    PlayLand { player: PlayerId, card: CardId },

    /// Cast a spell from hand
    CastSpell { player: PlayerId, card: CardId },

    /// Activate an ability of a permanent
    ActivateAbility {
        player: PlayerId,
        source: CardId,
        ability: AbilityId,
    },

    DeclareAttackers {
        player: PlayerId,
        attackers: SmallVec<[CardId; 4]>,
    },

    /// (blocker, attacker) pairs
    DeclareBlockers {
        player: PlayerId,
        blocks: SmallVec<[(CardId, CardId); 2]>,
    },

    /// Assign a creature's combat damage
    AssignDamage { player: PlayerId, source: CardId },

    PassPriority { player: PlayerId },

    Concede { player: PlayerId },
}

/// Action category, used for summaries and timing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ActionKind {
    PlayLand,
    CastSpell,
    ActivateAbility,
    DeclareAttackers,
    DeclareBlockers,
    AssignDamage,
    PassPriority,
    Concede,
}

/// When an action may be taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionTiming {
    /// Main phase, active player, empty stack (unless the card says otherwise)
    MainPhase,
    /// Whenever the player holds priority
    AnyTime,
    DeclareAttackers,
    DeclareBlockers,
    CombatDamage,
    /// No priority needed
    Always,
}

impl Action {
    pub fn player(&self) -> PlayerId {
        match self {
            Action::PlayLand { player, .. }
            | Action::CastSpell { player, .. }
            | Action::ActivateAbility { player, .. }
            | Action::DeclareAttackers { player, .. }
            | Action::DeclareBlockers { player, .. }
            | Action::AssignDamage { player, .. }
            | Action::PassPriority { player }
            | Action::Concede { player } => *player,
        }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Action::PlayLand { .. } => ActionKind::PlayLand,
            Action::CastSpell { .. } => ActionKind::CastSpell,
            Action::ActivateAbility { .. } => ActionKind::ActivateAbility,
            Action::DeclareAttackers { .. } => ActionKind::DeclareAttackers,
            Action::DeclareBlockers { .. } => ActionKind::DeclareBlockers,
            Action::AssignDamage { .. } => ActionKind::AssignDamage,
            Action::PassPriority { .. } => ActionKind::PassPriority,
            Action::Concede { .. } => ActionKind::Concede,
        }
    }

    /// Base timing of the action; casting speed is refined per card
    pub fn timing(&self) -> ActionTiming {
        match self {
            Action::PlayLand { .. } => ActionTiming::MainPhase,
            Action::CastSpell { .. } | Action::ActivateAbility { .. } => ActionTiming::AnyTime,
            Action::DeclareAttackers { .. } => ActionTiming::DeclareAttackers,
            Action::DeclareBlockers { .. } => ActionTiming::DeclareBlockers,
            Action::AssignDamage { .. } => ActionTiming::CombatDamage,
            Action::PassPriority { .. } => ActionTiming::AnyTime,
            Action::Concede { .. } => ActionTiming::Always,
        }
    }

    /// Actions that use the stack (and can therefore be responded to)
    pub fn is_stack_action(&self) -> bool {
        matches!(
            self,
            Action::CastSpell { .. } | Action::ActivateAbility { .. }
        )
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::PlayLand { player, card } => write!(f, "P{player} plays land {card}"),
            Action::CastSpell { player, card } => write!(f, "P{player} casts {card}"),
            Action::ActivateAbility {
                player,
                source,
                ability,
            } => write!(f, "P{player} activates {ability} of {source}"),
            Action::DeclareAttackers { player, attackers } => {
                let ids: Vec<String> = attackers.iter().map(|c| c.to_string()).collect();
                write!(f, "P{player} attacks with [{}]", ids.join(", "))
            }
            Action::DeclareBlockers { player, blocks } => {
                let pairs: Vec<String> = blocks.iter().map(|(b, a)| format!("{b}->{a}")).collect();
                write!(f, "P{player} blocks [{}]", pairs.join(", "))
            }
            Action::AssignDamage { player, source } => {
                write!(f, "P{player} assigns damage from {source}")
            }
            Action::PassPriority { player } => write!(f, "P{player} passes priority"),
            Action::Concede { player } => write!(f, "P{player} concedes"),
        }
    }
}

impl GameState {
    /// Carry out an action that has already been checked for legality
    ///
    /// Anything that could fail after payment is checked before the cost is
    /// paid, so a rejected action leaves the state unchanged.
    pub fn perform_action(&mut self, action: &Action) -> Result<()> {
        self.logger.log(
            VerbosityLevel::Normal,
            Some("action"),
            &action.to_string(),
        );
        match action {
            Action::PlayLand { player, card } => {
                self.move_card(*card, Zone::Battlefield)?;
                self.mark_land_played(*player)?;
                self.note_action_taken(*player);
            }
            Action::CastSpell { player, card } => {
                let cost = ManaCost::parse(&self.card(*card)?.mana_cost)?;
                self.check_move(*card, Zone::Stack, true)?;
                let record = mana_payment::pay(self, *player, &cost)?;
                self.move_card(*card, Zone::Stack)?;
                self.record_spend(record);
                self.note_action_taken(*player);
            }
            Action::ActivateAbility {
                player,
                source,
                ability,
            } => {
                let card = self.card(*source)?;
                let found = card.ability(ability).ok_or_else(|| {
                    MtgError::InvalidAction(format!("{} has no ability {ability}", card.name))
                })?;
                let requires_tap = found.requires_tap;
                let cost = ManaCost::parse(&found.cost)?;
                if requires_tap {
                    self.permanent(*source)?;
                }
                let record = mana_payment::pay(self, *player, &cost)?;
                if requires_tap {
                    self.set_tapped(*source, true)?;
                }
                self.record_spend(record);
                self.mark_ability_used(*player, *source, ability)?;
                self.push_ability(*source, ability.clone(), *player)?;
                self.note_action_taken(*player);
            }
            Action::DeclareAttackers { player, attackers } => {
                for &attacker in attackers {
                    self.set_tapped(attacker, true)?;
                    self.declare_attacker(attacker)?;
                }
                self.note_action_taken(*player);
            }
            Action::DeclareBlockers { player, blocks } => {
                for &(blocker, attacker) in blocks {
                    self.declare_blocker(blocker, attacker)?;
                }
                self.note_action_taken(*player);
            }
            Action::AssignDamage { player, source } => {
                self.assign_combat_damage(*source)?;
                self.note_action_taken(*player);
            }
            Action::PassPriority { player } => {
                self.pass_priority(*player)?;
            }
            Action::Concede { player } => {
                self.concede(*player)?;
            }
        }
        Ok(())
    }

    /// An unblocked attacker deals its power to the defending player
    fn assign_combat_damage(&mut self, source: CardId) -> Result<()> {
        let card = self.card(source)?;
        let power = card.current_power();
        let controller = card.controller;
        let attacking = card.attacking;
        self.get_player_mut(controller)?
            .flags
            .damage_assigned
            .insert(source);
        if !attacking || power <= 0 {
            return Ok(());
        }
        let blocked = self
            .cards
            .iter()
            .any(|(_, c)| c.blocking == Some(source));
        if blocked {
            return Ok(());
        }
        if let Some(defender) = self.opponent_of(controller) {
            self.change_life(defender, -power)?;
        }
        Ok(())
    }
}
