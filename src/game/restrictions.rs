//! Card restriction rules
//!
//! Stateless predicates over a card, a player and the match. Each returns
//! `Ok(())` when the rule allows the action, or an `IllegalAction` at the
//! restriction stage naming the rule. Missing metadata is permissive: a card
//! with no types or tags is only subject to the rules that apply to everyone.

use crate::core::{AbilityId, Capability, Card, CardId, PlayerId};
use crate::error::LegalityStage;
use crate::game::GameState;
use crate::zones::Zone;
use crate::{MtgError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rules that can restrict what a card does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Restriction {
    LandPerTurn,
    MaxHandSize,
    LegendRule,
    PlaneswalkerUniqueness,
    SummoningSickness,
    CantAttack,
    CantBlock,
}

impl fmt::Display for Restriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Restriction::LandPerTurn => "one land per turn",
            Restriction::MaxHandSize => "maximum hand size",
            Restriction::LegendRule => "legend rule",
            Restriction::PlaneswalkerUniqueness => "planeswalker uniqueness",
            Restriction::SummoningSickness => "summoning sickness",
            Restriction::CantAttack => "can't attack",
            Restriction::CantBlock => "can't block",
        };
        write!(f, "{name}")
    }
}

/// Rules that apply to a card
pub fn restrictions_for(card: &Card) -> Vec<Restriction> {
    let mut rules = vec![Restriction::MaxHandSize];
    if card.is_land() {
        rules.push(Restriction::LandPerTurn);
    }
    if card.is_legendary() {
        rules.push(Restriction::LegendRule);
    }
    if card.is_planeswalker() {
        rules.push(Restriction::PlaneswalkerUniqueness);
    }
    if card.is_creature() && !card.has_capability(Capability::Haste) {
        rules.push(Restriction::SummoningSickness);
    }
    if card.has_capability(Capability::Defender) || card.has_capability(Capability::CantAttack) {
        rules.push(Restriction::CantAttack);
    }
    if card.has_capability(Capability::CantBlock) {
        rules.push(Restriction::CantBlock);
    }
    rules
}

fn restricted(rule: Restriction, reason: String) -> MtgError {
    MtgError::illegal(LegalityStage::Restriction, format!("{rule}: {reason}"))
}

pub fn check_land_per_turn(state: &GameState, player: PlayerId) -> Result<()> {
    let p = state.get_player(player)?;
    if p.flags.lands_played >= state.config.lands_per_turn {
        return Err(restricted(
            Restriction::LandPerTurn,
            format!("{} already played a land this turn", p.name),
        ));
    }
    Ok(())
}

/// A card may only be put into a hand that is below its maximum size
pub fn check_hand_space(state: &GameState, player: PlayerId) -> Result<()> {
    let p = state.get_player(player)?;
    if p.hand_is_full() {
        return Err(restricted(
            Restriction::MaxHandSize,
            format!("{} already holds {} cards", p.name, p.hand_size()),
        ));
    }
    Ok(())
}

/// Same-name rule shared by legends and planeswalkers
fn conflicts_with(card: &Card, other: &Card) -> Option<Restriction> {
    if card.id == other.id || card.name != other.name {
        return None;
    }
    if card.is_legendary() && other.is_legendary() {
        Some(Restriction::LegendRule)
    } else if card.is_planeswalker() && other.is_planeswalker() {
        Some(Restriction::PlaneswalkerUniqueness)
    } else {
        None
    }
}

/// Legend rule and planeswalker uniqueness for `card` entering under `controller`
pub fn check_uniqueness(state: &GameState, card: &Card, controller: PlayerId) -> Result<()> {
    for other in state.battlefield_cards(controller) {
        if let Some(rule) = conflicts_with(card, other) {
            return Err(restricted(
                rule,
                format!("player {controller} already controls {}", other.name),
            ));
        }
    }
    Ok(())
}

/// Pairs of same-name permanents that break uniqueness, as (older, newer)
///
/// Only reachable by applying external events; the public mutators reject
/// such entries outright.
pub fn uniqueness_conflicts(state: &GameState, controller: PlayerId) -> Vec<(CardId, CardId)> {
    let cards: Vec<&Card> = state.battlefield_cards(controller).collect();
    let mut conflicts = Vec::new();
    for (i, &newer) in cards.iter().enumerate() {
        let older = cards[..i]
            .iter()
            .copied()
            .find(|older| conflicts_with(newer, older).is_some());
        if let Some(older) = older {
            let entered = |c: &Card| c.entered_battlefield_turn.unwrap_or(0);
            // Ties keep battlefield order
            let pair = if entered(newer) < entered(older) {
                (newer.id, older.id)
            } else {
                (older.id, newer.id)
            };
            conflicts.push(pair);
        }
    }
    conflicts
}

/// Creature that came under its controller's control this turn
pub fn is_summoning_sick(state: &GameState, card: &Card) -> bool {
    state.config.enforce_summoning_sickness
        && card.is_creature()
        && !card.has_capability(Capability::Haste)
        && card.entered_battlefield_turn == Some(state.turn.turn_number)
}

pub fn check_can_attack(state: &GameState, card: &Card) -> Result<()> {
    if !card.is_creature() {
        return Err(MtgError::illegal(
            LegalityStage::Structural,
            format!("{} is not a creature", card.name),
        ));
    }
    if card.tapped {
        return Err(restricted(
            Restriction::CantAttack,
            format!("{} is tapped", card.name),
        ));
    }
    if card.has_capability(Capability::Defender) || card.has_capability(Capability::CantAttack) {
        return Err(restricted(
            Restriction::CantAttack,
            format!("{} can't attack", card.name),
        ));
    }
    if is_summoning_sick(state, card) {
        return Err(restricted(
            Restriction::SummoningSickness,
            format!("{} entered this turn", card.name),
        ));
    }
    Ok(())
}

pub fn check_can_block(blocker: &Card, attacker: &Card) -> Result<()> {
    if !blocker.is_creature() {
        return Err(MtgError::illegal(
            LegalityStage::Structural,
            format!("{} is not a creature", blocker.name),
        ));
    }
    if !attacker.attacking || attacker.zone != Zone::Battlefield {
        return Err(MtgError::illegal(
            LegalityStage::Structural,
            format!("{} is not attacking", attacker.name),
        ));
    }
    if attacker.controller == blocker.controller {
        return Err(MtgError::illegal(
            LegalityStage::Structural,
            format!("{} cannot block its own side", blocker.name),
        ));
    }
    if blocker.tapped {
        return Err(restricted(
            Restriction::CantBlock,
            format!("{} is tapped", blocker.name),
        ));
    }
    if blocker.has_capability(Capability::CantBlock) {
        return Err(restricted(
            Restriction::CantBlock,
            format!("{} can't block", blocker.name),
        ));
    }
    Ok(())
}

/// Once-per-turn use and the tap requirement of an activated ability
pub fn check_can_activate(
    state: &GameState,
    player: PlayerId,
    card: &Card,
    ability: &AbilityId,
) -> Result<()> {
    let found = card.ability(ability).ok_or_else(|| {
        MtgError::illegal(
            LegalityStage::Structural,
            format!("{} has no ability {ability}", card.name),
        )
    })?;
    if state.get_player(player)?.ability_used(card.id, ability) {
        return Err(MtgError::illegal(
            LegalityStage::Restriction,
            format!("{ability} of {} was already used this turn", card.name),
        ));
    }
    if found.requires_tap {
        if card.tapped {
            return Err(MtgError::illegal(
                LegalityStage::Restriction,
                format!("{} is tapped", card.name),
            ));
        }
        if is_summoning_sick(state, card) {
            return Err(restricted(
                Restriction::SummoningSickness,
                format!("{} cannot use tap abilities this turn", card.name),
            ));
        }
    }
    Ok(())
}
