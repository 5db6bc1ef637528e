//! Legal action generation and validation
//!
//! Every proposed action runs through the same stages in order:
//! basic → timing → structural → restriction → resources. The first stage
//! that rejects it decides the `IllegalAction` returned by `check_action`.
//! Generation builds the candidate actions for the current step and keeps
//! the ones that pass all stages.

use crate::core::{AbilityKind, Card, CardId, ManaCost, PlayerId};
use crate::error::LegalityStage;
use crate::game::mana_engine::{pool_summary, PoolSummary};
use crate::game::{
    mana_payment, restrictions, Action, ActionKind, ActionTiming, GameState, MatchStatus,
    PriorityInfo, Step,
};
use crate::zones::Zone;
use crate::{MtgError, Result};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeSet;

fn reject(stage: LegalityStage, reason: impl Into<String>) -> MtgError {
    MtgError::illegal(stage, reason)
}

/// Counts and flags describing a player's legal action set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalitySummary {
    pub player: PlayerId,
    pub total_legal_actions: usize,
    pub action_kinds: BTreeSet<ActionKind>,
    pub can_play_land: bool,
    pub can_cast_spell: bool,
    pub can_activate_ability: bool,
    pub can_attack: bool,
    pub can_block: bool,
    pub priority: PriorityInfo,
    pub mana: Option<PoolSummary>,
}

impl LegalitySummary {
    pub fn new(state: &GameState, player: PlayerId, actions: &[Action]) -> Self {
        let action_kinds: BTreeSet<ActionKind> = actions.iter().map(|a| a.kind()).collect();
        let has = |kind| action_kinds.contains(&kind);
        LegalitySummary {
            player,
            total_legal_actions: actions.len(),
            can_play_land: has(ActionKind::PlayLand),
            can_cast_spell: has(ActionKind::CastSpell),
            can_activate_ability: has(ActionKind::ActivateAbility),
            can_attack: has(ActionKind::DeclareAttackers),
            can_block: has(ActionKind::DeclareBlockers),
            priority: state.priority_info(),
            mana: pool_summary(state, player).ok(),
            action_kinds,
        }
    }
}

impl GameState {
    /// Every action `player` may legally take right now
    pub fn generate_legal_actions(&self, player: PlayerId) -> Vec<Action> {
        let mut candidates = Vec::new();
        let step = self.turn.current_step;

        if step.grants_priority() {
            if step.is_main() {
                self.land_candidates(player, &mut candidates);
            }
            self.cast_candidates(player, &mut candidates);
            self.ability_candidates(player, &mut candidates);
        }
        match step {
            Step::DeclareAttackers => self.attack_candidates(player, &mut candidates),
            Step::DeclareBlockers => self.block_candidates(player, &mut candidates),
            Step::CombatDamage => self.damage_candidates(player, &mut candidates),
            _ => {}
        }
        candidates.push(Action::PassPriority { player });
        candidates.push(Action::Concede { player });

        candidates.retain(|action| self.check_action(action).is_ok());
        candidates
    }

    /// Whether `action` is legal, as a boolean
    pub fn is_legal(&self, action: &Action) -> bool {
        self.check_action(action).is_ok()
    }

    /// Validate an action, reporting the first stage that rejects it
    pub fn check_action(&self, action: &Action) -> Result<()> {
        self.check_basic(action)?;
        self.check_timing(action)?;
        self.check_structure(action)?;
        self.check_restrictions(action)?;
        self.check_resources(action)
    }

    fn land_candidates(&self, player: PlayerId, out: &mut Vec<Action>) {
        out.extend(
            self.hand_cards(player)
                .filter(|c| c.is_land())
                .map(|c| Action::PlayLand { player, card: c.id }),
        );
    }

    fn cast_candidates(&self, player: PlayerId, out: &mut Vec<Action>) {
        out.extend(
            self.hand_cards(player)
                .filter(|c| !c.is_land())
                .map(|c| Action::CastSpell { player, card: c.id }),
        );
    }

    fn ability_candidates(&self, player: PlayerId, out: &mut Vec<Action>) {
        for card in self.battlefield_cards(player) {
            out.extend(card.abilities.iter().map(|a| Action::ActivateAbility {
                player,
                source: card.id,
                ability: a.id.clone(),
            }));
        }
    }

    fn attack_candidates(&self, player: PlayerId, out: &mut Vec<Action>) {
        let eligible: SmallVec<[CardId; 4]> = self
            .battlefield_cards(player)
            .filter(|c| restrictions::check_can_attack(self, c).is_ok())
            .map(|c| c.id)
            .collect();
        out.extend(eligible.iter().map(|&id| Action::DeclareAttackers {
            player,
            attackers: SmallVec::from_slice(&[id]),
        }));
        if eligible.len() > 1 {
            out.push(Action::DeclareAttackers {
                player,
                attackers: eligible,
            });
        }
    }

    fn block_candidates(&self, player: PlayerId, out: &mut Vec<Action>) {
        let attackers: Vec<&Card> = self
            .cards
            .iter()
            .map(|(_, c)| c)
            .filter(|c| c.attacking && c.controller != player)
            .collect();
        for attacker in attackers {
            for blocker in self.battlefield_cards(player) {
                if restrictions::check_can_block(blocker, attacker).is_ok() {
                    out.push(Action::DeclareBlockers {
                        player,
                        blocks: SmallVec::from_slice(&[(blocker.id, attacker.id)]),
                    });
                }
            }
        }
    }

    fn damage_candidates(&self, player: PlayerId, out: &mut Vec<Action>) {
        out.extend(
            self.battlefield_cards(player)
                .filter(|c| c.is_creature() && c.current_power() > 0)
                .map(|c| Action::AssignDamage {
                    player,
                    source: c.id,
                }),
        );
    }

    fn check_basic(&self, action: &Action) -> Result<()> {
        if self.status != MatchStatus::Active {
            return Err(reject(
                LegalityStage::Basic,
                format!("match is {}", self.status),
            ));
        }
        let player = action.player();
        let p = self
            .get_player(player)
            .map_err(|_| reject(LegalityStage::Basic, format!("player {player} is not in this match")))?;
        if !p.is_alive() {
            return Err(reject(
                LegalityStage::Basic,
                format!("{} is no longer in the game", p.name),
            ));
        }
        Ok(())
    }

    /// Card named by an action, as a structural rejection when missing
    fn action_card(&self, id: CardId) -> Result<&Card> {
        self.card(id)
            .map_err(|_| reject(LegalityStage::Structural, format!("card {id} does not exist")))
    }

    /// Main phase, active player, empty stack
    fn sorcery_timing(&self, player: PlayerId, what: &str) -> Result<()> {
        let step = self.turn.current_step;
        if !step.is_sorcery_speed() {
            return Err(reject(
                LegalityStage::Timing,
                format!("{what} only in a main phase, not during {step}"),
            ));
        }
        if player != self.turn.active_player {
            return Err(reject(
                LegalityStage::Timing,
                format!("{what} only on your own turn"),
            ));
        }
        if !self.stack_is_empty() {
            return Err(reject(
                LegalityStage::Timing,
                format!("{what} only with an empty stack"),
            ));
        }
        Ok(())
    }

    fn require_priority(&self, player: PlayerId) -> Result<()> {
        if !self.has_priority(player) {
            return Err(reject(
                LegalityStage::Timing,
                format!("player {player} does not have priority"),
            ));
        }
        Ok(())
    }

    fn require_step(&self, step: Step) -> Result<()> {
        if self.turn.current_step != step {
            return Err(reject(
                LegalityStage::Timing,
                format!("only during {step}, not {}", self.turn.current_step),
            ));
        }
        Ok(())
    }

    /// Timing window of the action kind, then the card's own casting speed
    fn check_timing(&self, action: &Action) -> Result<()> {
        let player = action.player();
        let active = self.turn.active_player;
        match action.timing() {
            ActionTiming::Always => Ok(()),
            ActionTiming::MainPhase => {
                self.require_priority(player)?;
                self.sorcery_timing(player, "lands can be played")
            }
            ActionTiming::AnyTime => {
                self.require_priority(player)?;
                self.check_speed(action)
            }
            ActionTiming::DeclareAttackers => {
                self.require_step(Step::DeclareAttackers)?;
                if player != active {
                    return Err(reject(
                        LegalityStage::Timing,
                        "only the active player declares attackers",
                    ));
                }
                Ok(())
            }
            ActionTiming::DeclareBlockers => {
                self.require_step(Step::DeclareBlockers)?;
                if player == active {
                    return Err(reject(
                        LegalityStage::Timing,
                        "the active player cannot declare blockers",
                    ));
                }
                Ok(())
            }
            ActionTiming::CombatDamage => self.require_step(Step::CombatDamage),
        }
    }

    /// Non-instant spells and loyalty abilities are limited to sorcery speed
    fn check_speed(&self, action: &Action) -> Result<()> {
        match action {
            Action::CastSpell { player, card } => {
                let card = self.action_card(*card)?;
                if card.has_instant_speed() {
                    Ok(())
                } else {
                    self.sorcery_timing(*player, &format!("{} can be cast", card.name))
                }
            }
            Action::ActivateAbility {
                player,
                source,
                ability,
            } => {
                let card = self.action_card(*source)?;
                match card.ability(ability) {
                    Some(a) if a.kind == AbilityKind::Loyalty => {
                        self.sorcery_timing(*player, "loyalty abilities can be activated")
                    }
                    _ => Ok(()),
                }
            }
            _ => Ok(()),
        }
    }

    /// Card is on the battlefield under `player`'s control
    fn controlled_permanent(&self, player: PlayerId, id: CardId) -> Result<&Card> {
        let card = self.action_card(id)?;
        if card.zone != Zone::Battlefield {
            return Err(reject(
                LegalityStage::Structural,
                format!("{} is not on the battlefield", card.name),
            ));
        }
        if card.controller != player {
            return Err(reject(
                LegalityStage::Structural,
                format!("{} is not controlled by player {player}", card.name),
            ));
        }
        Ok(card)
    }

    /// Card is in `player`'s own hand
    fn card_in_hand(&self, player: PlayerId, id: CardId) -> Result<&Card> {
        let card = self.action_card(id)?;
        let held = self
            .get_player(player)
            .is_ok_and(|p| p.zones.hand.contains(id));
        if card.owner != player || card.zone != Zone::Hand || !held {
            return Err(reject(
                LegalityStage::Structural,
                format!("{} is not in player {player}'s hand", card.name),
            ));
        }
        Ok(card)
    }

    fn check_structure(&self, action: &Action) -> Result<()> {
        match action {
            Action::PlayLand { player, card } => {
                let card = self.card_in_hand(*player, *card)?;
                if !card.is_land() {
                    return Err(reject(
                        LegalityStage::Structural,
                        format!("{} is not a land", card.name),
                    ));
                }
            }
            Action::CastSpell { player, card } => {
                let card = self.card_in_hand(*player, *card)?;
                if card.is_land() {
                    return Err(reject(
                        LegalityStage::Structural,
                        format!("{} is a land and cannot be cast", card.name),
                    ));
                }
            }
            Action::ActivateAbility {
                player,
                source,
                ability,
            } => {
                let card = self.controlled_permanent(*player, *source)?;
                if card.ability(ability).is_none() {
                    return Err(reject(
                        LegalityStage::Structural,
                        format!("{} has no ability {ability}", card.name),
                    ));
                }
            }
            Action::DeclareAttackers { player, attackers } => {
                if attackers.is_empty() {
                    return Err(reject(LegalityStage::Structural, "no attackers declared"));
                }
                if self.get_player(*player)?.flags.attacked {
                    return Err(reject(
                        LegalityStage::Structural,
                        "attackers were already declared this turn",
                    ));
                }
                let mut seen = BTreeSet::new();
                for &id in attackers {
                    if !seen.insert(id) {
                        return Err(reject(
                            LegalityStage::Structural,
                            format!("card {id} is declared twice"),
                        ));
                    }
                    let card = self.controlled_permanent(*player, id)?;
                    if !card.is_creature() {
                        return Err(reject(
                            LegalityStage::Structural,
                            format!("{} is not a creature", card.name),
                        ));
                    }
                }
            }
            Action::DeclareBlockers { player, blocks } => {
                if blocks.is_empty() {
                    return Err(reject(LegalityStage::Structural, "no blockers declared"));
                }
                let mut seen = BTreeSet::new();
                for &(blocker, attacker) in blocks {
                    if !seen.insert(blocker) {
                        return Err(reject(
                            LegalityStage::Structural,
                            format!("card {blocker} blocks twice"),
                        ));
                    }
                    let card = self.controlled_permanent(*player, blocker)?;
                    if card.blocking.is_some() {
                        return Err(reject(
                            LegalityStage::Structural,
                            format!("{} is already blocking", card.name),
                        ));
                    }
                    self.action_card(attacker)?;
                }
            }
            Action::AssignDamage { player, source } => {
                let card = self.controlled_permanent(*player, *source)?;
                if !card.is_creature() || card.current_power() <= 0 {
                    return Err(reject(
                        LegalityStage::Structural,
                        format!("{} has no combat damage to assign", card.name),
                    ));
                }
                if self
                    .get_player(*player)?
                    .flags
                    .damage_assigned
                    .contains(source)
                {
                    return Err(reject(
                        LegalityStage::Structural,
                        format!("{} already assigned its damage", card.name),
                    ));
                }
            }
            Action::PassPriority { .. } | Action::Concede { .. } => {}
        }
        Ok(())
    }

    fn check_restrictions(&self, action: &Action) -> Result<()> {
        match action {
            Action::PlayLand { player, card } => {
                restrictions::check_land_per_turn(self, *player)?;
                restrictions::check_uniqueness(self, self.card(*card)?, *player)
            }
            Action::CastSpell { player, card } => {
                let card = self.card(*card)?;
                if card.is_permanent() {
                    restrictions::check_uniqueness(self, card, *player)?;
                }
                Ok(())
            }
            Action::ActivateAbility {
                player,
                source,
                ability,
            } => restrictions::check_can_activate(self, *player, self.card(*source)?, ability),
            Action::DeclareAttackers { attackers, .. } => attackers
                .iter()
                .try_for_each(|&id| restrictions::check_can_attack(self, self.card(id)?)),
            Action::DeclareBlockers { blocks, .. } => {
                blocks.iter().try_for_each(|&(blocker, attacker)| {
                    restrictions::check_can_block(self.card(blocker)?, self.card(attacker)?)
                })
            }
            Action::AssignDamage { .. } | Action::PassPriority { .. } | Action::Concede { .. } => {
                Ok(())
            }
        }
    }

    fn check_resources(&self, action: &Action) -> Result<()> {
        let (player, cost_expr, name) = match action {
            Action::CastSpell { player, card } => {
                let card = self.card(*card)?;
                (*player, card.mana_cost.as_str(), card.name.as_str())
            }
            Action::ActivateAbility {
                player,
                source,
                ability,
            } => {
                let card = self.card(*source)?;
                let cost = card.ability(ability).map(|a| a.cost.as_str()).unwrap_or("");
                (*player, cost, card.name.as_str())
            }
            _ => return Ok(()),
        };
        let cost = ManaCost::parse(cost_expr).map_err(|e| {
            reject(
                LegalityStage::Resources,
                format!("{name} has an unreadable cost: {e}"),
            )
        })?;
        let p = self.get_player(player)?;
        mana_payment::simulate(&cost, &p.mana_pool, p.life, p.energy())
            .map(|_| ())
            .map_err(|e| reject(LegalityStage::Resources, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Ability, CardType, Color, Supertype};
    use crate::game::RulesConfig;

    fn started() -> (GameState, PlayerId, PlayerId) {
        let mut state = GameState::new_two_player("Alice", "Bob", RulesConfig::default());
        state.logger.enable_capture();
        state.start_game().unwrap();
        state.set_step(Step::Main1);
        let (alice, bob) = (state.players[0].id, state.players[1].id);
        (state, alice, bob)
    }

    fn forest(owner: PlayerId) -> Card {
        Card::new(CardId::new(0), "Forest", owner)
            .with_types(&[CardType::Land])
            .with_supertype(Supertype::Basic)
            .with_subtype("Forest")
    }

    fn bear(owner: PlayerId) -> Card {
        Card::new(CardId::new(0), "Grizzly Bears", owner)
            .with_types(&[CardType::Creature])
            .with_cost("{1}{G}")
            .with_stats(2, 2)
    }

    fn count(actions: &[Action], kind: ActionKind) -> usize {
        actions.iter().filter(|a| a.kind() == kind).count()
    }

    #[test]
    fn test_one_play_land_per_land_in_hand() {
        let (mut state, alice, _) = started();
        state.add_card(forest(alice), Zone::Hand).unwrap();
        state.add_card(forest(alice), Zone::Hand).unwrap();

        let actions = state.generate_legal_actions(alice);
        assert_eq!(count(&actions, ActionKind::PlayLand), 2);
        assert_eq!(count(&actions, ActionKind::PassPriority), 1);
        assert_eq!(count(&actions, ActionKind::Concede), 1);

        state.mark_land_played(alice).unwrap();
        let actions = state.generate_legal_actions(alice);
        assert_eq!(count(&actions, ActionKind::PlayLand), 0);
    }

    #[test]
    fn test_sorcery_speed_spell_needs_empty_stack_and_own_turn() {
        let (mut state, alice, bob) = started();
        let bears = state.add_card(bear(alice), Zone::Hand).unwrap();
        state.add_mana(alice, Color::Green, 2).unwrap();
        let cast = Action::CastSpell {
            player: alice,
            card: bears,
        };
        assert!(state.is_legal(&cast));

        state.set_step(Step::Upkeep);
        let err = state.check_action(&cast).unwrap_err();
        assert!(matches!(
            err,
            MtgError::IllegalAction {
                stage: LegalityStage::Timing,
                ..
            }
        ));

        // Bob has no priority on Alice's turn until she passes
        let bob_bears = state.add_card(bear(bob), Zone::Hand).unwrap();
        state.set_step(Step::Main1);
        let bob_cast = Action::CastSpell {
            player: bob,
            card: bob_bears,
        };
        assert!(!state.is_legal(&bob_cast));
    }

    #[test]
    fn test_instant_castable_with_priority_outside_main() {
        let (mut state, alice, _) = started();
        let bolt = Card::new(CardId::new(0), "Lightning Bolt", alice)
            .with_types(&[CardType::Instant])
            .with_cost("{R}");
        let bolt = state.add_card(bolt, Zone::Hand).unwrap();
        state.set_step(Step::Upkeep);

        let cast = Action::CastSpell {
            player: alice,
            card: bolt,
        };
        let err = state.check_action(&cast).unwrap_err();
        assert!(matches!(
            err,
            MtgError::IllegalAction {
                stage: LegalityStage::Resources,
                ..
            }
        ));

        state.add_mana(alice, Color::Red, 1).unwrap();
        assert!(state.generate_legal_actions(alice).contains(&cast));
    }

    #[test]
    fn test_basic_stage_rejects_inactive_match() {
        let mut state = GameState::new_two_player("Alice", "Bob", RulesConfig::default());
        let alice = state.players[0].id;
        let pass = Action::PassPriority { player: alice };
        let err = state.check_action(&pass).unwrap_err();
        assert!(matches!(
            err,
            MtgError::IllegalAction {
                stage: LegalityStage::Basic,
                ..
            }
        ));
        assert!(state.generate_legal_actions(alice).is_empty());

        state.start_game().unwrap();
        let stranger = Action::Concede {
            player: PlayerId::new(42),
        };
        assert!(!state.is_legal(&stranger));
    }

    #[test]
    fn test_attack_declarations() {
        let (mut state, alice, _) = started();
        state.config.enforce_summoning_sickness = false;
        let a = state.add_card(bear(alice), Zone::Battlefield).unwrap();
        let b = state.add_card(bear(alice), Zone::Battlefield).unwrap();
        let wall = bear(alice).with_keyword("Defender");
        state.add_card(wall, Zone::Battlefield).unwrap();
        state.set_step(Step::DeclareAttackers);

        let attacks: Vec<Action> = state
            .generate_legal_actions(alice)
            .into_iter()
            .filter(|a| a.kind() == ActionKind::DeclareAttackers)
            .collect();
        // One per eligible creature plus the all-in declaration
        assert_eq!(attacks.len(), 3);
        assert!(attacks.contains(&Action::DeclareAttackers {
            player: alice,
            attackers: SmallVec::from_slice(&[a, b]),
        }));

        state.set_tapped(a, true).unwrap();
        let attack = Action::DeclareAttackers {
            player: alice,
            attackers: SmallVec::from_slice(&[a]),
        };
        assert!(!state.is_legal(&attack));
    }

    #[test]
    fn test_block_pairs_for_defending_player() {
        let (mut state, alice, bob) = started();
        state.config.enforce_summoning_sickness = false;
        let attacker = state.add_card(bear(alice), Zone::Battlefield).unwrap();
        state.add_card(bear(bob), Zone::Battlefield).unwrap();
        state.add_card(bear(bob), Zone::Battlefield).unwrap();
        state.set_step(Step::DeclareAttackers);
        state
            .perform_action(&Action::DeclareAttackers {
                player: alice,
                attackers: SmallVec::from_slice(&[attacker]),
            })
            .unwrap();
        state.set_step(Step::DeclareBlockers);

        let actions = state.generate_legal_actions(bob);
        assert_eq!(count(&actions, ActionKind::DeclareBlockers), 2);
        assert_eq!(
            count(&state.generate_legal_actions(alice), ActionKind::DeclareBlockers),
            0
        );
    }

    #[test]
    fn test_ability_used_once_per_turn() {
        let (mut state, alice, _) = started();
        let relic = Card::new(CardId::new(0), "Relic", alice)
            .with_types(&[CardType::Artifact])
            .with_ability(Ability::new("scry", "{1}", false));
        let relic = state.add_card(relic, Zone::Battlefield).unwrap();
        state.add_mana(alice, Color::Colorless, 2).unwrap();

        let activate = Action::ActivateAbility {
            player: alice,
            source: relic,
            ability: "scry".into(),
        };
        assert!(state.is_legal(&activate));
        state.perform_action(&activate).unwrap();
        assert_eq!(state.stack.len(), 1);
        let err = state.check_action(&activate).unwrap_err();
        assert!(matches!(
            err,
            MtgError::IllegalAction {
                stage: LegalityStage::Restriction,
                ..
            }
        ));
    }

    #[test]
    fn test_summary_flags() {
        let (mut state, alice, _) = started();
        state.add_card(forest(alice), Zone::Hand).unwrap();
        let actions = state.generate_legal_actions(alice);
        let summary = LegalitySummary::new(&state, alice, &actions);
        assert!(summary.can_play_land);
        assert!(!summary.can_cast_spell);
        assert_eq!(summary.total_legal_actions, actions.len());
        assert!(summary.mana.is_some());
    }
}
