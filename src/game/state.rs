//! Main match state structure
//!
//! All mutation goes through the named transitions below. Each one either
//! applies completely and records a `StateChange`, or returns an error and
//! leaves the state untouched.

use crate::core::{
    AbilityId, Card, CardId, Color, EntityId, EntityStore, ManaPool, Player, PlayerCounter,
    PlayerId, PlayerName, Visibility,
};
use crate::game::restrictions;
use crate::game::{GameLogger, PriorityTracker, RulesConfig, Step, TurnStructure, VerbosityLevel};
use crate::history::{ChangeLog, StateChange, TurnFlag};
use crate::zones::Zone;
use crate::{MtgError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Lifecycle status of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MatchStatus {
    #[default]
    Waiting,
    Starting,
    Active,
    Ended,
    Paused,
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MatchStatus::Waiting => "waiting",
            MatchStatus::Starting => "starting",
            MatchStatus::Active => "active",
            MatchStatus::Ended => "ended",
            MatchStatus::Paused => "paused",
        };
        write!(f, "{name}")
    }
}

/// What a stack entry represents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StackItem {
    Spell,
    Ability(AbilityId),
}

/// An object on the stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackObject {
    pub source: CardId,
    pub controller: PlayerId,
    pub item: StackItem,
}

/// One recorded payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendRecord {
    pub player: PlayerId,
    pub turn: u32,
    pub step: Step,
    pub cost: String,
    /// Mana taken out of the pool
    pub mana: ManaPool,
    pub life: u32,
    pub energy: u32,
}

/// Problems found by `GameState::validate`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationIssue {
    DuplicateCard { card: CardId },
    UnknownCard { card: CardId },
    ZoneMismatch { card: CardId, recorded: Zone },
    HandOverMax { player: PlayerId, size: usize, max: usize },
    UnknownActivePlayer { player: PlayerId },
    UnknownPriorityPlayer { player: PlayerId },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::DuplicateCard { card } => {
                write!(f, "card {card} appears in more than one zone slot")
            }
            ValidationIssue::UnknownCard { card } => {
                write!(f, "zone holds card {card} which does not exist")
            }
            ValidationIssue::ZoneMismatch { card, recorded } => {
                write!(f, "card {card} is recorded in {recorded} but not held there")
            }
            ValidationIssue::HandOverMax { player, size, max } => {
                write!(f, "player {player} holds {size} cards (max {max})")
            }
            ValidationIssue::UnknownActivePlayer { player } => {
                write!(f, "active player {player} is not registered")
            }
            ValidationIssue::UnknownPriorityPlayer { player } => {
                write!(f, "priority player {player} is not registered")
            }
        }
    }
}

/// Complete match state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// All cards in the match
    pub cards: EntityStore<Card>,

    /// Players in seat order
    pub players: Vec<Player>,

    pub turn: TurnStructure,

    pub status: MatchStatus,

    /// The stack, bottom first
    pub stack: Vec<StackObject>,

    pub priority: PriorityTracker,

    pub config: RulesConfig,

    pub winner: Option<PlayerId>,

    /// Entity ID generator shared by players and cards
    next_entity_id: u32,

    /// Transitions since the last drain (not persisted)
    #[serde(skip)]
    pub changes: ChangeLog,

    /// Every payment made this match
    pub spending: Vec<SpendRecord>,

    pub logger: GameLogger,
}

impl GameState {
    /// Create a new match with two players in seat order
    pub fn new_two_player(
        player1_name: impl Into<PlayerName>,
        player2_name: impl Into<PlayerName>,
        config: RulesConfig,
    ) -> Self {
        let p1_id = PlayerId::new(0);
        let p2_id = PlayerId::new(1);

        let players = [(p1_id, player1_name.into()), (p2_id, player2_name.into())]
            .into_iter()
            .map(|(id, name)| {
                let mut player = Player::new(id, name, config.starting_life);
                player.max_hand_size = config.max_hand_size;
                player
            })
            .collect();

        GameState {
            cards: EntityStore::new(),
            players,
            turn: TurnStructure::new(p1_id),
            status: MatchStatus::Waiting,
            stack: Vec::new(),
            priority: PriorityTracker::new(),
            logger: GameLogger::with_verbosity(config.verbosity),
            config,
            winner: None,
            next_entity_id: 2,
            changes: ChangeLog::new(),
            spending: Vec::new(),
        }
    }

    /// Get next entity ID (unified across all entity types)
    pub fn next_id<T>(&mut self) -> EntityId<T> {
        let id = EntityId::new(self.next_entity_id);
        self.next_entity_id += 1;
        id
    }

    pub fn get_player(&self, id: PlayerId) -> Result<&Player> {
        self.players
            .iter()
            .find(|p| p.id == id)
            .ok_or(MtgError::EntityNotFound(id.as_u32()))
    }

    pub fn get_player_mut(&mut self, id: PlayerId) -> Result<&mut Player> {
        self.players
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(MtgError::EntityNotFound(id.as_u32()))
    }

    pub fn is_registered(&self, id: PlayerId) -> bool {
        self.players.iter().any(|p| p.id == id)
    }

    pub fn get_player_idx(&self, id: PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.id == id)
    }

    /// Next player in seat order (wraps around)
    pub fn next_player_after(&self, id: PlayerId) -> PlayerId {
        let idx = self
            .get_player_idx(id)
            .map(|i| (i + 1) % self.players.len())
            .unwrap_or(0);
        self.players[idx].id
    }

    /// For 2-player games, get the other player's ID
    pub fn opponent_of(&self, player_id: PlayerId) -> Option<PlayerId> {
        if self.players.len() == 2 {
            self.players.iter().find(|p| p.id != player_id).map(|p| p.id)
        } else {
            None
        }
    }

    pub fn active_player(&self) -> PlayerId {
        self.turn.active_player
    }

    pub fn current_step(&self) -> Step {
        self.turn.current_step
    }

    pub fn card(&self, id: CardId) -> Result<&Card> {
        self.cards.get(id)
    }

    /// Permanents a player controls, in partition order
    pub fn battlefield_cards(&self, player: PlayerId) -> impl Iterator<Item = &Card> + '_ {
        self.players
            .iter()
            .filter(move |p| p.id == player)
            .flat_map(|p| p.zones.battlefield.iter())
            .filter_map(|id| self.cards.get(id).ok())
    }

    pub fn hand_cards(&self, player: PlayerId) -> impl Iterator<Item = &Card> + '_ {
        self.players
            .iter()
            .filter(move |p| p.id == player)
            .flat_map(|p| p.zones.hand.iter())
            .filter_map(|id| self.cards.get(id).ok())
    }

    pub fn stack_is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Whether the zone slot named by `card.zone` really holds the card
    fn holds(&self, card: &Card) -> bool {
        match card.zone {
            Zone::Stack => self
                .stack
                .iter()
                .any(|o| o.source == card.id && o.item == StackItem::Spell),
            Zone::Battlefield => self
                .get_player(card.controller)
                .is_ok_and(|p| p.zones.battlefield.contains(card.id)),
            zone => self
                .get_player(card.owner)
                .is_ok_and(|p| p.zones.contains(zone, card.id)),
        }
    }

    fn place(&mut self, card_id: CardId, zone: Zone) -> Result<()> {
        let card = self.cards.get(card_id)?;
        let (owner, controller, partition) = (card.owner, card.controller, card.partition());
        match zone {
            Zone::Stack => self.stack.push(StackObject {
                source: card_id,
                controller,
                item: StackItem::Spell,
            }),
            Zone::Battlefield => self
                .get_player_mut(controller)?
                .zones
                .battlefield
                .add(card_id, partition),
            other => {
                if let Some(z) = self.get_player_mut(owner)?.zones.list_mut(other) {
                    z.push(card_id);
                }
            }
        }
        Ok(())
    }

    fn unplace(&mut self, card_id: CardId) -> Result<()> {
        let card = self.cards.get(card_id)?;
        let (zone, owner, controller) = (card.zone, card.owner, card.controller);
        match zone {
            Zone::Stack => self
                .stack
                .retain(|o| !(o.source == card_id && o.item == StackItem::Spell)),
            Zone::Battlefield => {
                self.get_player_mut(controller)?
                    .zones
                    .battlefield
                    .remove(card_id);
            }
            other => {
                if let Some(z) = self.get_player_mut(owner)?.zones.list_mut(other) {
                    z.remove(card_id);
                }
            }
        }
        Ok(())
    }

    fn invariant_violation(&self, message: String) -> MtgError {
        self.logger.invariant(&message);
        MtgError::InvariantViolation(message)
    }

    /// Register a new card instance in a zone, assigning it a fresh id
    pub fn add_card(&mut self, mut card: Card, zone: Zone) -> Result<CardId> {
        self.get_player(card.owner)?;
        if !self.is_registered(card.controller) {
            card.controller = card.owner;
        }
        match zone {
            Zone::Battlefield => restrictions::check_uniqueness(self, &card, card.controller)?,
            Zone::Hand => restrictions::check_hand_space(self, card.owner)?,
            _ => {}
        }

        let id = self.next_id();
        card.id = id;
        card.zone = zone;
        card.visibility = Visibility::for_zone(zone);
        if zone == Zone::Battlefield {
            card.entered_battlefield_turn = Some(self.turn.turn_number);
        }
        self.cards.add(card);
        self.place(id, zone)?;
        Ok(id)
    }

    /// Move a card from its current zone to another
    ///
    /// Entering the battlefield enforces the legend rule and planeswalker
    /// uniqueness; entering a hand enforces the maximum hand size.
    pub fn move_card(&mut self, card_id: CardId, to: Zone) -> Result<()> {
        self.relocate(card_id, to, true)
    }

    /// Move a card, optionally skipping the same-name checks on entry
    ///
    /// Externally observed moves already happened, so they are applied as-is
    /// and any uniqueness conflict is settled by `apply_state_based_actions`.
    pub(crate) fn relocate(
        &mut self,
        card_id: CardId,
        to: Zone,
        check_uniqueness: bool,
    ) -> Result<()> {
        self.check_move(card_id, to, check_uniqueness)?;
        let from = self.cards.get(card_id)?.zone;
        if from == to {
            return Ok(());
        }

        self.unplace(card_id)?;
        let turn = self.turn.turn_number;
        let card = self.cards.get_mut(card_id)?;
        if from == Zone::Battlefield {
            card.reset_battlefield_state();
            card.controller = card.owner;
        }
        card.zone = to;
        card.visibility = Visibility::for_zone(to);
        if to == Zone::Battlefield {
            card.entered_battlefield_turn = Some(turn);
        }
        let controller = card.controller;
        let name = card.name.clone();
        self.place(card_id, to)?;

        self.changes.record(StateChange::CardMoved {
            card: card_id,
            from,
            to,
            controller,
        });
        self.logger.log(
            VerbosityLevel::Verbose,
            Some("zone"),
            &format!("{name} moves {from} -> {to}"),
        );
        Ok(())
    }

    /// Everything `relocate` checks before it changes anything
    pub(crate) fn check_move(
        &self,
        card_id: CardId,
        to: Zone,
        check_uniqueness: bool,
    ) -> Result<()> {
        let card = self.cards.get(card_id)?;
        if !self.holds(card) {
            return Err(self.invariant_violation(format!(
                "card {} ({}) is recorded in {} but not held there",
                card_id, card.name, card.zone
            )));
        }
        if card.zone == to {
            return Ok(());
        }
        match to {
            Zone::Battlefield if check_uniqueness => {
                restrictions::check_uniqueness(self, card, card.controller)
            }
            Zone::Hand => restrictions::check_hand_space(self, card.owner),
            _ => Ok(()),
        }
    }

    /// Register a card under the id it already carries
    ///
    /// Used for cards first seen in external events, whose ids are assigned
    /// by the client. Hand entry respects the maximum hand size; battlefield
    /// entry is not checked for uniqueness (see `apply_state_based_actions`).
    pub fn register_card(&mut self, mut card: Card, zone: Zone) -> Result<CardId> {
        let id = card.id;
        if self.cards.contains(id) {
            return Err(self.invariant_violation(format!(
                "card id {id} ({}) is already registered",
                card.name
            )));
        }
        self.get_player(card.owner)?;
        if !self.is_registered(card.controller) {
            card.controller = card.owner;
        }
        if zone == Zone::Hand {
            restrictions::check_hand_space(self, card.owner)?;
        }

        card.zone = zone;
        card.visibility = Visibility::for_zone(zone);
        if zone == Zone::Battlefield {
            card.entered_battlefield_turn = Some(self.turn.turn_number);
        }
        let controller = card.controller;
        self.next_entity_id = self.next_entity_id.max(id.as_u32() + 1);
        self.cards.add(card);
        self.place(id, zone)?;
        self.changes.record(StateChange::CardMoved {
            card: id,
            from: zone,
            to: zone,
            controller,
        });
        Ok(id)
    }

    /// Legend rule and planeswalker uniqueness as state-based actions
    ///
    /// For every conflicting pair the older permanent goes to its owner's
    /// graveyard. Returns the cards that were moved.
    pub fn apply_state_based_actions(&mut self) -> Result<Vec<CardId>> {
        let mut moved = Vec::new();
        let ids: Vec<PlayerId> = self.players.iter().map(|p| p.id).collect();
        for player in ids {
            for (older, _) in restrictions::uniqueness_conflicts(self, player) {
                if moved.contains(&older) {
                    continue;
                }
                let name = self.card(older)?.name.clone();
                self.relocate(older, Zone::Graveyard, false)?;
                self.logger.log(
                    VerbosityLevel::Normal,
                    Some("zone"),
                    &format!("{name} is put into the graveyard (same-name rule)"),
                );
                moved.push(older);
            }
        }
        Ok(moved)
    }

    /// Draw the top card of a player's library
    pub fn draw_card(&mut self, player_id: PlayerId) -> Result<CardId> {
        let player = self.get_player(player_id)?;
        let card_id = player.zones.library.top().ok_or_else(|| {
            MtgError::InvalidAction(format!("player {player_id} has an empty library"))
        })?;
        self.move_card(card_id, Zone::Hand)?;
        Ok(card_id)
    }

    /// The card, provided it is a permanent
    pub fn permanent(&self, card_id: CardId) -> Result<&Card> {
        let card = self.cards.get(card_id)?;
        if card.zone != Zone::Battlefield {
            return Err(MtgError::InvalidAction(format!(
                "{} is not on the battlefield",
                card.name
            )));
        }
        Ok(card)
    }

    pub fn set_tapped(&mut self, card_id: CardId, tapped: bool) -> Result<()> {
        self.permanent(card_id)?;
        let card = self.cards.get_mut(card_id)?;
        if card.tapped != tapped {
            card.tapped = tapped;
            self.changes.record(StateChange::CardTapped {
                card: card_id,
                tapped,
            });
        }
        Ok(())
    }

    /// Untap all permanents controlled by a player
    pub fn untap_all(&mut self, player_id: PlayerId) {
        let tapped: Vec<CardId> = self
            .battlefield_cards(player_id)
            .filter(|c| c.tapped)
            .map(|c| c.id)
            .collect();
        for card_id in tapped {
            if let Ok(card) = self.cards.get_mut(card_id) {
                card.untap();
                self.changes.record(StateChange::CardTapped {
                    card: card_id,
                    tapped: false,
                });
            }
        }
    }

    pub fn set_life(&mut self, player_id: PlayerId, life: i32) -> Result<()> {
        let player = self.get_player_mut(player_id)?;
        let old = player.life;
        player.life = life;
        let name = player.name.clone();
        self.changes.record(StateChange::LifeChanged {
            player: player_id,
            old,
            new: life,
        });
        self.logger.log(
            VerbosityLevel::Normal,
            Some("life"),
            &format!("{name} life {old} -> {life}"),
        );
        self.check_game_over();
        Ok(())
    }

    pub fn change_life(&mut self, player_id: PlayerId, delta: i32) -> Result<()> {
        let life = self.get_player(player_id)?.life;
        self.set_life(player_id, life + delta)
    }

    /// Add mana to a pool without checking sources
    pub fn add_mana(&mut self, player_id: PlayerId, color: Color, amount: u8) -> Result<()> {
        self.get_player_mut(player_id)?.mana_pool.add(color, amount);
        self.changes.record(StateChange::ManaAdded {
            player: player_id,
            color,
            amount,
        });
        Ok(())
    }

    pub fn adjust_counter(
        &mut self,
        player_id: PlayerId,
        counter: PlayerCounter,
        delta: i32,
    ) -> Result<()> {
        let player = self.get_player_mut(player_id)?;
        player.counters.adjust(counter, delta);
        let value = player.counters.get(counter);
        self.changes.record(StateChange::CounterChanged {
            player: player_id,
            counter,
            value,
        });
        self.check_game_over();
        Ok(())
    }

    pub fn mark_land_played(&mut self, player_id: PlayerId) -> Result<()> {
        let player = self.get_player_mut(player_id)?;
        player.flags.lands_played = player.flags.lands_played.saturating_add(1);
        self.changes.record(StateChange::FlagSet {
            player: player_id,
            flag: TurnFlag::LandPlayed,
        });
        Ok(())
    }

    pub fn mark_ability_used(
        &mut self,
        player_id: PlayerId,
        source: CardId,
        ability: &AbilityId,
    ) -> Result<()> {
        self.get_player_mut(player_id)?
            .flags
            .used_abilities
            .insert((source, ability.clone()));
        self.changes.record(StateChange::FlagSet {
            player: player_id,
            flag: TurnFlag::AbilityUsed {
                source,
                ability: ability.to_string(),
            },
        });
        Ok(())
    }

    pub fn declare_attacker(&mut self, card_id: CardId) -> Result<()> {
        let card = self.cards.get_mut(card_id)?;
        card.attacking = true;
        let controller = card.controller;
        let player = self.get_player_mut(controller)?;
        if !player.flags.attacked {
            player.flags.attacked = true;
            self.changes.record(StateChange::FlagSet {
                player: controller,
                flag: TurnFlag::Attacked,
            });
        }
        Ok(())
    }

    pub fn declare_blocker(&mut self, blocker: CardId, attacker: CardId) -> Result<()> {
        self.cards.get(attacker)?;
        self.cards.get_mut(blocker)?.blocking = Some(attacker);
        Ok(())
    }

    /// Clear attacking/blocking flags (end of combat)
    pub fn clear_combat(&mut self) {
        let ids: Vec<CardId> = self
            .cards
            .iter()
            .filter(|(_, c)| c.attacking || c.blocking.is_some())
            .map(|(id, _)| *id)
            .collect();
        for id in ids {
            if let Ok(card) = self.cards.get_mut(id) {
                card.attacking = false;
                card.blocking = None;
            }
        }
    }

    /// Put an activated ability on the stack
    pub fn push_ability(
        &mut self,
        source: CardId,
        ability: AbilityId,
        controller: PlayerId,
    ) -> Result<()> {
        self.get_player(controller)?;
        self.cards.get(source)?;
        self.stack.push(StackObject {
            source,
            controller,
            item: StackItem::Ability(ability),
        });
        self.changes.record(StateChange::StackPushed {
            card: source,
            controller,
        });
        Ok(())
    }

    /// Resolve the top object of the stack
    pub fn resolve_top(&mut self) -> Result<StackObject> {
        let index = self
            .stack
            .len()
            .checked_sub(1)
            .ok_or_else(|| MtgError::InvalidAction("the stack is empty".to_string()))?;
        self.resolve_at(index)
    }

    /// Resolve the topmost stack object coming from `source`
    ///
    /// Externally reported resolutions need not be on top: an object may have
    /// been countered while others sat above it.
    pub fn resolve_source(&mut self, source: CardId) -> Result<StackObject> {
        let index = self
            .stack
            .iter()
            .rposition(|o| o.source == source)
            .ok_or_else(|| {
                MtgError::InvalidAction(format!("card {source} has nothing on the stack"))
            })?;
        self.resolve_at(index)
    }

    /// Take a stack object off the stack
    ///
    /// A spell's card goes to the battlefield when it is a permanent and to
    /// its owner's graveyard otherwise. Abilities just leave. Priority goes
    /// back to the active player.
    fn resolve_at(&mut self, index: usize) -> Result<StackObject> {
        let object = self.stack.get(index).cloned().ok_or_else(|| {
            self.invariant_violation(format!("stack index {index} out of range"))
        })?;
        let to = match object.item {
            StackItem::Spell => {
                let to = if self.card(object.source)?.is_permanent() {
                    Zone::Battlefield
                } else {
                    Zone::Graveyard
                };
                self.relocate(object.source, to, false)?;
                if to == Zone::Battlefield {
                    self.apply_state_based_actions()?;
                }
                Some(to)
            }
            StackItem::Ability(_) => {
                self.stack.remove(index);
                None
            }
        };

        self.changes.record(StateChange::StackResolved {
            card: object.source,
            controller: object.controller,
            to,
        });
        let name = self.card(object.source)?.name.clone();
        let what = match &object.item {
            StackItem::Spell => name.to_string(),
            StackItem::Ability(ability) => format!("{ability} of {name}"),
        };
        self.logger.log(
            VerbosityLevel::Verbose,
            Some("stack"),
            &format!("{what} resolves"),
        );
        self.reset_priority();
        Ok(object)
    }

    fn set_status(&mut self, status: MatchStatus) {
        let from = self.status;
        if from != status {
            self.status = status;
            self.changes.record(StateChange::StatusChanged { from, to: status });
        }
    }

    /// Begin the match: status becomes Active and the active player gets priority
    pub fn start_game(&mut self) -> Result<()> {
        if !matches!(self.status, MatchStatus::Waiting | MatchStatus::Starting) {
            return Err(MtgError::InvalidAction(format!(
                "cannot start a match that is {}",
                self.status
            )));
        }
        self.set_status(MatchStatus::Active);
        self.reset_priority();
        self.logger.log(
            VerbosityLevel::Minimal,
            Some("status"),
            &format!(
                "Match started, turn {} ({} active)",
                self.turn.turn_number, self.turn.active_player
            ),
        );
        Ok(())
    }

    pub fn end_game(&mut self, winner: Option<PlayerId>) {
        self.winner = winner;
        self.set_status(MatchStatus::Ended);
        let message = match winner {
            Some(w) => format!("Match over, player {w} wins"),
            None => "Match over".to_string(),
        };
        self.logger.log(VerbosityLevel::Minimal, Some("status"), &message);
    }

    pub fn pause(&mut self) {
        if self.status == MatchStatus::Active {
            self.set_status(MatchStatus::Paused);
        }
    }

    pub fn resume(&mut self) {
        if self.status == MatchStatus::Paused {
            self.set_status(MatchStatus::Active);
        }
    }

    /// End the match once at most one player is still alive
    fn check_game_over(&mut self) {
        if self.status != MatchStatus::Active {
            return;
        }
        let alive: Vec<PlayerId> = self
            .players
            .iter()
            .filter(|p| p.is_alive())
            .map(|p| p.id)
            .collect();
        if alive.len() <= 1 {
            self.end_game(alive.first().copied());
        }
    }

    pub fn concede(&mut self, player_id: PlayerId) -> Result<()> {
        self.get_player_mut(player_id)?.conceded = true;
        self.logger.log(
            VerbosityLevel::Normal,
            Some("status"),
            &format!("player {player_id} concedes"),
        );
        self.check_game_over();
        Ok(())
    }

    /// Clear the pass set and hand priority to the active player
    pub(crate) fn reset_priority(&mut self) {
        self.priority.clear();
        let active = self.turn.active_player;
        if self.turn.priority_player != Some(active) {
            self.turn.priority_player = Some(active);
            self.changes.record(StateChange::PriorityChanged {
                player: Some(active),
            });
        }
    }

    /// Advance to the next step; leaving Cleanup starts the next turn
    pub fn advance_step(&mut self) {
        let from = self.turn.current_step;
        if from == Step::Cleanup {
            self.begin_turn(None);
        } else {
            self.turn.advance_step();
            if from == Step::EndCombat {
                self.clear_combat();
            }
        }
        self.finish_step_change(from);
    }

    /// Jump straight to a step (external step-change event)
    pub fn set_step(&mut self, step: Step) {
        let from = self.turn.current_step;
        if from == step {
            return;
        }
        self.turn.current_step = step;
        if step == Step::Main2 || step == Step::End {
            self.clear_combat();
        }
        self.finish_step_change(from);
    }

    fn finish_step_change(&mut self, from: Step) {
        let to = self.turn.current_step;
        self.changes.record(StateChange::StepChanged {
            from,
            to,
            turn: self.turn.turn_number,
        });
        self.reset_priority();
        self.logger.log(
            VerbosityLevel::Normal,
            Some("step"),
            &format!("Turn {}: {} -> {}", self.turn.turn_number, from, to),
        );
    }

    /// Start the next turn
    ///
    /// Turn flags reset and every mana pool empties. The active player passes to
    /// `next_active`, or to the next player in seat order.
    pub fn begin_turn(&mut self, next_active: Option<PlayerId>) {
        let next = next_active
            .filter(|p| self.is_registered(*p))
            .unwrap_or_else(|| self.next_player_after(self.turn.active_player));

        for player in &mut self.players {
            player.start_new_turn();
        }
        let ids: Vec<PlayerId> = self.players.iter().map(|p| p.id).collect();
        for id in ids {
            self.changes.record(StateChange::PoolEmptied { player: id });
        }
        self.clear_combat();

        self.turn.next_turn(next);
        self.untap_all(next);
        self.priority.clear();
        self.changes.record(StateChange::TurnChanged {
            turn: self.turn.turn_number,
            active_player: next,
        });
        self.logger.log(
            VerbosityLevel::Normal,
            Some("turn"),
            &format!("Turn {} begins (player {next})", self.turn.turn_number),
        );
    }

    pub fn record_spend(&mut self, record: SpendRecord) {
        self.changes.record(StateChange::ManaSpent {
            player: record.player,
            cost: record.cost.clone(),
        });
        self.spending.push(record);
    }

    /// Payments made by one player, oldest first
    pub fn spending_history(&self, player: PlayerId) -> impl Iterator<Item = &SpendRecord> + '_ {
        self.spending.iter().filter(move |r| r.player == player)
    }

    /// Check structural consistency
    ///
    /// Returns every issue found; an empty list means the state is consistent.
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        let mut seen = BTreeSet::new();

        let mut check = |card_id: CardId, zone: Zone, issues: &mut Vec<ValidationIssue>| {
            if !seen.insert(card_id) {
                issues.push(ValidationIssue::DuplicateCard { card: card_id });
                return;
            }
            match self.cards.get(card_id) {
                Err(_) => issues.push(ValidationIssue::UnknownCard { card: card_id }),
                Ok(card) if card.zone != zone => issues.push(ValidationIssue::ZoneMismatch {
                    card: card_id,
                    recorded: card.zone,
                }),
                Ok(_) => {}
            }
        };

        for player in &self.players {
            let zones = &player.zones;
            for (zone, list) in zones.lists() {
                for id in list.iter() {
                    check(id, zone, &mut issues);
                }
            }
            for id in zones.battlefield.iter() {
                check(id, Zone::Battlefield, &mut issues);
            }
            if player.hand_size() > player.max_hand_size {
                issues.push(ValidationIssue::HandOverMax {
                    player: player.id,
                    size: player.hand_size(),
                    max: player.max_hand_size,
                });
            }
        }
        for object in self.stack.iter().filter(|o| o.item == StackItem::Spell) {
            check(object.source, Zone::Stack, &mut issues);
        }

        for (id, card) in self.cards.iter() {
            if !seen.contains(id) || !self.holds(card) {
                let issue = ValidationIssue::ZoneMismatch {
                    card: *id,
                    recorded: card.zone,
                };
                if !issues.contains(&issue) {
                    issues.push(issue);
                }
            }
        }

        if !self.is_registered(self.turn.active_player) {
            issues.push(ValidationIssue::UnknownActivePlayer {
                player: self.turn.active_player,
            });
        }
        if let Some(p) = self.turn.priority_player {
            if !self.is_registered(p) {
                issues.push(ValidationIssue::UnknownPriorityPlayer { player: p });
            }
        }
        issues
    }
}
