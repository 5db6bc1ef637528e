//! External game events and their application to the match state
//!
//! Events describe things that already happened at the client (a card was
//! drawn, a spell was cast, the step changed). They are applied without
//! legality checks, except that a hand never grows past its maximum size.
//! Same-name conflicts created by an event are settled afterwards as
//! state-based actions.
//!
//! Events arrive as JSON lines:
//!
//! ```text
//! {"type":"game_start","player_life":20,"opponent_life":20}
//! {"type":"step_change","step":"main1"}
//! {"type":"draw_card","player":0,"card":{"instance_id":101,"name":"Forest","owner":0}}
//! ```

use crate::core::{
    Card, CardId, CardType, Color, CounterType, DefinitionId, PlayerCounter, PlayerId, Supertype,
};
use crate::game::{GameState, Step, VerbosityLevel};
use crate::zones::Zone;
use crate::{MtgError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Card as described by an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCard {
    pub instance_id: u32,
    #[serde(default)]
    pub definition_id: Option<u32>,
    pub name: String,
    #[serde(default)]
    pub mana_cost: String,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub supertypes: Vec<String>,
    #[serde(default)]
    pub subtypes: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub power: Option<i8>,
    #[serde(default)]
    pub toughness: Option<i8>,
    pub owner: PlayerId,
    #[serde(default)]
    pub controller: Option<PlayerId>,
}

impl EventCard {
    pub fn new(instance_id: u32, name: impl Into<String>, owner: PlayerId) -> Self {
        EventCard {
            instance_id,
            definition_id: None,
            name: name.into(),
            mana_cost: String::new(),
            types: Vec::new(),
            supertypes: Vec::new(),
            subtypes: Vec::new(),
            keywords: Vec::new(),
            power: None,
            toughness: None,
            owner,
            controller: None,
        }
    }

    pub fn card_id(&self) -> CardId {
        CardId::new(self.instance_id)
    }

    /// Build a card from the event's own data; unknown type names are skipped
    pub fn to_card(&self) -> Card {
        let mut card = Card::new(self.card_id(), self.name.as_str(), self.owner);
        card.definition_id = self.definition_id.map(DefinitionId);
        card.mana_cost = self.mana_cost.clone();
        card.types = self
            .types
            .iter()
            .filter_map(|t| t.parse::<CardType>().ok())
            .collect();
        card.supertypes = self
            .supertypes
            .iter()
            .filter_map(|t| t.parse::<Supertype>().ok())
            .collect();
        card.subtypes = self.subtypes.iter().map(|s| s.as_str().into()).collect();
        for keyword in &self.keywords {
            card.add_keyword(keyword.as_str());
        }
        card.power = self.power;
        card.toughness = self.toughness;
        if let Some(controller) = self.controller {
            card.controller = controller;
        }
        card
    }
}

/// Turns event card descriptions into card instances
///
/// The plain resolver uses only what the event carries; a card database can
/// fill in static characteristics the client did not send.
pub trait CardResolver {
    fn resolve(&self, info: &EventCard) -> Card;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PlainResolver;

impl CardResolver for PlainResolver {
    fn resolve(&self, info: &EventCard) -> Card {
        info.to_card()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    GameStart {
        #[serde(default)]
        player_life: Option<i32>,
        #[serde(default)]
        opponent_life: Option<i32>,
        #[serde(default)]
        active_player: Option<PlayerId>,
        #[serde(default)]
        hands: Vec<EventCard>,
        #[serde(default)]
        battlefield: Vec<EventCard>,
    },
    GameEnd {
        #[serde(default)]
        winner: Option<PlayerId>,
        #[serde(default)]
        reason: Option<String>,
    },
    DrawCard {
        player: PlayerId,
        card: EventCard,
    },
    ZoneChange {
        card: EventCard,
        #[serde(default)]
        from: Option<Zone>,
        to: Zone,
    },
    CastSpell {
        player: PlayerId,
        card: EventCard,
    },
    /// The topmost stack object from `source` resolved or was countered
    StackResolved {
        source: CardId,
    },
    LifeChange {
        player: PlayerId,
        new_life: i32,
    },
    /// Step name, e.g. "main1", "declare_attackers", "end_of_turn"
    #[serde(alias = "phase_change")]
    StepChange {
        step: String,
    },
    TurnChange {
        turn: u32,
        active_player: PlayerId,
    },
    /// Counters on a card
    CounterChange {
        card: CardId,
        counter: CounterType,
        count: u8,
    },
    PlayerCounterChange {
        player: PlayerId,
        counter: PlayerCounter,
        value: u32,
    },
    ManaAdded {
        player: PlayerId,
        /// Color letter or name
        color: String,
        amount: u8,
    },
}

impl GameEvent {
    pub fn name(&self) -> &'static str {
        match self {
            GameEvent::GameStart { .. } => "game_start",
            GameEvent::GameEnd { .. } => "game_end",
            GameEvent::DrawCard { .. } => "draw_card",
            GameEvent::ZoneChange { .. } => "zone_change",
            GameEvent::CastSpell { .. } => "cast_spell",
            GameEvent::StackResolved { .. } => "stack_resolved",
            GameEvent::LifeChange { .. } => "life_change",
            GameEvent::StepChange { .. } => "step_change",
            GameEvent::TurnChange { .. } => "turn_change",
            GameEvent::CounterChange { .. } => "counter_change",
            GameEvent::PlayerCounterChange { .. } => "player_counter_change",
            GameEvent::ManaAdded { .. } => "mana_added",
        }
    }
}

/// Parse a JSON-lines event stream; blank lines and `#` comments are skipped
pub fn parse_events(text: &str) -> Result<Vec<GameEvent>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(i, line)| {
            serde_json::from_str(line).map_err(|e| {
                MtgError::SerializationError(format!("event line {}: {e}", i + 1))
            })
        })
        .collect()
}

pub fn load_events(path: &Path) -> Result<Vec<GameEvent>> {
    let text = std::fs::read_to_string(path)?;
    parse_events(&text)
}

impl GameState {
    /// Apply an external event using only the card data it carries
    pub fn apply_event(&mut self, event: &GameEvent) -> Result<()> {
        self.apply_event_with(event, &PlainResolver)
    }

    pub fn apply_event_with(
        &mut self,
        event: &GameEvent,
        resolver: &dyn CardResolver,
    ) -> Result<()> {
        self.logger.log(
            VerbosityLevel::Verbose,
            Some("event"),
            &format!("applying {}", event.name()),
        );
        match event {
            GameEvent::GameStart {
                player_life,
                opponent_life,
                active_player,
                hands,
                battlefield,
            } => {
                let seats: Vec<PlayerId> = self.players.iter().map(|p| p.id).collect();
                for (seat, life) in seats.iter().zip([player_life, opponent_life]) {
                    if let Some(life) = life {
                        self.set_life(*seat, *life)?;
                    }
                }
                if let Some(active) = active_player {
                    self.get_player(*active)?;
                    self.turn.active_player = *active;
                }
                for info in hands {
                    self.observe_card(info, Zone::Hand, resolver)?;
                }
                for info in battlefield {
                    self.observe_card(info, Zone::Battlefield, resolver)?;
                }
                self.start_game()?;
                self.apply_state_based_actions()?;
            }
            GameEvent::GameEnd { winner, reason } => {
                if let Some(reason) = reason {
                    self.logger
                        .log(VerbosityLevel::Normal, Some("status"), reason);
                }
                self.end_game(*winner);
            }
            GameEvent::DrawCard { player, card } => {
                if card.owner != *player {
                    return Err(MtgError::InvalidAction(format!(
                        "player {player} cannot draw {} owned by player {}",
                        card.name, card.owner
                    )));
                }
                self.observe_card(card, Zone::Hand, resolver)?;
            }
            GameEvent::ZoneChange { card, from, to } => {
                if let (Some(from), Ok(known)) = (from, self.card(card.card_id())) {
                    if known.zone != *from {
                        self.logger.log(
                            VerbosityLevel::Normal,
                            Some("event"),
                            &format!(
                                "{} reported leaving {from} but was in {}",
                                known.name, known.zone
                            ),
                        );
                    }
                }
                let id = self.observe_card(card, *to, resolver)?;
                if *to == Zone::Battlefield {
                    // A land coming from hand on its controller's turn is a land play
                    let placed = self.card(id)?;
                    let controller = placed.controller;
                    if *from == Some(Zone::Hand)
                        && placed.is_land()
                        && controller == self.turn.active_player
                    {
                        self.mark_land_played(controller)?;
                    }
                    self.apply_state_based_actions()?;
                }
            }
            GameEvent::CastSpell { player, card } => {
                self.get_player(*player)?;
                self.observe_card(card, Zone::Stack, resolver)?;
                self.note_action_taken(*player);
            }
            GameEvent::StackResolved { source } => {
                self.resolve_source(*source)?;
            }
            GameEvent::LifeChange { player, new_life } => self.set_life(*player, *new_life)?,
            GameEvent::StepChange { step } => {
                let step: Step = step.parse()?;
                self.set_step(step);
            }
            GameEvent::TurnChange {
                turn,
                active_player,
            } => {
                self.get_player(*active_player)?;
                self.turn.turn_number = turn.saturating_sub(1);
                self.begin_turn(Some(*active_player));
            }
            GameEvent::CounterChange {
                card,
                counter,
                count,
            } => {
                let c = self.cards.get_mut(*card)?;
                let current = c.get_counter(counter);
                if *count > current {
                    c.add_counter(counter.clone(), count - current);
                } else {
                    c.remove_counter(counter, current - count);
                }
            }
            GameEvent::PlayerCounterChange {
                player,
                counter,
                value,
            } => {
                let current = self.get_player(*player)?.counters.get(*counter);
                let delta = *value as i64 - current as i64;
                self.adjust_counter(*player, *counter, delta as i32)?;
            }
            GameEvent::ManaAdded {
                player,
                color,
                amount,
            } => {
                let color: Color = color.parse()?;
                self.add_mana(*player, color, *amount)?;
            }
        }
        Ok(())
    }

    /// Put an event card into `zone`, registering it on first sight
    fn observe_card(
        &mut self,
        info: &EventCard,
        zone: Zone,
        resolver: &dyn CardResolver,
    ) -> Result<CardId> {
        let id = info.card_id();
        if self.cards.contains(id) {
            self.relocate(id, zone, false)?;
        } else {
            self.register_card(resolver.resolve(info), zone)?;
        }
        Ok(id)
    }
}
