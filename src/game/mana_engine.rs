//! Mana generation from permanents
//!
//! A permanent is a mana source for a color when it is untapped and either
//!
//! - a land whose basic land types or metadata include the color
//!   (Plains → W, Island → U, Swamp → B, Mountain → R, Forest → G, Wastes → C), or
//! - a nonland permanent tagged `ManaSource`, producing any color unless its
//!   metadata lists the colors it makes.
//!
//! Creatures with mana abilities also need to be free of summoning sickness.
//!
//! `ManaEngine` caches the per-color source counts for one player so repeated
//! queries do not rescan the battlefield. Call `update` after the battlefield
//! changes (a permanent enters, leaves, taps or untaps).

use crate::core::{Capability, Card, CardId, Color, ManaPool, PlayerId};
use crate::game::restrictions::is_summoning_sick;
use crate::game::{GameState, VerbosityLevel};
use crate::{MtgError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of untapped sources able to produce each color
///
/// A source that can make several colors counts once for each of them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManaCapacity {
    pub white: u8,
    pub blue: u8,
    pub black: u8,
    pub red: u8,
    pub green: u8,
    pub colorless: u8,
}

impl ManaCapacity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, color: Color) -> u8 {
        match color {
            Color::White => self.white,
            Color::Blue => self.blue,
            Color::Black => self.black,
            Color::Red => self.red,
            Color::Green => self.green,
            Color::Colorless => self.colorless,
        }
    }

    fn bump(&mut self, color: Color) {
        let slot = match color {
            Color::White => &mut self.white,
            Color::Blue => &mut self.blue,
            Color::Black => &mut self.black,
            Color::Red => &mut self.red,
            Color::Green => &mut self.green,
            Color::Colorless => &mut self.colorless,
        };
        *slot = slot.saturating_add(1);
    }
}

/// Whether a single permanent can currently produce `color`
pub fn source_produces(state: &GameState, card: &Card, color: Color) -> bool {
    if card.tapped {
        return false;
    }
    if card.is_land() {
        return card.basic_land_colors().contains(&color) || card.mana_colors.contains(&color);
    }
    if !card.has_capability(Capability::ManaSource) || is_summoning_sick(state, card) {
        return false;
    }
    card.mana_colors.is_empty() || card.mana_colors.contains(&color)
}

/// Whether `player` controls an untapped source of `color`
pub fn can_generate(state: &GameState, player: PlayerId, color: Color) -> bool {
    state
        .battlefield_cards(player)
        .any(|card| source_produces(state, card, color))
}

/// Add mana to a player's pool, provided they control a source for it
///
/// Sources are not tapped; this records mana produced outside the engine.
pub fn generate(state: &mut GameState, player: PlayerId, color: Color, amount: u8) -> Result<()> {
    state.get_player(player)?;
    if !can_generate(state, player, color) {
        return Err(MtgError::InsufficientResources(format!(
            "player {player} controls no untapped source of {color}"
        )));
    }
    state.add_mana(player, color, amount)?;
    state.logger.log(
        VerbosityLevel::Verbose,
        Some("mana"),
        &format!("player {player} adds {amount} {color}"),
    );
    Ok(())
}

/// Pool contents together with what the player could still produce
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSummary {
    pub pool: ManaPool,
    pub total: u32,
    pub can_generate: BTreeMap<Color, bool>,
    /// Untapped sources per color
    pub capacity: ManaCapacity,
    pub sources: usize,
}

pub fn pool_summary(state: &GameState, player: PlayerId) -> Result<PoolSummary> {
    let pool = state.get_player(player)?.mana_pool;
    let mut engine = ManaEngine::new(player);
    engine.update(state);
    let can_generate = Color::ALL
        .into_iter()
        .map(|color| (color, engine.can_produce(color)))
        .collect();
    Ok(PoolSummary {
        pool,
        total: pool.total(),
        can_generate,
        capacity: engine.capacity(),
        sources: engine.sources().len(),
    })
}

/// Per-player cache of mana sources
#[derive(Debug, Clone)]
pub struct ManaEngine {
    player_id: PlayerId,
    sources: Vec<CardId>,
    capacity: ManaCapacity,
}

impl ManaEngine {
    pub fn new(player_id: PlayerId) -> Self {
        Self {
            player_id,
            sources: Vec::new(),
            capacity: ManaCapacity::new(),
        }
    }

    /// Rescan the player's battlefield
    pub fn update(&mut self, state: &GameState) {
        self.sources.clear();
        self.capacity = ManaCapacity::new();

        for card in state.battlefield_cards(self.player_id) {
            let mut produces_any = false;
            for color in Color::ALL {
                if source_produces(state, card, color) {
                    self.capacity.bump(color);
                    produces_any = true;
                }
            }
            if produces_any {
                self.sources.push(card.id);
            }
        }
    }

    pub fn sources(&self) -> &[CardId] {
        &self.sources
    }

    pub fn capacity(&self) -> ManaCapacity {
        self.capacity
    }

    pub fn can_produce(&self, color: Color) -> bool {
        self.capacity.get(color) > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CardType, Supertype};
    use crate::game::RulesConfig;
    use crate::zones::Zone;

    fn setup() -> (GameState, PlayerId) {
        let state = GameState::new_two_player("Alice", "Bob", RulesConfig::default());
        let alice = state.players[0].id;
        (state, alice)
    }

    fn basic(name: &str, owner: PlayerId) -> Card {
        Card::new(CardId::new(0), name, owner)
            .with_types(&[CardType::Land])
            .with_supertype(Supertype::Basic)
            .with_subtype(name)
    }

    #[test]
    fn test_basic_lands_produce_their_color() {
        let (mut state, alice) = setup();
        let mountain = state
            .add_card(basic("Mountain", alice), Zone::Battlefield)
            .unwrap();

        assert!(can_generate(&state, alice, Color::Red));
        assert!(!can_generate(&state, alice, Color::Blue));

        state.set_tapped(mountain, true).unwrap();
        assert!(!can_generate(&state, alice, Color::Red));
    }

    #[test]
    fn test_mana_artifact_any_color_unless_restricted() {
        let (mut state, alice) = setup();
        let mut signet = Card::new(CardId::new(0), "Mind Stone", alice)
            .with_types(&[CardType::Artifact])
            .with_keyword("Mana source");
        state.add_card(signet.clone(), Zone::Battlefield).unwrap();
        assert!(Color::ALL.iter().all(|&c| can_generate(&state, alice, c)));

        let (mut state, alice) = setup();
        signet.mana_colors.push(Color::Colorless);
        state.add_card(signet, Zone::Battlefield).unwrap();
        assert!(can_generate(&state, alice, Color::Colorless));
        assert!(!can_generate(&state, alice, Color::Green));
    }

    #[test]
    fn test_generate_requires_source() {
        let (mut state, alice) = setup();
        let err = generate(&mut state, alice, Color::Green, 1).unwrap_err();
        assert!(matches!(err, MtgError::InsufficientResources(_)));
        assert!(state.players[0].mana_pool.is_empty());

        state
            .add_card(basic("Forest", alice), Zone::Battlefield)
            .unwrap();
        generate(&mut state, alice, Color::Green, 2).unwrap();
        assert_eq!(state.players[0].mana_pool.green, 2);

        let summary = pool_summary(&state, alice).unwrap();
        assert_eq!(summary.total, 2);
        assert!(summary.can_generate[&Color::Green]);
        assert!(!summary.can_generate[&Color::White]);
        assert_eq!(summary.capacity.green, 1);
        assert_eq!(summary.sources, 1);
    }

    #[test]
    fn test_engine_counts_sources() {
        let (mut state, alice) = setup();
        state
            .add_card(basic("Island", alice), Zone::Battlefield)
            .unwrap();
        let tapped = state
            .add_card(basic("Island", alice), Zone::Battlefield)
            .unwrap();
        state.set_tapped(tapped, true).unwrap();
        let dual = Card::new(CardId::new(0), "Volcanic Island", alice)
            .with_types(&[CardType::Land])
            .with_subtype("Island")
            .with_subtype("Mountain");
        state.add_card(dual, Zone::Battlefield).unwrap();

        let mut engine = ManaEngine::new(alice);
        engine.update(&state);
        assert_eq!(engine.sources().len(), 2);
        assert_eq!(engine.capacity().blue, 2);
        assert_eq!(engine.capacity().red, 1);
        assert!(!engine.can_produce(Color::White));
    }
}
