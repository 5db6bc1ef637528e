//! Player representation

use crate::core::{AbilityId, CardId, GameEntity, ManaPool, PlayerId, PlayerName};
use crate::zones::PlayerZones;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Per-turn flags, reset when a new turn begins
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnFlags {
    /// Lands played this turn
    pub lands_played: u8,
    pub attacked: bool,
    /// Activated abilities already used this turn, by source card
    pub used_abilities: BTreeSet<(CardId, AbilityId)>,
    /// Creatures that already assigned combat damage
    pub damage_assigned: BTreeSet<CardId>,
}

impl TurnFlags {
    pub fn played_land(&self) -> bool {
        self.lands_played > 0
    }
}

/// Player-level counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerCounter {
    Poison,
    Energy,
    Experience,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerCounters {
    pub poison: u32,
    pub energy: u32,
    pub experience: u32,
}

impl PlayerCounters {
    pub fn get(&self, counter: PlayerCounter) -> u32 {
        match counter {
            PlayerCounter::Poison => self.poison,
            PlayerCounter::Energy => self.energy,
            PlayerCounter::Experience => self.experience,
        }
    }

    /// Apply a signed delta, clamping at zero
    pub fn adjust(&mut self, counter: PlayerCounter, delta: i32) {
        let slot = match counter {
            PlayerCounter::Poison => &mut self.poison,
            PlayerCounter::Energy => &mut self.energy,
            PlayerCounter::Experience => &mut self.experience,
        };
        *slot = (*slot as i64 + delta as i64).clamp(0, u32::MAX as i64) as u32;
    }
}

/// Represents a player in the game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Unique ID for this player
    pub id: PlayerId,

    /// Player name
    pub name: PlayerName,

    /// Life total (zero or less means defeated)
    pub life: i32,

    /// Mana pool
    pub mana_pool: ManaPool,

    pub zones: PlayerZones,

    pub flags: TurnFlags,

    pub counters: PlayerCounters,

    pub conceded: bool,

    /// Maximum hand size (usually 7)
    pub max_hand_size: usize,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<PlayerName>, starting_life: i32) -> Self {
        Player {
            id,
            name: name.into(),
            life: starting_life,
            mana_pool: ManaPool::new(),
            zones: PlayerZones::new(),
            flags: TurnFlags::default(),
            counters: PlayerCounters::default(),
            conceded: false,
            max_hand_size: 7,
        }
    }

    pub fn gain_life(&mut self, amount: i32) {
        self.life += amount;
    }

    pub fn lose_life(&mut self, amount: i32) {
        self.life -= amount;
    }

    pub fn is_alive(&self) -> bool {
        self.life > 0 && !self.conceded && self.counters.poison < 10
    }

    pub fn has_lost(&self) -> bool {
        !self.is_alive()
    }

    pub fn hand_size(&self) -> usize {
        self.zones.hand.len()
    }

    pub fn hand_is_full(&self) -> bool {
        self.hand_size() >= self.max_hand_size
    }

    pub fn energy(&self) -> u32 {
        self.counters.energy
    }

    pub fn ability_used(&self, source: CardId, ability: &AbilityId) -> bool {
        self.flags.used_abilities.contains(&(source, ability.clone()))
    }

    /// Reset turn flags and empty the mana pool (new turn)
    pub fn start_new_turn(&mut self) {
        self.flags = TurnFlags::default();
        self.mana_pool.clear();
    }
}

impl GameEntity<Player> for Player {
    fn id(&self) -> PlayerId {
        self.id
    }

    fn name(&self) -> &str {
        self.name.as_str()
    }
}
