//! Core game types and entities

pub mod card;
pub mod entity;
pub mod mana;
pub mod player;
pub mod types;

pub use card::{Ability, AbilityKind, Capability, Card, CardType, Supertype, Visibility};
pub use entity::{EntityId, EntityStore, GameEntity};
pub use mana::{Color, HybridOption, HybridSymbol, ManaCost, ManaPool};
pub use player::{Player, PlayerCounter, PlayerCounters, TurnFlags};
pub use types::{AbilityId, CardName, CounterType, DefinitionId, PlayerName, Subtype};

pub type CardId = EntityId<Card>;
pub type PlayerId = EntityId<Player>;
