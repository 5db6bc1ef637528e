//! Card instances and their static characteristics

use crate::core::{
    AbilityId, CardId, CardName, Color, CounterType, DefinitionId, GameEntity, PlayerId, Subtype,
};
use crate::zones::{BattlefieldPartition, Zone};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Card types in MTG
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardType {
    Creature,
    Instant,
    Sorcery,
    Enchantment,
    Artifact,
    Land,
    Planeswalker,
    Battle,
    Tribal,
}

impl std::str::FromStr for CardType {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, ()> {
        match s.trim().to_ascii_lowercase().as_str() {
            "creature" => Ok(CardType::Creature),
            "instant" => Ok(CardType::Instant),
            "sorcery" => Ok(CardType::Sorcery),
            "enchantment" => Ok(CardType::Enchantment),
            "artifact" => Ok(CardType::Artifact),
            "land" => Ok(CardType::Land),
            "planeswalker" => Ok(CardType::Planeswalker),
            "battle" => Ok(CardType::Battle),
            "tribal" | "kindred" => Ok(CardType::Tribal),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Supertype {
    Legendary,
    Basic,
    Snow,
    World,
}

impl std::str::FromStr for Supertype {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, ()> {
        match s.trim().to_ascii_lowercase().as_str() {
            "legendary" => Ok(Supertype::Legendary),
            "basic" => Ok(Supertype::Basic),
            "snow" => Ok(Supertype::Snow),
            "world" => Ok(Supertype::World),
            _ => Err(()),
        }
    }
}

/// Rules-relevant capability tags, resolved from keywords when a card is loaded
///
/// Legality code only ever looks at these tags, never at rules text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    Defender,
    CantAttack,
    CantBlock,
    Haste,
    Flash,
    /// Artifact (or other nonland permanent) that can tap for mana
    ManaSource,
}

impl Capability {
    /// Map a keyword or keyword-like phrase to a capability tag
    pub fn from_keyword(keyword: &str) -> Option<Capability> {
        let normalized = keyword.trim().to_ascii_lowercase().replace('\u{2019}', "'");
        match normalized.as_str() {
            "defender" => Some(Capability::Defender),
            "can't attack" | "cant attack" => Some(Capability::CantAttack),
            "can't block" | "cant block" => Some(Capability::CantBlock),
            "haste" => Some(Capability::Haste),
            "flash" => Some(Capability::Flash),
            "mana source" | "mana ability" => Some(Capability::ManaSource),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbilityKind {
    Activated,
    Mana,
    Loyalty,
}

/// An activated ability of a permanent
///
/// The effect text is opaque; only the cost and the tap requirement matter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ability {
    pub id: AbilityId,
    /// Mana cost expression, without the tap symbol
    pub cost: String,
    pub requires_tap: bool,
    pub text: String,
    pub kind: AbilityKind,
}

impl Ability {
    pub fn new(id: impl Into<AbilityId>, cost: impl Into<String>, requires_tap: bool) -> Self {
        Ability {
            id: id.into(),
            cost: cost.into(),
            requires_tap,
            text: String::new(),
            kind: AbilityKind::Activated,
        }
    }
}

/// Who can see a card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Visibility {
    Public,
    OwnerOnly,
    Hidden,
}

impl Visibility {
    /// Default visibility of a card in a zone
    pub fn for_zone(zone: Zone) -> Self {
        match zone {
            Zone::Library => Visibility::Hidden,
            Zone::Hand => Visibility::OwnerOnly,
            _ => Visibility::Public,
        }
    }
}

/// Represents a card in the game
///
/// Cards have a unique CardId but many cards can share the same card definition.
/// This struct represents the instance of a card during gameplay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    /// Unique ID for this card instance
    pub id: CardId,

    /// Static card data this instance was created from, if known
    pub definition_id: Option<DefinitionId>,

    /// Card name (e.g., "Lightning Bolt")
    pub name: CardName,

    /// Cost expression, e.g. "{1}{R}"
    pub mana_cost: String,

    /// Card types (a card can be multiple types)
    pub types: SmallVec<[CardType; 2]>,

    pub supertypes: SmallVec<[Supertype; 1]>,

    /// Card subtypes (e.g., "Goblin", "Warrior")
    pub subtypes: SmallVec<[Subtype; 2]>,

    pub keywords: SmallVec<[String; 2]>,

    pub capabilities: SmallVec<[Capability; 2]>,

    pub abilities: SmallVec<[Ability; 1]>,

    /// Colors this permanent can produce when tapped for mana
    pub mana_colors: SmallVec<[Color; 2]>,

    /// Power (for creatures)
    pub power: Option<i8>,

    /// Toughness (for creatures)
    pub toughness: Option<i8>,

    /// Oracle text
    pub text: String,

    /// Player who owns this card
    pub owner: PlayerId,

    /// Current controller (can differ from owner)
    pub controller: PlayerId,

    pub zone: Zone,

    pub visibility: Visibility,

    pub tapped: bool,

    pub attacking: bool,

    /// Attacker this creature is blocking
    pub blocking: Option<CardId>,

    /// Turn number this permanent last entered the battlefield
    pub entered_battlefield_turn: Option<u32>,

    /// Counters on this card (using SmallVec for efficiency)
    /// Common counters: +1/+1, -1/-1, charge, loyalty
    pub counters: SmallVec<[(CounterType, u8); 2]>,
}

impl Card {
    pub fn new(id: CardId, name: impl Into<CardName>, owner: PlayerId) -> Self {
        Card {
            id,
            definition_id: None,
            name: name.into(),
            mana_cost: String::new(),
            types: SmallVec::new(),
            supertypes: SmallVec::new(),
            subtypes: SmallVec::new(),
            keywords: SmallVec::new(),
            capabilities: SmallVec::new(),
            abilities: SmallVec::new(),
            mana_colors: SmallVec::new(),
            power: None,
            toughness: None,
            text: String::new(),
            owner,
            controller: owner,
            zone: Zone::Library,
            visibility: Visibility::Hidden,
            tapped: false,
            attacking: false,
            blocking: None,
            entered_battlefield_turn: None,
            counters: SmallVec::new(),
        }
    }

    /// Builder helper for tests and card loading
    pub fn with_types(mut self, types: &[CardType]) -> Self {
        self.types = types.iter().copied().collect();
        self
    }

    pub fn with_cost(mut self, cost: impl Into<String>) -> Self {
        self.mana_cost = cost.into();
        self
    }

    pub fn with_stats(mut self, power: i8, toughness: i8) -> Self {
        self.power = Some(power);
        self.toughness = Some(toughness);
        self
    }

    pub fn with_supertype(mut self, supertype: Supertype) -> Self {
        if !self.supertypes.contains(&supertype) {
            self.supertypes.push(supertype);
        }
        self
    }

    pub fn with_subtype(mut self, subtype: impl Into<Subtype>) -> Self {
        self.subtypes.push(subtype.into());
        self
    }

    /// Add a keyword, resolving it to a capability tag when it has one
    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.add_keyword(keyword);
        self
    }

    pub fn with_ability(mut self, ability: Ability) -> Self {
        if ability.kind == AbilityKind::Mana && !self.has_capability(Capability::ManaSource) {
            self.capabilities.push(Capability::ManaSource);
        }
        self.abilities.push(ability);
        self
    }

    pub fn add_keyword(&mut self, keyword: impl Into<String>) {
        let keyword = keyword.into();
        if let Some(cap) = Capability::from_keyword(&keyword) {
            if !self.capabilities.contains(&cap) {
                self.capabilities.push(cap);
            }
        }
        self.keywords.push(keyword);
    }

    pub fn is_type(&self, card_type: CardType) -> bool {
        self.types.contains(&card_type)
    }

    pub fn is_creature(&self) -> bool {
        self.is_type(CardType::Creature)
    }

    pub fn is_land(&self) -> bool {
        self.is_type(CardType::Land)
    }

    pub fn is_artifact(&self) -> bool {
        self.is_type(CardType::Artifact)
    }

    pub fn is_instant(&self) -> bool {
        self.is_type(CardType::Instant)
    }

    pub fn is_planeswalker(&self) -> bool {
        self.is_type(CardType::Planeswalker)
    }

    pub fn is_legendary(&self) -> bool {
        self.supertypes.contains(&Supertype::Legendary)
    }

    pub fn has_capability(&self, cap: Capability) -> bool {
        self.capabilities.contains(&cap)
    }

    /// Can be cast outside sorcery timing
    pub fn has_instant_speed(&self) -> bool {
        self.is_instant() || self.has_capability(Capability::Flash)
    }

    pub fn is_permanent(&self) -> bool {
        !self.types.is_empty() && !self.is_instant() && !self.is_type(CardType::Sorcery)
    }

    /// Battlefield bucket, by first matching primary type
    pub fn partition(&self) -> BattlefieldPartition {
        if self.is_creature() {
            BattlefieldPartition::Creatures
        } else if self.is_land() {
            BattlefieldPartition::Lands
        } else if self.is_artifact() {
            BattlefieldPartition::Artifacts
        } else if self.is_type(CardType::Enchantment) {
            BattlefieldPartition::Enchantments
        } else if self.is_planeswalker() {
            BattlefieldPartition::Planeswalkers
        } else {
            BattlefieldPartition::Other
        }
    }

    /// Colors a land produces through its basic land types
    pub fn basic_land_colors(&self) -> SmallVec<[Color; 2]> {
        self.subtypes
            .iter()
            .filter_map(|s| match s.as_str() {
                "Plains" => Some(Color::White),
                "Island" => Some(Color::Blue),
                "Swamp" => Some(Color::Black),
                "Mountain" => Some(Color::Red),
                "Forest" => Some(Color::Green),
                "Wastes" => Some(Color::Colorless),
                _ => None,
            })
            .collect()
    }

    pub fn ability(&self, id: &AbilityId) -> Option<&Ability> {
        self.abilities.iter().find(|a| &a.id == id)
    }

    pub fn tap(&mut self) {
        self.tapped = true;
    }

    pub fn untap(&mut self) {
        self.tapped = false;
    }

    /// Drop combat and battlefield-only status when leaving the battlefield
    pub fn reset_battlefield_state(&mut self) {
        self.tapped = false;
        self.attacking = false;
        self.blocking = None;
        self.entered_battlefield_turn = None;
        self.counters.clear();
    }

    pub fn add_counter(&mut self, counter_type: CounterType, amount: u8) {
        if let Some((_, count)) = self.counters.iter_mut().find(|(t, _)| t == &counter_type) {
            *count = count.saturating_add(amount);
        } else {
            self.counters.push((counter_type, amount));
        }
    }

    /// Remove counters, never going below zero
    pub fn remove_counter(&mut self, counter_type: &CounterType, amount: u8) {
        if let Some((_, count)) = self.counters.iter_mut().find(|(t, _)| t == counter_type) {
            *count = count.saturating_sub(amount);
        }
        self.counters.retain(|(_, count)| *count > 0);
    }

    pub fn get_counter(&self, counter_type: &CounterType) -> u8 {
        self.counters
            .iter()
            .find(|(t, _)| t == counter_type)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }

    /// Get current power (including counters)
    pub fn current_power(&self) -> i32 {
        let base = self.power.unwrap_or(0) as i32;
        base + self.counter_delta()
    }

    /// Get current toughness (including counters)
    pub fn current_toughness(&self) -> i32 {
        let base = self.toughness.unwrap_or(0) as i32;
        base + self.counter_delta()
    }

    fn counter_delta(&self) -> i32 {
        self.get_counter(&CounterType::plus_one_plus_one()) as i32
            - self.get_counter(&CounterType::minus_one_minus_one()) as i32
    }
}

impl GameEntity<Card> for Card {
    fn id(&self) -> CardId {
        self.id
    }

    fn name(&self) -> &str {
        self.name.as_str()
    }
}
