//! Zones and the per-player card lists behind them
//!
//! Every zone except the battlefield and the shared stack is an ordered list
//! owned by the card's owner. The battlefield is held by the controller and
//! split into partitions by primary type so that creature and land scans
//! stay short.

use crate::core::CardId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Library,
    Hand,
    Battlefield,
    Graveyard,
    Exile,
    Stack,
    Command,
}

impl Zone {
    pub fn name(self) -> &'static str {
        match self {
            Zone::Library => "library",
            Zone::Hand => "hand",
            Zone::Battlefield => "battlefield",
            Zone::Graveyard => "graveyard",
            Zone::Exile => "exile",
            Zone::Stack => "stack",
            Zone::Command => "command",
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered card list; for the library the last card is the top
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneList(Vec<CardId>);

impl ZoneList {
    pub fn push(&mut self, card: CardId) {
        self.0.push(card);
    }

    /// Order-preserving removal; hand order is visible to clients
    pub fn remove(&mut self, card: CardId) -> bool {
        match self.0.iter().position(|&id| id == card) {
            Some(pos) => {
                self.0.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, card: CardId) -> bool {
        self.0.contains(&card)
    }

    pub fn top(&self) -> Option<CardId> {
        self.0.last().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = CardId> + '_ {
        self.0.iter().copied()
    }
}

/// Battlefield bucket a permanent is filed under on entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BattlefieldPartition {
    Creatures,
    Lands,
    Artifacts,
    Enchantments,
    Planeswalkers,
    Other,
}

/// Permanents one player controls
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Battlefield {
    partitions: [Vec<CardId>; 6],
}

impl Battlefield {
    pub fn partition(&self, partition: BattlefieldPartition) -> &[CardId] {
        &self.partitions[partition as usize]
    }

    pub fn add(&mut self, card: CardId, partition: BattlefieldPartition) {
        self.partitions[partition as usize].push(card);
    }

    pub fn remove(&mut self, card: CardId) -> bool {
        for bucket in &mut self.partitions {
            if let Some(pos) = bucket.iter().position(|&id| id == card) {
                bucket.remove(pos);
                return true;
            }
        }
        false
    }

    pub fn contains(&self, card: CardId) -> bool {
        self.partitions.iter().any(|bucket| bucket.contains(&card))
    }

    /// Creatures first, then lands, then the rest
    pub fn iter(&self) -> impl Iterator<Item = CardId> + '_ {
        self.partitions.iter().flatten().copied()
    }

    pub fn len(&self) -> usize {
        self.partitions.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.iter().all(Vec::is_empty)
    }
}

/// All zones a player owns, plus the permanents they control
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerZones {
    pub library: ZoneList,
    pub hand: ZoneList,
    pub graveyard: ZoneList,
    pub exile: ZoneList,
    pub command: ZoneList,
    pub battlefield: Battlefield,
}

impl PlayerZones {
    pub fn new() -> Self {
        Self::default()
    }

    /// The ordered list behind `zone`; `None` for the battlefield and stack
    pub fn list(&self, zone: Zone) -> Option<&ZoneList> {
        match zone {
            Zone::Library => Some(&self.library),
            Zone::Hand => Some(&self.hand),
            Zone::Graveyard => Some(&self.graveyard),
            Zone::Exile => Some(&self.exile),
            Zone::Command => Some(&self.command),
            Zone::Battlefield | Zone::Stack => None,
        }
    }

    pub fn list_mut(&mut self, zone: Zone) -> Option<&mut ZoneList> {
        match zone {
            Zone::Library => Some(&mut self.library),
            Zone::Hand => Some(&mut self.hand),
            Zone::Graveyard => Some(&mut self.graveyard),
            Zone::Exile => Some(&mut self.exile),
            Zone::Command => Some(&mut self.command),
            Zone::Battlefield | Zone::Stack => None,
        }
    }

    pub fn contains(&self, zone: Zone, card: CardId) -> bool {
        match zone {
            Zone::Battlefield => self.battlefield.contains(card),
            other => self.list(other).is_some_and(|list| list.contains(card)),
        }
    }

    /// Every ordered list with its zone
    pub fn lists(&self) -> [(Zone, &ZoneList); 5] {
        [
            (Zone::Library, &self.library),
            (Zone::Hand, &self.hand),
            (Zone::Graveyard, &self.graveyard),
            (Zone::Exile, &self.exile),
            (Zone::Command, &self.command),
        ]
    }
}
