//! Static card metadata
//!
//! One record per card definition, in the shape of the bulk card export
//! (`arena_id`, `name`, `mana_cost`, `type_line`, ...). Records only fill in
//! characteristics a card instance is missing; they never overwrite what a
//! game event reported.

use crate::core::{Capability, Card, CardType, Color, DefinitionId, Subtype, Supertype};
use serde::{Deserialize, Serialize};

/// Metadata for one card definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardMetadata {
    #[serde(default, alias = "definition_id")]
    pub arena_id: Option<u32>,

    pub name: String,

    #[serde(default)]
    pub mana_cost: String,

    /// e.g. "Legendary Creature — Elf Druid"
    #[serde(default)]
    pub type_line: String,

    #[serde(default)]
    pub oracle_text: String,

    /// Printed power; may be "*" or "1+*"
    #[serde(default)]
    pub power: Option<String>,

    #[serde(default)]
    pub toughness: Option<String>,

    #[serde(default)]
    pub keywords: Vec<String>,

    /// Color letters this permanent can tap for
    #[serde(default)]
    pub produced_mana: Vec<String>,
}

/// Parsed form of a type line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeLine {
    pub supertypes: Vec<Supertype>,
    pub types: Vec<CardType>,
    pub subtypes: Vec<Subtype>,
}

/// Split a type line into supertypes, types and subtypes
///
/// Only the front face of a double-faced card is used. Words that are
/// neither a supertype nor a card type are ignored.
pub fn parse_type_line(line: &str) -> TypeLine {
    let front = line.split("//").next().unwrap_or("");
    let (left, right) = match front.split_once('—') {
        Some(parts) => parts,
        None => front.split_once(" - ").unwrap_or((front, "")),
    };

    let mut parsed = TypeLine::default();
    for word in left.split_whitespace() {
        if let Ok(supertype) = word.parse::<Supertype>() {
            parsed.supertypes.push(supertype);
        } else if let Ok(card_type) = word.parse::<CardType>() {
            parsed.types.push(card_type);
        }
    }
    parsed.subtypes = right.split_whitespace().map(Subtype::new).collect();
    parsed
}

/// Printed power or toughness; anything non-numeric counts as zero
fn parse_stat(value: &Option<String>) -> Option<i8> {
    value
        .as_deref()
        .map(|v| v.trim().parse::<i8>().unwrap_or(0))
}

impl CardMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        CardMetadata {
            arena_id: None,
            name: name.into(),
            mana_cost: String::new(),
            type_line: String::new(),
            oracle_text: String::new(),
            power: None,
            toughness: None,
            keywords: Vec::new(),
            produced_mana: Vec::new(),
        }
    }

    pub fn type_line(&self) -> TypeLine {
        parse_type_line(&self.type_line)
    }

    /// Fill in whatever the card does not already carry
    pub fn fill(&self, card: &mut Card) {
        if card.definition_id.is_none() {
            card.definition_id = self.arena_id.map(DefinitionId);
        }
        if card.mana_cost.is_empty() {
            card.mana_cost = self.mana_cost.clone();
        }
        let line = self.type_line();
        if card.types.is_empty() {
            card.types = line.types.into_iter().collect();
        }
        if card.supertypes.is_empty() {
            card.supertypes = line.supertypes.into_iter().collect();
        }
        if card.subtypes.is_empty() {
            card.subtypes = line.subtypes.into_iter().collect();
        }
        if card.power.is_none() {
            card.power = parse_stat(&self.power);
        }
        if card.toughness.is_none() {
            card.toughness = parse_stat(&self.toughness);
        }
        if card.text.is_empty() {
            card.text = self.oracle_text.clone();
        }
        for keyword in &self.keywords {
            if !card.keywords.iter().any(|k| k.eq_ignore_ascii_case(keyword)) {
                card.add_keyword(keyword.as_str());
            }
        }
        if card.mana_colors.is_empty() {
            card.mana_colors = self
                .produced_mana
                .iter()
                .filter_map(|c| c.parse::<Color>().ok())
                .collect();
        }
        if !card.mana_colors.is_empty()
            && !card.is_land()
            && !card.has_capability(Capability::ManaSource)
        {
            card.capabilities.push(Capability::ManaSource);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CardId, PlayerId};

    #[test]
    fn test_parse_type_line() {
        let line = parse_type_line("Legendary Creature — Elf Druid");
        assert_eq!(line.supertypes, vec![Supertype::Legendary]);
        assert_eq!(line.types, vec![CardType::Creature]);
        assert_eq!(line.subtypes, vec![Subtype::new("Elf"), Subtype::new("Druid")]);

        let land = parse_type_line("Basic Snow Land - Forest");
        assert_eq!(land.supertypes, vec![Supertype::Basic, Supertype::Snow]);
        assert_eq!(land.subtypes, vec![Subtype::new("Forest")]);

        let dfc = parse_type_line("Creature — Human // Creature — Werewolf");
        assert_eq!(dfc.subtypes, vec![Subtype::new("Human")]);

        assert_eq!(parse_type_line(""), TypeLine::default());
    }

    #[test]
    fn test_fill_keeps_event_data() {
        let mut meta = CardMetadata::new("Llanowar Elves");
        meta.arena_id = Some(68_000);
        meta.mana_cost = "{G}".to_string();
        meta.type_line = "Creature — Elf Druid".to_string();
        meta.power = Some("1".to_string());
        meta.toughness = Some("1".to_string());
        meta.keywords = vec!["Haste".to_string()];
        meta.produced_mana = vec!["G".to_string()];

        let mut card = Card::new(CardId::new(7), "Llanowar Elves", PlayerId::new(0));
        card.power = Some(3);
        meta.fill(&mut card);

        assert_eq!(card.definition_id, Some(DefinitionId(68_000)));
        assert_eq!(card.mana_cost, "{G}");
        assert!(card.is_creature());
        assert_eq!(card.power, Some(3));
        assert_eq!(card.toughness, Some(1));
        assert!(card.has_capability(Capability::Haste));
        assert_eq!(card.mana_colors.as_slice(), &[Color::Green]);
        assert!(card.has_capability(Capability::ManaSource));
    }

    #[test]
    fn test_star_power_counts_as_zero() {
        let mut meta = CardMetadata::new("Tarmogoyf");
        meta.type_line = "Creature — Lhurgoyf".to_string();
        meta.power = Some("*".to_string());
        meta.toughness = Some("1+*".to_string());

        let mut card = Card::new(CardId::new(1), "Tarmogoyf", PlayerId::new(0));
        meta.fill(&mut card);
        assert_eq!(card.power, Some(0));
        assert_eq!(card.toughness, Some(0));
    }
}
