//! Mana colors, cost expressions and mana pools

use crate::{MtgError, Result};
use nom::{
    branch::alt,
    character::complete::{char, digit1, multispace0, satisfy},
    combinator::{all_consuming, map_opt, map_res, opt},
    multi::many0,
    sequence::{delimited, pair, preceded, terminated},
    IResult,
};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Mana colors in MTG
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Color {
    White,
    Blue,
    Black,
    Red,
    Green,
    Colorless,
}

impl Color {
    /// All mana types in WUBRGC order (the order generic costs are paid in)
    pub const ALL: [Color; 6] = [
        Color::White,
        Color::Blue,
        Color::Black,
        Color::Red,
        Color::Green,
        Color::Colorless,
    ];

    pub fn symbol(self) -> char {
        match self {
            Color::White => 'W',
            Color::Blue => 'U',
            Color::Black => 'B',
            Color::Red => 'R',
            Color::Green => 'G',
            Color::Colorless => 'C',
        }
    }

    /// Case-insensitive lookup from a mana symbol letter
    pub fn from_symbol(c: char) -> Option<Color> {
        match c.to_ascii_uppercase() {
            'W' => Some(Color::White),
            'U' => Some(Color::Blue),
            'B' => Some(Color::Black),
            'R' => Some(Color::Red),
            'G' => Some(Color::Green),
            'C' => Some(Color::Colorless),
            _ => None,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl std::str::FromStr for Color {
    type Err = MtgError;

    fn from_str(s: &str) -> Result<Self> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Color::from_symbol(c)
                .ok_or_else(|| MtgError::ParseError(format!("unknown color '{s}'"))),
            _ => match s.trim().to_ascii_lowercase().as_str() {
                "white" => Ok(Color::White),
                "blue" => Ok(Color::Blue),
                "black" => Ok(Color::Black),
                "red" => Ok(Color::Red),
                "green" => Ok(Color::Green),
                "colorless" => Ok(Color::Colorless),
                _ => Err(MtgError::ParseError(format!("unknown color '{s}'"))),
            },
        }
    }
}

/// One side of a hybrid symbol such as `{W/U}` or `{2/W}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HybridOption {
    Color(Color),
    Generic(u8),
}

impl fmt::Display for HybridOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HybridOption::Color(c) => write!(f, "{c}"),
            HybridOption::Generic(n) => write!(f, "{n}"),
        }
    }
}

/// A hybrid symbol, payable with either option (first option is tried first)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HybridSymbol {
    pub first: HybridOption,
    pub second: HybridOption,
}

impl fmt::Display for HybridSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}/{}}}", self.first, self.second)
    }
}

/// Parsed cost expression (e.g. `{2}{W}{W}`, `{W/U}{B/P}`, `{E}{E}`)
///
/// Parsing is pure. Energy and life are additional resources and do not count
/// towards the total.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ManaCost {
    pub generic: u8,
    pub white: u8,
    pub blue: u8,
    pub black: u8,
    pub red: u8,
    pub green: u8,
    pub colorless: u8,
    pub hybrid: SmallVec<[HybridSymbol; 2]>,
    /// Phyrexian symbols by color: pay one mana of the color or 2 life
    pub phyrexian: SmallVec<[Color; 2]>,
    pub snow: u8,
    pub energy: u8,
    pub life: u8,
}

/// Raw symbol content between braces, before interpretation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Part {
    Color(Color),
    Number(u8),
    Phyrexian,
    Snow,
    Energy,
    Life,
}

impl Part {
    fn from_letter(c: char) -> Option<Part> {
        if let Some(color) = Color::from_symbol(c) {
            return Some(Part::Color(color));
        }
        match c.to_ascii_uppercase() {
            'P' => Some(Part::Phyrexian),
            'S' => Some(Part::Snow),
            'E' => Some(Part::Energy),
            'L' => Some(Part::Life),
            _ => None,
        }
    }

    fn as_hybrid_option(self) -> Option<HybridOption> {
        match self {
            Part::Color(c) => Some(HybridOption::Color(c)),
            Part::Number(n) => Some(HybridOption::Generic(n)),
            _ => None,
        }
    }
}

fn part(input: &str) -> IResult<&str, Part> {
    alt((
        map_res(digit1, |digits: &str| digits.parse::<u8>().map(Part::Number)),
        map_opt(satisfy(|c| c.is_ascii_alphabetic()), Part::from_letter),
    ))(input)
}

fn symbol(input: &str) -> IResult<&str, (Part, Option<Part>)> {
    delimited(
        char('{'),
        pair(
            delimited(multispace0, part, multispace0),
            opt(preceded(
                char('/'),
                delimited(multispace0, part, multispace0),
            )),
        ),
        char('}'),
    )(input)
}

fn symbols(input: &str) -> IResult<&str, Vec<(Part, Option<Part>)>> {
    all_consuming(terminated(
        many0(preceded(multispace0, symbol)),
        multispace0,
    ))(input)
}

fn bump(counter: &mut u8, by: u8, expr: &str) -> Result<()> {
    *counter = counter
        .checked_add(by)
        .ok_or_else(|| MtgError::ParseError(format!("cost '{expr}' overflows")))?;
    Ok(())
}

impl ManaCost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a cost expression made of `{…}` symbols
    ///
    /// Single letters W/U/B/R/G/C are colored or colorless pips, digit runs are
    /// generic mana, `{a/b}` is hybrid unless one side is `P` (Phyrexian),
    /// and S/E/L are snow, energy and life. Empty input is a zero cost.
    pub fn parse(expr: &str) -> Result<Self> {
        let (_, parsed) = symbols(expr).map_err(|e| {
            let near = match &e {
                nom::Err::Error(inner) | nom::Err::Failure(inner) => inner.input,
                nom::Err::Incomplete(_) => "",
            };
            MtgError::ParseError(format!("invalid cost expression '{expr}' near '{near}'"))
        })?;

        let mut cost = ManaCost::new();
        for (first, second) in parsed {
            match (first, second) {
                (Part::Color(color), None) => bump(cost.pips_mut(color), 1, expr)?,
                (Part::Number(n), None) => bump(&mut cost.generic, n, expr)?,
                (Part::Snow, None) => bump(&mut cost.snow, 1, expr)?,
                (Part::Energy, None) => bump(&mut cost.energy, 1, expr)?,
                (Part::Life, None) => bump(&mut cost.life, 1, expr)?,
                (Part::Phyrexian, Some(Part::Color(color)))
                | (Part::Color(color), Some(Part::Phyrexian)) => cost.phyrexian.push(color),
                (a, Some(b)) => match (a.as_hybrid_option(), b.as_hybrid_option()) {
                    (Some(first), Some(second)) => {
                        cost.hybrid.push(HybridSymbol { first, second })
                    }
                    _ => {
                        return Err(MtgError::ParseError(format!(
                            "invalid two-part symbol in '{expr}'"
                        )))
                    }
                },
                (Part::Phyrexian, None) => {
                    return Err(MtgError::ParseError(format!(
                        "Phyrexian symbol without a color in '{expr}'"
                    )))
                }
            }
        }
        Ok(cost)
    }

    /// Number of pips of a color (colorless counts the `{C}` pips)
    pub fn pips(&self, color: Color) -> u8 {
        match color {
            Color::White => self.white,
            Color::Blue => self.blue,
            Color::Black => self.black,
            Color::Red => self.red,
            Color::Green => self.green,
            Color::Colorless => self.colorless,
        }
    }

    fn pips_mut(&mut self, color: Color) -> &mut u8 {
        match color {
            Color::White => &mut self.white,
            Color::Blue => &mut self.blue,
            Color::Black => &mut self.black,
            Color::Red => &mut self.red,
            Color::Green => &mut self.green,
            Color::Colorless => &mut self.colorless,
        }
    }

    /// Sum of colored pips (excludes `{C}`)
    pub fn colored(&self) -> u32 {
        [self.white, self.blue, self.black, self.red, self.green]
            .iter()
            .map(|&n| n as u32)
            .sum()
    }

    /// Total mana value: colored + colorless + generic + hybrid + Phyrexian + snow
    pub fn total(&self) -> u32 {
        self.colored()
            + self.colorless as u32
            + self.generic as u32
            + self.hybrid.len() as u32
            + self.phyrexian.len() as u32
            + self.snow as u32
    }

    pub fn is_zero(&self) -> bool {
        *self == ManaCost::default()
    }
}

impl std::str::FromStr for ManaCost {
    type Err = MtgError;

    fn from_str(s: &str) -> Result<Self> {
        ManaCost::parse(s)
    }
}

impl fmt::Display for ManaCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.generic > 0 {
            write!(f, "{{{}}}", self.generic)?;
        }
        for color in Color::ALL {
            for _ in 0..self.pips(color) {
                write!(f, "{{{color}}}")?;
            }
        }
        for symbol in &self.hybrid {
            write!(f, "{symbol}")?;
        }
        for color in &self.phyrexian {
            write!(f, "{{{color}/P}}")?;
        }
        for _ in 0..self.snow {
            write!(f, "{{S}}")?;
        }
        for _ in 0..self.energy {
            write!(f, "{{E}}")?;
        }
        for _ in 0..self.life {
            write!(f, "{{L}}")?;
        }
        Ok(())
    }
}

/// Mana pool for a player
/// Copy-eligible since it's just 6 u8 fields (6 bytes)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ManaPool {
    pub white: u8,
    pub blue: u8,
    pub black: u8,
    pub red: u8,
    pub green: u8,
    pub colorless: u8,
}

impl ManaPool {
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

    fn slot(&mut self, color: Color) -> &mut u8 {
        match color {
            Color::White => &mut self.white,
            Color::Blue => &mut self.blue,
            Color::Black => &mut self.black,
            Color::Red => &mut self.red,
            Color::Green => &mut self.green,
            Color::Colorless => &mut self.colorless,
        }
    }

    pub fn add_color(&mut self, color: Color) {
        self.add(color, 1);
    }

    /// Add mana of one color, saturating at the counter's maximum
    pub fn add(&mut self, color: Color, amount: u8) {
        let slot = self.slot(color);
        *slot = slot.saturating_add(amount);
    }

    /// Remove `amount` of a color; returns false (and changes nothing) if short
    pub fn remove(&mut self, color: Color, amount: u8) -> bool {
        let slot = self.slot(color);
        match slot.checked_sub(amount) {
            Some(rest) => {
                *slot = rest;
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        *self = ManaPool::default();
    }

    /// Total mana in pool
    pub fn total(&self) -> u32 {
        Color::ALL.iter().map(|&c| self.get(c) as u32).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

impl fmt::Display for ManaPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}W {}U {}B {}R {}G {}C",
            self.white, self.blue, self.black, self.red, self.green, self.colorless
        )
    }
}
