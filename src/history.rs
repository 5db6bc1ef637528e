//! Change log of match state transitions
//!
//! Every named transition on `GameState` records a `StateChange` here. The
//! broadcast layer drains the log after each batch of updates.

use crate::core::{CardId, Color, PlayerCounter, PlayerId};
use crate::game::{MatchStatus, Step};
use crate::zones::Zone;
use serde::{Deserialize, Serialize};

/// Per-turn flags whose setting is observable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnFlag {
    LandPlayed,
    Attacked,
    AbilityUsed { source: CardId, ability: String },
}

/// Atomic state transitions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateChange {
    StatusChanged {
        from: MatchStatus,
        to: MatchStatus,
    },

    /// Step advanced within a turn (or wrapped into a new one)
    StepChanged {
        from: Step,
        to: Step,
        turn: u32,
    },

    TurnChanged {
        turn: u32,
        active_player: PlayerId,
    },

    PriorityChanged {
        player: Option<PlayerId>,
    },

    PriorityPassed {
        player: PlayerId,
    },

    CardMoved {
        card: CardId,
        from: Zone,
        to: Zone,
        controller: PlayerId,
    },

    CardTapped {
        card: CardId,
        tapped: bool,
    },

    LifeChanged {
        player: PlayerId,
        old: i32,
        new: i32,
    },

    ManaAdded {
        player: PlayerId,
        color: Color,
        amount: u8,
    },

    /// A cost was paid out of the player's pool, life or energy
    ManaSpent {
        player: PlayerId,
        cost: String,
    },

    PoolEmptied {
        player: PlayerId,
    },

    CounterChanged {
        player: PlayerId,
        counter: PlayerCounter,
        value: u32,
    },

    FlagSet {
        player: PlayerId,
        flag: TurnFlag,
    },

    StackPushed {
        card: CardId,
        controller: PlayerId,
    },

    /// A stack object left the stack; `to` is where a spell's card went
    StackResolved {
        card: CardId,
        controller: PlayerId,
        to: Option<Zone>,
    },
}

/// Ordered log of state changes since the last drain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeLog {
    changes: Vec<StateChange>,

    /// Is recording enabled? (disabled for benchmarks)
    enabled: bool,

    /// Total number of changes ever recorded, including drained ones
    recorded: u64,
}

impl ChangeLog {
    pub fn new() -> Self {
        ChangeLog {
            changes: Vec::new(),
            enabled: true,
            recorded: 0,
        }
    }

    /// Create a log that drops everything
    pub fn disabled() -> Self {
        ChangeLog {
            changes: Vec::new(),
            enabled: false,
            recorded: 0,
        }
    }

    pub fn record(&mut self, change: StateChange) {
        if self.enabled {
            self.changes.push(change);
            self.recorded += 1;
        }
    }

    /// Take all pending changes, oldest first
    pub fn drain(&mut self) -> Vec<StateChange> {
        std::mem::take(&mut self.changes)
    }

    pub fn peek(&self) -> Option<&StateChange> {
        self.changes.last()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn total_recorded(&self) -> u64 {
        self.recorded
    }

    pub fn changes(&self) -> &[StateChange] {
        &self.changes
    }

    pub fn clear(&mut self) {
        self.changes.clear();
    }
}

impl Default for ChangeLog {
    fn default() -> Self {
        Self::new()
    }
}
