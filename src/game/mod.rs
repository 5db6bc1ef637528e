//! Match state, turn structure, priority and the legality pipeline

pub mod actions;
pub mod cache;
pub mod config;
pub mod engine;
pub mod events;
pub mod legality;
pub mod logger;
pub mod mana_engine;
pub mod mana_payment;
pub mod phase;
pub mod priority;
pub mod restrictions;
pub mod snapshot;
pub mod state;

#[cfg(test)]
mod turn_tests;

pub use actions::{Action, ActionKind, ActionTiming};
pub use cache::LegalActionCache;
pub use config::RulesConfig;
pub use engine::RulesEngine;
pub use events::{parse_events, CardResolver, EventCard, GameEvent, PlainResolver};
pub use legality::LegalitySummary;
pub use logger::{GameLogger, LogEntry, LogFormat, LogSink, VerbosityLevel};
pub use mana_engine::{ManaCapacity, ManaEngine, PoolSummary};
pub use mana_payment::PaymentPlan;
pub use phase::{Phase, Step, TurnStructure};
pub use priority::{PassOutcome, PriorityInfo, PriorityTracker};
pub use restrictions::Restriction;
pub use snapshot::{AttackerReport, BoardSummary, MatchSnapshot};
pub use state::{GameState, MatchStatus, SpendRecord, StackItem, StackObject, ValidationIssue};
