//! Error types for the rules engine

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Pipeline stage at which an action was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LegalityStage {
    /// Match active, player registered and alive
    Basic,
    /// Step, priority and casting speed
    Timing,
    /// Zone membership and per-action shape checks
    Structural,
    /// Card restriction rules (land per turn, legend rule, ...)
    Restriction,
    /// Mana, life and energy affordability
    Resources,
}

impl fmt::Display for LegalityStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LegalityStage::Basic => write!(f, "basic"),
            LegalityStage::Timing => write!(f, "timing"),
            LegalityStage::Structural => write!(f, "structural"),
            LegalityStage::Restriction => write!(f, "restriction"),
            LegalityStage::Resources => write!(f, "resources"),
        }
    }
}

#[derive(Error, Debug)]
pub enum MtgError {
    /// Malformed cost expression
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Well-formed action that fails a legality stage
    #[error("Illegal action ({stage}): {reason}")]
    IllegalAction {
        stage: LegalityStage,
        reason: String,
    },

    /// Payment attempted without sufficient pool, life or energy
    #[error("Insufficient resources: {0}")]
    InsufficientResources(String),

    /// Internal state is inconsistent (caller bug or desynchronized state)
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Entity not found: {0}")]
    EntityNotFound(u32),

    #[error("Invalid game action: {0}")]
    InvalidAction(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Task join error: {0}")]
    JoinError(#[from] tokio::task::JoinError),
}

impl MtgError {
    pub fn illegal(stage: LegalityStage, reason: impl Into<String>) -> Self {
        MtgError::IllegalAction {
            stage,
            reason: reason.into(),
        }
    }

    /// Human-readable rejection reason for an illegal action, if this is one
    pub fn rejection_reason(&self) -> Option<&str> {
        match self {
            MtgError::IllegalAction { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for MtgError {
    fn from(e: serde_json::Error) -> Self {
        MtgError::SerializationError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MtgError>;
