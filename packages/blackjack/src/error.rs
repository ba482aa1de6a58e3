use thiserror::Error;

use crate::{Action, GamePhase};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseCardError {
    #[error("invalid card string: {0:?}")]
    InvalidLength(String),
    #[error("invalid rank: {0:?}")]
    InvalidRank(String),
    #[error("invalid suit: {0:?}")]
    InvalidSuit(char),
}

#[derive(Error, Debug)]
pub enum ShoeError {
    #[error("failed to read shoe: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid card on line {line}: {source}")]
    InvalidCard {
        line: usize,
        #[source]
        source: ParseCardError,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("minimum bet is {min}")]
    BetBelowMinimum { min: u64 },

    #[error("bet of {bet} exceeds bank balance of {bank}")]
    BetExceedsBank { bet: u64, bank: u64 },

    #[error("insurance not available")]
    InsuranceNotAvailable,

    #[error("insurance bet cannot exceed half of the original bet ({max})")]
    InsuranceExceedsMax { max: u64 },

    #[error("action not allowed in {actual:?} phase (expected {expected:?})")]
    WrongPhase { expected: GamePhase, actual: GamePhase },

    #[error("invalid hand index {0}")]
    InvalidHandIndex(usize),

    #[error("cannot {action}: {reason}")]
    ActionNotLegal { action: Action, reason: &'static str },

    #[error("insufficient funds: need {needed}, bank has {available}")]
    InsufficientFunds { needed: u64, available: u64 },

    #[error("unknown action: {0:?}")]
    UnknownAction(String),
}
