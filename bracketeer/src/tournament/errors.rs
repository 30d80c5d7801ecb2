//! Tournament error types.

use super::models::{Participant, TournamentId, TournamentKind};
use crate::store::StoreError;
use thiserror::Error;

/// Tournament errors
#[derive(Debug, Error)]
pub enum TournamentError {
    #[error("Tournament not found: {0}")]
    NotFound(TournamentId),

    #[error("Match {0} not found")]
    MatchNotFound(u32),

    #[error("Registration is closed")]
    RegistrationClosed,

    #[error("{0} is already registered")]
    AlreadyRegistered(Participant),

    #[error("{0} is not registered")]
    NotRegistered(Participant),

    #[error("{participant} cannot enter a {kind} tournament")]
    ParticipantKindMismatch {
        participant: Participant,
        kind: TournamentKind,
    },

    #[error("Tournament is full: capacity {capacity}")]
    CapacityExceeded { capacity: usize },

    #[error("Insufficient participants: need {needed}, have {current}")]
    InsufficientParticipants { needed: usize, current: usize },

    #[error("Tournament cannot start: {0}")]
    NotStartable(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("{winner} did not play in match {match_number}")]
    InvalidWinner {
        match_number: u32,
        winner: Participant,
    },

    /// Structural corruption: the next-round slot is already taken
    #[error("Destination slot occupied in round {round} match {match_number}")]
    DestinationSlotOccupied { round: u32, match_number: u32 },

    /// A proposed next state broke a standing invariant
    #[error("Invariant violated: {0}")]
    Corrupted(String),

    #[error("Invalid tournament configuration: {0}")]
    InvalidConfig(String),

    /// The tournament's actor is gone
    #[error("Tournament engine closed")]
    EngineClosed,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl TournamentError {
    /// Get a client-safe error message
    ///
    /// Store failures and corruption signals are reduced to a generic message
    /// so internal ids and storage details never reach a caller.
    pub fn client_message(&self) -> String {
        match self {
            TournamentError::Store(_)
            | TournamentError::Corrupted(_)
            | TournamentError::DestinationSlotOccupied { .. }
            | TournamentError::EngineClosed => "Internal server error".to_string(),
            TournamentError::NotFound(_) => "Tournament not found".to_string(),
            _ => self.to_string(),
        }
    }

    /// Whether this error signals structural corruption rather than a bad request
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            TournamentError::DestinationSlotOccupied { .. } | TournamentError::Corrupted(_)
        )
    }
}

/// Result type for tournament operations
pub type TournamentResult<T> = Result<T, TournamentError>;
