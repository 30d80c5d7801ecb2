//! Tournament actor message types.

use super::{
    errors::TournamentResult,
    models::{Participant, Tournament},
};
use tokio::sync::oneshot;

/// Reply channel carrying the committed tournament state
pub type Reply = oneshot::Sender<TournamentResult<Tournament>>;

/// Messages that can be sent to a TournamentActor
#[derive(Debug)]
pub enum TournamentMessage {
    /// Admit a team or player
    Register {
        participant: Participant,
        response: Reply,
    },

    /// Remove a registered team or player
    Unregister {
        participant: Participant,
        response: Reply,
    },

    /// Generate the bracket and move into play
    Start { response: Reply },

    /// Mark a ready match as being played
    BeginMatch { match_number: u32, response: Reply },

    /// Record a played match
    RecordResult {
        match_number: u32,
        score1: u32,
        score2: u32,
        winner: Participant,
        response: Reply,
    },

    /// Cancel the tournament
    Cancel { response: Reply },
}
