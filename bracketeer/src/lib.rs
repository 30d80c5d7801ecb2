//! # Bracketeer
//!
//! Tournament lifecycle and single-elimination bracket engine.
//!
//! The engine admits teams and players into tournaments under capacity and
//! uniqueness rules, builds a seeded elimination bracket with byes, advances
//! winners round by round, and tracks rewards earned along the way through
//! claim, expiry and withdrawal.
//!
//! ## Architecture
//!
//! - Each tournament is owned by an actor task; all of its mutations are
//!   applied one at a time through a store commit.
//! - Storage, time and randomness sit behind traits ([`store::TournamentStore`],
//!   [`clock::Clock`], [`bracket::RandomSource`]) so tests can pin them down.
//! - Rule checks are pure functions over a proposed next state. A failed check
//!   aborts the commit and leaves the stored record untouched.
//!
//! ## Core Modules
//!
//! - [`tournament`]: tournament records, registration and the engine API
//! - [`bracket`]: bracket generation and match progression
//! - [`reward`]: reward ledger and withdrawals
//! - [`store`]: persistence traits and the in-memory store
//! - [`clock`]: time sources

/// Time sources.
pub mod clock;

/// Persistence traits and the in-memory store.
pub mod store;

/// Tournament lifecycle and engine API.
pub mod tournament;
pub use tournament::{
    Participant, ParticipantKind, Tournament, TournamentConfig, TournamentError,
    TournamentKind, TournamentManager, TournamentResult, TournamentStatus, TournamentView,
};

/// Bracket generation and match progression.
pub mod bracket;
pub use bracket::{Bracket, BracketView, Match, MatchStatus, MatchView, RandomSource};

/// Reward ledger.
pub mod reward;
pub use reward::{RewardError, RewardLedger, RewardResult};
