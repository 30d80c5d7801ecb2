//! Single-elimination bracket engine.
//!
//! This module provides:
//! - Bracket generation from a shuffled participant list, with byes
//! - Match result recording and winner propagation between rounds
//! - Injectable randomness for reproducible seeding
//! - Derived win/loss records

pub mod builder;
pub mod models;
pub mod progression;
pub mod random;

pub use builder::{MIN_PARTICIPANTS, generate, layout, start};
pub use models::{Bracket, BracketView, Match, MatchStatus, MatchView, Record};
pub use progression::{begin_match, record_result};
pub use random::{RandomSource, SeededRandom, ThreadRandom};
