//! Tournament lifecycle: creation, registration, start, results, cancellation.
//!
//! This module provides:
//! - Tournament configuration and validation
//! - Team, solo and mixed registration under capacity and uniqueness rules
//! - One actor per tournament so concurrent requests are applied in order
//! - Read-model snapshots for callers
//!
//! ## Example
//!
//! ```no_run
//! use bracketeer::bracket::ThreadRandom;
//! use bracketeer::clock::SystemClock;
//! use bracketeer::store::MemoryStore;
//! use bracketeer::tournament::{
//!     ParticipantKind, TournamentConfig, TournamentKind, TournamentManager,
//! };
//! use chrono::{Duration, Utc};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = TournamentManager::new(
//!         Arc::new(MemoryStore::new()),
//!         Arc::new(SystemClock),
//!         Arc::new(ThreadRandom),
//!     );
//!
//!     let config = TournamentConfig::single_elimination(
//!         "Sunday Cup".to_string(),
//!         TournamentKind::Solo,
//!         Utc::now() + Duration::hours(2),
//!     )
//!     .with_max_players(16);
//!
//!     let tournament = manager.create_tournament(config).await?;
//!     manager
//!         .register(tournament.id, uuid::Uuid::new_v4(), ParticipantKind::Player)
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod actor;
pub mod errors;
pub mod manager;
pub mod messages;
pub mod models;
pub mod registration;

pub use actor::{TournamentActor, TournamentHandle};
pub use errors::{TournamentError, TournamentResult};
pub use manager::TournamentManager;
pub use messages::TournamentMessage;
pub use models::{
    Participant, ParticipantKind, TeamId, Tournament, TournamentConfig, TournamentFormat,
    TournamentId, TournamentKind, TournamentStatus, TournamentView, UserId,
};
