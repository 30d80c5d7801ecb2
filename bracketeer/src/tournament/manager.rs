//! Tournament manager owning one actor per active tournament.

use super::{
    actor::{TournamentActor, TournamentHandle},
    errors::{TournamentError, TournamentResult},
    messages::{Reply, TournamentMessage},
    models::{
        Participant, ParticipantKind, Tournament, TournamentConfig, TournamentId,
        TournamentStatus, TournamentView,
    },
};
use crate::{
    bracket::{RandomSource, Record},
    clock::Clock,
    store::TournamentStore,
};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Public entry point of the tournament engine
///
/// Reads go straight to the store. Every mutation is routed through the
/// tournament's actor, spawned on first use and retired once the tournament
/// reaches a terminal status.
#[derive(Clone)]
pub struct TournamentManager {
    /// Tournament records
    store: Arc<dyn TournamentStore>,

    /// Time source
    clock: Arc<dyn Clock>,

    /// Bracket shuffle source
    random: Arc<dyn RandomSource>,

    /// Active actor handles
    actors: Arc<RwLock<HashMap<TournamentId, TournamentHandle>>>,
}

impl TournamentManager {
    /// Create a new tournament manager
    ///
    /// # Arguments
    ///
    /// * `store` - Tournament store
    /// * `clock` - Time source for deadlines
    /// * `random` - Shuffle source for bracket generation
    ///
    /// # Returns
    ///
    /// * `TournamentManager` - New manager with no running actors
    pub fn new(
        store: Arc<dyn TournamentStore>,
        clock: Arc<dyn Clock>,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            store,
            clock,
            random,
            actors: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create a new tournament in the registration phase
    pub async fn create_tournament(
        &self,
        config: TournamentConfig,
    ) -> TournamentResult<TournamentView> {
        config.validate()?;

        let tournament = Tournament::new(Uuid::new_v4(), config, self.clock.now());
        let capacity = tournament.capacity();
        let view = tournament.view();
        self.store.insert(tournament).await?;

        log::info!(
            "Created {} tournament {} '{}' (capacity {})",
            view.kind,
            view.id,
            view.name,
            capacity
        );
        Ok(view)
    }

    /// Get a tournament snapshot
    pub async fn get(&self, id: TournamentId) -> TournamentResult<TournamentView> {
        Ok(self.store.load(id).await?.view())
    }

    /// List tournaments, newest first
    pub async fn list(
        &self,
        status: Option<TournamentStatus>,
    ) -> TournamentResult<Vec<TournamentView>> {
        let tournaments = self.store.list(status).await?;
        Ok(tournaments.iter().map(Tournament::view).collect())
    }

    /// Register a team or player
    ///
    /// # Arguments
    ///
    /// * `id` - Tournament ID
    /// * `reference` - Team or user ID
    /// * `kind` - Whether `reference` names a team or a player
    pub async fn register(
        &self,
        id: TournamentId,
        reference: Uuid,
        kind: ParticipantKind,
    ) -> TournamentResult<TournamentView> {
        let participant = Participant::new(kind, reference);
        self.dispatch(id, |response| TournamentMessage::Register {
            participant,
            response,
        })
        .await
    }

    /// Remove a registration while registration is open
    pub async fn unregister(
        &self,
        id: TournamentId,
        participant: Participant,
    ) -> TournamentResult<TournamentView> {
        self.dispatch(id, |response| TournamentMessage::Unregister {
            participant,
            response,
        })
        .await
    }

    /// Generate the bracket and start the tournament
    pub async fn start(&self, id: TournamentId) -> TournamentResult<TournamentView> {
        self.dispatch(id, |response| TournamentMessage::Start { response })
            .await
    }

    /// Mark a ready match as being played
    pub async fn begin_match(
        &self,
        id: TournamentId,
        match_number: u32,
    ) -> TournamentResult<TournamentView> {
        self.dispatch(id, |response| TournamentMessage::BeginMatch {
            match_number,
            response,
        })
        .await
    }

    /// Record a match result
    ///
    /// # Arguments
    ///
    /// * `id` - Tournament ID
    /// * `match_number` - Match to record
    /// * `score1` / `score2` - Scores of the first and second slot
    /// * `winner` - One of the two slot occupants
    pub async fn record_result(
        &self,
        id: TournamentId,
        match_number: u32,
        score1: u32,
        score2: u32,
        winner: Participant,
    ) -> TournamentResult<TournamentView> {
        self.dispatch(id, |response| TournamentMessage::RecordResult {
            match_number,
            score1,
            score2,
            winner,
            response,
        })
        .await
    }

    /// Cancel a tournament that has not completed
    pub async fn cancel(&self, id: TournamentId) -> TournamentResult<TournamentView> {
        self.dispatch(id, |response| TournamentMessage::Cancel { response })
            .await
    }

    /// Win/loss record of one participant, derived from the bracket
    pub async fn participant_record(
        &self,
        id: TournamentId,
        participant: Participant,
    ) -> TournamentResult<Record> {
        let tournament = self.store.load(id).await?;
        Ok(tournament
            .bracket
            .as_ref()
            .map(|bracket| bracket.record_for(&participant))
            .unwrap_or_default())
    }

    /// Number of running tournament actors
    pub async fn active_actor_count(&self) -> usize {
        self.actors.read().await.len()
    }

    /// Send a request to the tournament's actor and retire it when done
    async fn dispatch(
        &self,
        id: TournamentId,
        build: impl FnOnce(Reply) -> TournamentMessage,
    ) -> TournamentResult<TournamentView> {
        let handle = self.handle_for(id).await;
        let result = handle.request(build).await;

        match &result {
            Ok(tournament) if tournament.is_terminal() => self.retire(id).await,
            Err(TournamentError::NotFound(_)) => self.retire(id).await,
            _ => {}
        }

        result.map(|tournament| tournament.view())
    }

    /// Get the handle for `id`, spawning its actor if none is running
    async fn handle_for(&self, id: TournamentId) -> TournamentHandle {
        {
            let actors = self.actors.read().await;
            if let Some(handle) = actors.get(&id) {
                return handle.clone();
            }
        }

        let mut actors = self.actors.write().await;
        // Another caller may have spawned it between the two locks
        if let Some(handle) = actors.get(&id) {
            return handle.clone();
        }

        let (actor, handle) = TournamentActor::new(
            id,
            self.store.clone(),
            self.clock.clone(),
            self.random.clone(),
        );
        actors.insert(id, handle.clone());
        drop(actors);

        tokio::spawn(async move {
            actor.run().await;
        });

        handle
    }

    /// Drop the manager's handle; the actor stops once in-flight requests finish
    async fn retire(&self, id: TournamentId) {
        if self.actors.write().await.remove(&id).is_some() {
            log::debug!("Retired actor for tournament {}", id);
        }
    }
}
