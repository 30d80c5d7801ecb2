//! Per-tournament actor serializing every mutation of one tournament.

use super::{
    errors::{TournamentError, TournamentResult},
    messages::{Reply, TournamentMessage},
    models::{Participant, Tournament, TournamentId},
    registration,
};
use crate::{
    bracket::{self, RandomSource},
    clock::Clock,
    store::{TournamentMutation, TournamentStore},
};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Inbox depth per tournament
const INBOX_CAPACITY: usize = 100;

/// Tournament actor handle for sending messages
#[derive(Clone)]
pub struct TournamentHandle {
    sender: mpsc::Sender<TournamentMessage>,
}

impl TournamentHandle {
    /// Create a new tournament handle
    pub fn new(sender: mpsc::Sender<TournamentMessage>) -> Self {
        Self { sender }
    }

    /// Send a message and wait for the actor's reply
    pub async fn request(
        &self,
        build: impl FnOnce(Reply) -> TournamentMessage,
    ) -> TournamentResult<Tournament> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(build(tx))
            .await
            .map_err(|_| TournamentError::EngineClosed)?;
        rx.await.map_err(|_| TournamentError::EngineClosed)?
    }
}

/// Actor owning the mutation path of a single tournament
///
/// Runs until every handle is dropped. Each message becomes exactly one store
/// commit, so two requests for the same tournament never interleave.
pub struct TournamentActor {
    id: TournamentId,
    inbox: mpsc::Receiver<TournamentMessage>,
    store: Arc<dyn TournamentStore>,
    clock: Arc<dyn Clock>,
    random: Arc<dyn RandomSource>,
}

impl TournamentActor {
    /// Create a new tournament actor
    ///
    /// # Arguments
    ///
    /// * `id` - Tournament ID
    /// * `store` - Store holding the tournament record
    /// * `clock` - Time source for deadline checks
    /// * `random` - Shuffle source for bracket generation
    ///
    /// # Returns
    ///
    /// * `(TournamentActor, TournamentHandle)` - Actor and handle for sending messages
    pub fn new(
        id: TournamentId,
        store: Arc<dyn TournamentStore>,
        clock: Arc<dyn Clock>,
        random: Arc<dyn RandomSource>,
    ) -> (Self, TournamentHandle) {
        let (sender, inbox) = mpsc::channel(INBOX_CAPACITY);

        let actor = Self {
            id,
            inbox,
            store,
            clock,
            random,
        };

        (actor, TournamentHandle::new(sender))
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        log::debug!("Tournament {} actor starting", self.id);

        while let Some(message) = self.inbox.recv().await {
            self.handle_message(message).await;
        }

        log::debug!("Tournament {} actor stopped", self.id);
    }

    async fn handle_message(&self, message: TournamentMessage) {
        match message {
            TournamentMessage::Register {
                participant,
                response,
            } => {
                let result = self.handle_register(participant).await;
                let _ = response.send(result);
            }

            TournamentMessage::Unregister {
                participant,
                response,
            } => {
                let now = self.clock.now();
                let result = self
                    .commit(Box::new(move |t: &mut Tournament| {
                        registration::remove(t, participant, now)
                    }))
                    .await;
                if result.is_ok() {
                    log::info!("Tournament {}: {} unregistered", self.id, participant);
                }
                let _ = response.send(result);
            }

            TournamentMessage::Start { response } => {
                let now = self.clock.now();
                let random = self.random.clone();
                let result = self
                    .commit(Box::new(move |t: &mut Tournament| {
                        bracket::start(t, now, random.as_ref())
                    }))
                    .await;
                let _ = response.send(result);
            }

            TournamentMessage::BeginMatch {
                match_number,
                response,
            } => {
                let result = self
                    .commit(Box::new(move |t: &mut Tournament| {
                        bracket::begin_match(t, match_number)
                    }))
                    .await;
                let _ = response.send(result);
            }

            TournamentMessage::RecordResult {
                match_number,
                score1,
                score2,
                winner,
                response,
            } => {
                let now = self.clock.now();
                let result = self
                    .commit(Box::new(move |t: &mut Tournament| {
                        bracket::record_result(t, match_number, score1, score2, winner, now)
                    }))
                    .await;
                let _ = response.send(result);
            }

            TournamentMessage::Cancel { response } => {
                let result = self.commit(Box::new(registration::cancel)).await;
                if result.is_ok() {
                    log::info!("Tournament {} cancelled", self.id);
                }
                let _ = response.send(result);
            }
        }
    }

    async fn handle_register(&self, participant: Participant) -> TournamentResult<Tournament> {
        let now = self.clock.now();
        let result = self
            .commit(Box::new(move |t: &mut Tournament| {
                registration::admit(t, participant, now)
            }))
            .await;

        match &result {
            Ok(t) => log::info!(
                "Tournament {}: {} registered ({}/{})",
                self.id,
                participant,
                t.participant_count(),
                t.capacity()
            ),
            Err(e) => log::debug!(
                "Tournament {}: registration of {} rejected: {}",
                self.id,
                participant,
                e
            ),
        }

        result
    }

    /// Commit `mutation` followed by an invariant check of the proposed state
    async fn commit(&self, mutation: TournamentMutation) -> TournamentResult<Tournament> {
        let result = self
            .store
            .commit(
                self.id,
                Box::new(move |t: &mut Tournament| {
                    mutation(t)?;
                    t.check_invariants()
                }),
            )
            .await;

        if let Err(e) = &result
            && e.is_corruption()
        {
            log::error!("Tournament {} mutation aborted: {}", self.id, e);
        }

        result
    }
}
