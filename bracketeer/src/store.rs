//! Store traits and the in-memory implementation.
//!
//! The engine never talks to a database directly. Every durable mutation goes
//! through `commit`, which applies a mutation closure to a copy of the current
//! record and swaps the copy in only if the closure succeeds. A failed closure
//! therefore leaves the stored record untouched.

use crate::reward::{
    PlayerReward, PlayerRewardId, RewardError, RewardResult, RewardStatus, TeamReward,
    TeamRewardId,
};
use crate::tournament::{
    Tournament, TournamentError, TournamentId, TournamentResult, TournamentStatus,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::hash::Hash;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Infrastructure failures raised by a store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend unreachable or refused the operation
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Conditional write lost against a concurrent writer
    #[error("Write conflict on {id}: expected version {expected}, found {actual}")]
    Conflict { id: Uuid, expected: u64, actual: u64 },

    /// Insert of an id that already exists
    #[error("Record already exists: {0}")]
    Duplicate(Uuid),
}

/// Result type for raw store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Mutation applied to the current tournament inside a commit
pub type TournamentMutation = Box<dyn FnOnce(&mut Tournament) -> TournamentResult<()> + Send>;

/// Mutation applied to the current player reward inside a commit
pub type PlayerRewardMutation = Box<dyn FnOnce(&mut PlayerReward) -> RewardResult<()> + Send>;

/// Mutation applied to the current team reward inside a commit
pub type TeamRewardMutation = Box<dyn FnOnce(&mut TeamReward) -> RewardResult<()> + Send>;

/// Trait for tournament persistence
#[async_trait]
pub trait TournamentStore: Send + Sync {
    /// Insert a new tournament
    async fn insert(&self, tournament: Tournament) -> TournamentResult<()>;

    /// Load a tournament by id
    async fn load(&self, id: TournamentId) -> TournamentResult<Tournament>;

    /// Atomically apply `mutation` to the current state and persist the result
    ///
    /// Increments `version` on success. Returns the committed state.
    async fn commit(
        &self,
        id: TournamentId,
        mutation: TournamentMutation,
    ) -> TournamentResult<Tournament>;

    /// List tournaments, newest first, optionally filtered by status
    async fn list(&self, status: Option<TournamentStatus>) -> TournamentResult<Vec<Tournament>>;
}

/// Trait for reward instance persistence
#[async_trait]
pub trait RewardStore: Send + Sync {
    /// Insert a new player reward
    async fn insert_player_reward(&self, reward: PlayerReward) -> RewardResult<()>;

    /// Load a player reward by id
    async fn load_player_reward(&self, id: PlayerRewardId) -> RewardResult<PlayerReward>;

    /// Atomically mutate a player reward
    async fn commit_player_reward(
        &self,
        id: PlayerRewardId,
        mutation: PlayerRewardMutation,
    ) -> RewardResult<PlayerReward>;

    /// List player rewards, optionally filtered by status
    async fn list_player_rewards(
        &self,
        status: Option<RewardStatus>,
    ) -> RewardResult<Vec<PlayerReward>>;

    /// Insert a new team reward
    async fn insert_team_reward(&self, reward: TeamReward) -> RewardResult<()>;

    /// Load a team reward by id
    async fn load_team_reward(&self, id: TeamRewardId) -> RewardResult<TeamReward>;

    /// Atomically mutate a team reward
    async fn commit_team_reward(
        &self,
        id: TeamRewardId,
        mutation: TeamRewardMutation,
    ) -> RewardResult<TeamReward>;

    /// List team rewards, optionally filtered by status
    async fn list_team_rewards(&self, status: Option<RewardStatus>)
    -> RewardResult<Vec<TeamReward>>;
}

/// In-memory store backing both traits
///
/// Each record map sits behind its own lock; a commit holds the write lock only
/// while the mutation runs on the copy and the copy is swapped in.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tournaments: RwLock<HashMap<TournamentId, Tournament>>,
    player_rewards: RwLock<HashMap<PlayerRewardId, PlayerReward>>,
    team_rewards: RwLock<HashMap<TeamRewardId, TeamReward>>,
    injected_failure: std::sync::Mutex<Option<StoreError>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next commit fail with `error` without touching any record
    pub fn inject_failure(&self, error: StoreError) {
        *self
            .injected_failure
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(error);
    }

    fn take_failure(&self) -> StoreResult<()> {
        match self
            .injected_failure
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// Run `mutation` against a copy of `map[id]` and swap the copy in on success
fn apply<K, V, E>(
    map: &mut HashMap<K, V>,
    id: K,
    mutation: impl FnOnce(&mut V) -> Result<(), E>,
    not_found: impl FnOnce() -> E,
) -> Result<V, E>
where
    K: Eq + Hash,
    V: Clone,
{
    let Some(current) = map.get_mut(&id) else {
        return Err(not_found());
    };
    let mut next = current.clone();
    mutation(&mut next)?;
    *current = next.clone();
    Ok(next)
}

#[async_trait]
impl TournamentStore for MemoryStore {
    async fn insert(&self, tournament: Tournament) -> TournamentResult<()> {
        let mut tournaments = self.tournaments.write().await;
        if tournaments.contains_key(&tournament.id) {
            return Err(StoreError::Duplicate(tournament.id).into());
        }
        tournaments.insert(tournament.id, tournament);
        Ok(())
    }

    async fn load(&self, id: TournamentId) -> TournamentResult<Tournament> {
        self.tournaments
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(TournamentError::NotFound(id))
    }

    async fn commit(
        &self,
        id: TournamentId,
        mutation: TournamentMutation,
    ) -> TournamentResult<Tournament> {
        self.take_failure()?;
        let mut tournaments = self.tournaments.write().await;
        apply(
            &mut tournaments,
            id,
            |tournament: &mut Tournament| {
                mutation(tournament)?;
                tournament.version += 1;
                Ok(())
            },
            || TournamentError::NotFound(id),
        )
    }

    async fn list(&self, status: Option<TournamentStatus>) -> TournamentResult<Vec<Tournament>> {
        let tournaments = self.tournaments.read().await;
        let mut listed: Vec<Tournament> = tournaments
            .values()
            .filter(|t| status.is_none_or(|s| t.status == s))
            .cloned()
            .collect();
        listed.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(listed)
    }
}

#[async_trait]
impl RewardStore for MemoryStore {
    async fn insert_player_reward(&self, reward: PlayerReward) -> RewardResult<()> {
        let mut rewards = self.player_rewards.write().await;
        if rewards.contains_key(&reward.id) {
            return Err(StoreError::Duplicate(reward.id).into());
        }
        rewards.insert(reward.id, reward);
        Ok(())
    }

    async fn load_player_reward(&self, id: PlayerRewardId) -> RewardResult<PlayerReward> {
        self.player_rewards
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(RewardError::NotFound(id))
    }

    async fn commit_player_reward(
        &self,
        id: PlayerRewardId,
        mutation: PlayerRewardMutation,
    ) -> RewardResult<PlayerReward> {
        self.take_failure()?;
        let mut rewards = self.player_rewards.write().await;
        apply(&mut rewards, id, mutation, || RewardError::NotFound(id))
    }

    async fn list_player_rewards(
        &self,
        status: Option<RewardStatus>,
    ) -> RewardResult<Vec<PlayerReward>> {
        let rewards = self.player_rewards.read().await;
        let mut listed: Vec<PlayerReward> = rewards
            .values()
            .filter(|r| status.is_none_or(|s| r.status == s))
            .cloned()
            .collect();
        listed.sort_by(|a, b| b.earned_at.cmp(&a.earned_at));
        Ok(listed)
    }

    async fn insert_team_reward(&self, reward: TeamReward) -> RewardResult<()> {
        let mut rewards = self.team_rewards.write().await;
        if rewards.contains_key(&reward.id) {
            return Err(StoreError::Duplicate(reward.id).into());
        }
        rewards.insert(reward.id, reward);
        Ok(())
    }

    async fn load_team_reward(&self, id: TeamRewardId) -> RewardResult<TeamReward> {
        self.team_rewards
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(RewardError::NotFound(id))
    }

    async fn commit_team_reward(
        &self,
        id: TeamRewardId,
        mutation: TeamRewardMutation,
    ) -> RewardResult<TeamReward> {
        self.take_failure()?;
        let mut rewards = self.team_rewards.write().await;
        apply(&mut rewards, id, mutation, || RewardError::NotFound(id))
    }

    async fn list_team_rewards(
        &self,
        status: Option<RewardStatus>,
    ) -> RewardResult<Vec<TeamReward>> {
        let rewards = self.team_rewards.read().await;
        let mut listed: Vec<TeamReward> = rewards
            .values()
            .filter(|r| status.is_none_or(|s| r.status == s))
            .cloned()
            .collect();
        listed.sort_by(|a, b| b.earned_at.cmp(&a.earned_at));
        Ok(listed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tournament::{TournamentConfig, TournamentKind};
    use chrono::{Duration, Utc};

    fn tournament() -> Tournament {
        let config = TournamentConfig::single_elimination(
            "Store Cup".to_string(),
            TournamentKind::Solo,
            Utc::now() + Duration::days(1),
        )
        .with_max_players(4);
        Tournament::new(Uuid::new_v4(), config, Utc::now())
    }

    #[tokio::test]
    async fn test_commit_increments_version() {
        let store = MemoryStore::new();
        let t = tournament();
        let id = t.id;
        store.insert(t).await.unwrap();

        let committed = store
            .commit(
                id,
                Box::new(|t: &mut Tournament| {
                    t.registered_players.push(Uuid::new_v4());
                    Ok(())
                }),
            )
            .await
            .unwrap();

        assert_eq!(committed.version, 1);
        assert_eq!(store.load(id).await.unwrap().registered_players.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_mutation_leaves_record_untouched() {
        let store = MemoryStore::new();
        let t = tournament();
        let id = t.id;
        store.insert(t).await.unwrap();

        let result = store
            .commit(
                id,
                Box::new(|t: &mut Tournament| {
                    t.registered_players.push(Uuid::new_v4());
                    Err(TournamentError::RegistrationClosed)
                }),
            )
            .await;

        assert!(matches!(result, Err(TournamentError::RegistrationClosed)));
        let stored = store.load(id).await.unwrap();
        assert!(stored.registered_players.is_empty());
        assert_eq!(stored.version, 0);
    }

    #[tokio::test]
    async fn test_injected_failure_is_one_shot() {
        let store = MemoryStore::new();
        let t = tournament();
        let id = t.id;
        store.insert(t).await.unwrap();

        store.inject_failure(StoreError::Conflict {
            id,
            expected: 0,
            actual: 1,
        });
        let result = store.commit(id, Box::new(|_: &mut Tournament| Ok(()))).await;
        assert!(matches!(
            result,
            Err(TournamentError::Store(StoreError::Conflict { .. }))
        ));

        assert!(store.commit(id, Box::new(|_: &mut Tournament| Ok(()))).await.is_ok());
    }

    #[tokio::test]
    async fn test_duplicate_insert_and_missing_load() {
        let store = MemoryStore::new();
        let t = tournament();
        let id = t.id;
        store.insert(t.clone()).await.unwrap();

        assert!(matches!(
            store.insert(t).await,
            Err(TournamentError::Store(StoreError::Duplicate(_)))
        ));

        let missing = Uuid::new_v4();
        assert!(matches!(
            store.load(missing).await,
            Err(TournamentError::NotFound(m)) if m == missing
        ));
        assert!(matches!(
            store.commit(missing, Box::new(|_: &mut Tournament| Ok(()))).await,
            Err(TournamentError::NotFound(_))
        ));
        assert_eq!(store.load(id).await.unwrap().version, 0);
    }

    #[tokio::test]
    async fn test_list_filters_by_status() {
        let store = MemoryStore::new();
        let open = tournament();
        let mut cancelled = tournament();
        cancelled.status = TournamentStatus::Cancelled;
        store.insert(open).await.unwrap();
        store.insert(cancelled).await.unwrap();

        assert_eq!(store.list(None).await.unwrap().len(), 2);
        let listed = store
            .list(Some(TournamentStatus::Cancelled))
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].status, TournamentStatus::Cancelled);
    }
}
