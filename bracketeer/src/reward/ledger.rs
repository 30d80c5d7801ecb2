//! Reward ledger: grants, claims, team shares, withdrawals and expiry.

use super::{
    errors::{RewardError, RewardResult},
    models::{
        PlayerReward, PlayerRewardId, Reward, RewardStatus, TeamReward, TeamRewardId,
        WithdrawalRecord,
    },
    withdrawal::{self, WithdrawalQuote, WithdrawalReceipt},
};
use crate::{
    clock::Clock,
    store::RewardStore,
    tournament::models::{TeamId, UserId},
};
use std::sync::Arc;
use uuid::Uuid;

/// Reward ledger
///
/// Every transition runs inside a store commit on the current record, so two
/// concurrent claims of the same instance or share cannot both succeed.
#[derive(Clone)]
pub struct RewardLedger {
    store: Arc<dyn RewardStore>,
    clock: Arc<dyn Clock>,
}

/// Reject instances that are no longer claimable
fn ensure_earned(status: RewardStatus) -> RewardResult<()> {
    match status {
        RewardStatus::Earned => Ok(()),
        RewardStatus::Claimed => Err(RewardError::AlreadyClaimed),
        RewardStatus::Expired => Err(RewardError::Expired),
    }
}

impl RewardLedger {
    /// Create a new reward ledger
    pub fn new(store: Arc<dyn RewardStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Grant a reward to a user
    pub async fn grant_player_reward(
        &self,
        user_id: UserId,
        reward: Reward,
    ) -> RewardResult<PlayerReward> {
        reward.validate()?;

        let instance = PlayerReward::new(user_id, reward, self.clock.now());
        self.store.insert_player_reward(instance.clone()).await?;

        log::info!(
            "Granted {} reward '{}' to user {} ({})",
            instance.reward.reward_type,
            instance.reward.name,
            user_id,
            instance.id
        );
        Ok(instance)
    }

    /// Grant a reward to a team, split among members by whole percent
    ///
    /// # Arguments
    ///
    /// * `team_id` - Team earning the reward
    /// * `reward` - Reward definition
    /// * `shares` - `(member, percent)` pairs; percents must total 100
    pub async fn grant_team_reward(
        &self,
        team_id: TeamId,
        reward: Reward,
        shares: &[(UserId, u32)],
    ) -> RewardResult<TeamReward> {
        reward.validate()?;

        let instance = TeamReward::new(team_id, reward, shares, self.clock.now());
        instance.validate_distribution()?;
        self.store.insert_team_reward(instance.clone()).await?;

        log::info!(
            "Granted {} reward '{}' to team {} split {} ways ({})",
            instance.reward.reward_type,
            instance.reward.name,
            team_id,
            instance.distribution.len(),
            instance.id
        );
        Ok(instance)
    }

    pub async fn get_player_reward(&self, id: PlayerRewardId) -> RewardResult<PlayerReward> {
        self.store.load_player_reward(id).await
    }

    pub async fn get_team_reward(&self, id: TeamRewardId) -> RewardResult<TeamReward> {
        self.store.load_team_reward(id).await
    }

    /// Claim a player reward
    ///
    /// A claim made after expiry commits the flip to `expired` and then fails
    /// with [`RewardError::Expired`]. A currency reward with a balance left
    /// cannot be claimed; it becomes `claimed` when a withdrawal empties it.
    pub async fn claim_player_reward(&self, id: PlayerRewardId) -> RewardResult<PlayerReward> {
        let now = self.clock.now();
        let updated = self
            .store
            .commit_player_reward(
                id,
                Box::new(move |reward: &mut PlayerReward| {
                    ensure_earned(reward.status)?;
                    if reward.is_past_expiry(now) {
                        reward.status = RewardStatus::Expired;
                        return Ok(());
                    }
                    if let Some(balance) = reward.balance()
                        && balance > 0
                    {
                        return Err(RewardError::BalanceOutstanding(balance));
                    }
                    reward.status = RewardStatus::Claimed;
                    reward.claimed_at = Some(now);
                    Ok(())
                }),
            )
            .await?;

        if updated.status == RewardStatus::Expired {
            log::info!("Player reward {} expired on claim", id);
            return Err(RewardError::Expired);
        }

        log::info!("User {} claimed reward {}", updated.user_id, id);
        Ok(updated)
    }

    /// Claim one member's share of a team reward
    ///
    /// The reward becomes `claimed` when the last share is claimed.
    pub async fn claim_team_share(
        &self,
        id: TeamRewardId,
        participant: UserId,
    ) -> RewardResult<TeamReward> {
        let now = self.clock.now();
        let result = self
            .store
            .commit_team_reward(
                id,
                Box::new(move |reward: &mut TeamReward| {
                    ensure_earned(reward.status)?;
                    if reward.is_past_expiry(now) {
                        reward.status = RewardStatus::Expired;
                        return Ok(());
                    }

                    let share = reward
                        .distribution
                        .iter_mut()
                        .find(|s| s.participant == participant)
                        .ok_or(RewardError::NotEligible(participant))?;
                    if share.claimed_at.is_some() {
                        return Err(RewardError::AlreadyClaimed);
                    }
                    share.claimed_at = Some(now);

                    if reward.all_shares_claimed() {
                        reward.status = RewardStatus::Claimed;
                        reward.claimed_at = Some(now);
                        reward.claimed_by = Some(participant);
                    }

                    reward.validate_distribution()
                }),
            )
            .await;

        let updated = match result {
            Err(e) if e.is_corruption() => {
                log::error!("Team reward {} commit aborted: {}", id, e);
                return Err(e);
            }
            other => other?,
        };

        if updated.status == RewardStatus::Expired {
            log::info!("Team reward {} expired on claim", id);
            return Err(RewardError::Expired);
        }

        log::info!(
            "User {} claimed share of team reward {}{}",
            participant,
            id,
            if updated.status == RewardStatus::Claimed {
                ", all shares claimed"
            } else {
                ""
            }
        );
        Ok(updated)
    }

    /// Validate a withdrawal against the current state of a reward
    ///
    /// Applies the same status and expiry checks as [`RewardLedger::withdraw`].
    /// Nothing is written, so a reward past its expiry is reported as
    /// [`RewardError::Expired`] without flipping its stored status.
    pub async fn validate_withdrawal(
        &self,
        id: PlayerRewardId,
        amount: i64,
    ) -> RewardResult<WithdrawalQuote> {
        let reward = self.store.load_player_reward(id).await?;
        ensure_earned(reward.status)?;
        if reward.is_past_expiry(self.clock.now()) {
            return Err(RewardError::Expired);
        }
        withdrawal::validate_withdrawal(&reward.reward, amount)
    }

    /// Withdraw from a currency reward
    ///
    /// # Arguments
    ///
    /// * `id` - Player reward instance
    /// * `amount` - Amount to debit, fee included
    /// * `idempotency_key` - Unique key to prevent duplicate withdrawals
    ///
    /// # Returns
    ///
    /// * `RewardResult<WithdrawalReceipt>` - Fee, net payout and remaining balance
    ///
    /// # Errors
    ///
    /// * `RewardError::DuplicateWithdrawal` - Idempotency key already used
    /// * `RewardError::Expired` - Reward expired before the withdrawal
    pub async fn withdraw(
        &self,
        id: PlayerRewardId,
        amount: i64,
        idempotency_key: String,
    ) -> RewardResult<WithdrawalReceipt> {
        let now = self.clock.now();
        let key = idempotency_key.clone();
        let updated = self
            .store
            .commit_player_reward(
                id,
                Box::new(move |reward: &mut PlayerReward| {
                    if reward.withdrawals.iter().any(|w| w.idempotency_key == key) {
                        return Err(RewardError::DuplicateWithdrawal(key));
                    }
                    ensure_earned(reward.status)?;
                    if reward.is_past_expiry(now) {
                        reward.status = RewardStatus::Expired;
                        return Ok(());
                    }

                    let quote = withdrawal::validate_withdrawal(&reward.reward, amount)?;
                    let details = reward
                        .reward
                        .currency_details
                        .as_mut()
                        .ok_or(RewardError::NotCurrencyReward)?;
                    details.amount -= quote.amount;
                    let remaining = details.amount;

                    reward.withdrawals.push(WithdrawalRecord {
                        idempotency_key: key,
                        amount: quote.amount,
                        fee: quote.fee,
                        net: quote.net,
                        at: now,
                    });

                    if remaining == 0 {
                        reward.status = RewardStatus::Claimed;
                        reward.claimed_at = Some(now);
                    }
                    Ok(())
                }),
            )
            .await?;

        let Some(record) = updated
            .withdrawals
            .iter()
            .find(|w| w.idempotency_key == idempotency_key)
        else {
            // Only the expiry flip commits without a withdrawal record
            log::info!("Player reward {} expired on withdrawal", id);
            return Err(RewardError::Expired);
        };

        let remaining = updated.balance().unwrap_or(0);
        log::info!(
            "User {} withdrew {} (fee {}, net {}) from reward {}, {} remaining",
            updated.user_id,
            record.amount,
            record.fee,
            record.net,
            id,
            remaining
        );

        Ok(WithdrawalReceipt {
            player_reward_id: id,
            idempotency_key,
            amount: record.amount,
            fee: record.fee,
            net: record.net,
            remaining,
        })
    }

    /// Flip every earned instance past its expiry to `expired`
    ///
    /// A failed commit does not stop the sweep; it is logged and counted in
    /// [`SweepOutcome::failed`] so the next run can retry it.
    ///
    /// # Returns
    ///
    /// * `RewardResult<SweepOutcome>` - Rewards flipped and commits that failed
    pub async fn sweep_expired(&self) -> RewardResult<SweepOutcome> {
        let now = self.clock.now();
        let mut outcome = SweepOutcome::default();

        let players = self
            .store
            .list_player_rewards(Some(RewardStatus::Earned))
            .await?;
        for reward in players.iter().filter(|r| r.is_past_expiry(now)) {
            let result = self
                .store
                .commit_player_reward(
                    reward.id,
                    Box::new(move |r: &mut PlayerReward| {
                        if r.status == RewardStatus::Earned && r.is_past_expiry(now) {
                            r.status = RewardStatus::Expired;
                        }
                        Ok(())
                    }),
                )
                .await;
            outcome.record(reward.id, result.map(|r| r.status));
        }

        let teams = match self
            .store
            .list_team_rewards(Some(RewardStatus::Earned))
            .await
        {
            Ok(teams) => teams,
            Err(e) => {
                log::warn!(
                    "Reward sweep stopped after {} expired, {} failed: {}",
                    outcome.expired,
                    outcome.failed,
                    e
                );
                return Err(e);
            }
        };
        for reward in teams.iter().filter(|r| r.is_past_expiry(now)) {
            let result = self
                .store
                .commit_team_reward(
                    reward.id,
                    Box::new(move |r: &mut TeamReward| {
                        if r.status == RewardStatus::Earned && r.is_past_expiry(now) {
                            r.status = RewardStatus::Expired;
                        }
                        r.validate_distribution()
                    }),
                )
                .await;
            outcome.record(reward.id, result.map(|r| r.status));
        }

        if outcome.expired > 0 || outcome.failed > 0 {
            log::info!(
                "Reward sweep expired {} rewards, {} failed",
                outcome.expired,
                outcome.failed
            );
        }
        Ok(outcome)
    }
}

/// Result of one expiry sweep
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepOutcome {
    /// Rewards flipped to `expired`
    pub expired: usize,
    /// Rewards whose commit failed and remain `earned`
    pub failed: usize,
}

impl SweepOutcome {
    fn record(&mut self, id: Uuid, result: RewardResult<RewardStatus>) {
        match result {
            Ok(RewardStatus::Expired) => self.expired += 1,
            Ok(_) => {}
            Err(e) => {
                if e.is_corruption() {
                    log::error!("Reward {} expiry aborted: {}", id, e);
                } else {
                    log::warn!("Reward {} expiry failed: {}", id, e);
                }
                self.failed += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::reward::models::{CurrencyDetails, RewardType};
    use crate::store::MemoryStore;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn ledger() -> (RewardLedger, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        (
            RewardLedger::new(Arc::new(MemoryStore::new()), clock.clone()),
            clock,
        )
    }

    fn cash(amount: i64) -> Reward {
        Reward::currency(
            "Season payout".to_string(),
            CurrencyDetails {
                currency: "USD".to_string(),
                amount,
                min_withdrawal: 10,
                max_withdrawal: None,
                withdrawal_fee_percent: 5,
            },
        )
    }

    #[tokio::test]
    async fn test_claim_then_claim_again() {
        let (ledger, _) = ledger();
        let reward = ledger
            .grant_player_reward(Uuid::new_v4(), Reward::new("Champion".to_string(), RewardType::Title))
            .await
            .unwrap();

        let claimed = ledger.claim_player_reward(reward.id).await.unwrap();
        assert_eq!(claimed.status, RewardStatus::Claimed);
        assert!(claimed.claimed_at.is_some());

        assert!(matches!(
            ledger.claim_player_reward(reward.id).await,
            Err(RewardError::AlreadyClaimed)
        ));
    }

    #[tokio::test]
    async fn test_grant_rejects_bad_shares() {
        let (ledger, _) = ledger();
        let result = ledger
            .grant_team_reward(
                Uuid::new_v4(),
                Reward::new("Team skin".to_string(), RewardType::Skin),
                &[(Uuid::new_v4(), 50), (Uuid::new_v4(), 49)],
            )
            .await;
        assert!(matches!(result, Err(RewardError::InvalidShareSum(99))));
    }

    #[tokio::test]
    async fn test_withdraw_to_zero_claims_reward() {
        let (ledger, _) = ledger();
        let reward = ledger.grant_player_reward(Uuid::new_v4(), cash(100)).await.unwrap();

        let receipt = ledger
            .withdraw(reward.id, 100, "payout-1".to_string())
            .await
            .unwrap();
        assert_eq!((receipt.fee, receipt.net, receipt.remaining), (5, 95, 0));

        let stored = ledger.get_player_reward(reward.id).await.unwrap();
        assert_eq!(stored.status, RewardStatus::Claimed);
        assert_eq!(stored.withdrawals.len(), 1);
    }

    #[tokio::test]
    async fn test_sweep_expired() {
        let (ledger, clock) = ledger();
        let short = ledger
            .grant_player_reward(Uuid::new_v4(), cash(50).with_valid_days(1))
            .await
            .unwrap();
        let long = ledger
            .grant_player_reward(Uuid::new_v4(), cash(50).with_valid_days(30))
            .await
            .unwrap();
        let a = Uuid::new_v4();
        let team = ledger
            .grant_team_reward(
                Uuid::new_v4(),
                Reward::new("Team badge".to_string(), RewardType::Badge).with_valid_days(1),
                &[(a, 100)],
            )
            .await
            .unwrap();

        clock.advance(Duration::days(2));
        assert_eq!(ledger.sweep_expired().await.unwrap().expired, 2);
        assert_eq!(
            ledger.sweep_expired().await.unwrap(),
            SweepOutcome::default()
        );

        assert_eq!(
            ledger.get_player_reward(short.id).await.unwrap().status,
            RewardStatus::Expired
        );
        assert_eq!(
            ledger.get_player_reward(long.id).await.unwrap().status,
            RewardStatus::Earned
        );
        assert!(matches!(
            ledger.claim_team_share(team.id, a).await,
            Err(RewardError::Expired)
        ));
    }
}
