//! Reward data models.

use super::errors::{RewardError, RewardResult};
use crate::tournament::models::{TeamId, UserId};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Reward definition ID type
pub type RewardId = Uuid;

/// Player reward instance ID type
pub type PlayerRewardId = Uuid;

/// Team reward instance ID type
pub type TeamRewardId = Uuid;

/// Share percentages of a team reward always add up to this
pub const FULL_SHARE: u32 = 100;

/// Reward type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum RewardType {
    Achievement,
    Tournament,
    Daily,
    Referral,
    Currency,
    Item,
    Badge,
    Title,
    Skin,
}

impl std::fmt::Display for RewardType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RewardType::Achievement => "achievement",
            RewardType::Tournament => "tournament",
            RewardType::Daily => "daily",
            RewardType::Referral => "referral",
            RewardType::Currency => "currency",
            RewardType::Item => "item",
            RewardType::Badge => "badge",
            RewardType::Title => "title",
            RewardType::Skin => "skin",
        };
        write!(f, "{}", name)
    }
}

/// Withdrawal terms of a currency reward
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyDetails {
    /// Currency code
    pub currency: String,
    /// Withdrawable balance, in minor units
    pub amount: i64,
    pub min_withdrawal: i64,
    pub max_withdrawal: Option<i64>,
    /// Whole percent, 0..=100
    pub withdrawal_fee_percent: u32,
}

/// Reward definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reward {
    pub id: RewardId,
    pub name: String,
    #[serde(rename = "type")]
    pub reward_type: RewardType,
    pub currency_details: Option<CurrencyDetails>,
    /// Days an earned instance stays claimable
    pub valid_days: Option<u32>,
}

impl Reward {
    /// Non-currency reward
    pub fn new(name: String, reward_type: RewardType) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            reward_type,
            currency_details: None,
            valid_days: None,
        }
    }

    /// Currency reward with withdrawal terms
    pub fn currency(name: String, details: CurrencyDetails) -> Self {
        Self {
            currency_details: Some(details),
            ..Self::new(name, RewardType::Currency)
        }
    }

    pub fn with_valid_days(mut self, days: u32) -> Self {
        self.valid_days = Some(days);
        self
    }

    /// Expiry of an instance earned at `earned_at`
    pub fn expiry_from(&self, earned_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.valid_days
            .map(|days| earned_at + Duration::days(i64::from(days)))
    }

    /// Validate a definition before an instance is granted
    pub fn validate(&self) -> RewardResult<()> {
        if self.name.trim().is_empty() {
            return Err(RewardError::InvalidReward(
                "name must not be empty".to_string(),
            ));
        }

        match (&self.reward_type, &self.currency_details) {
            (RewardType::Currency, None) => {
                return Err(RewardError::InvalidReward(
                    "currency rewards need currency details".to_string(),
                ));
            }
            (RewardType::Currency, Some(details)) => {
                if details.amount < 0 || details.min_withdrawal < 0 {
                    return Err(RewardError::InvalidReward(
                        "amounts must not be negative".to_string(),
                    ));
                }
                if let Some(max) = details.max_withdrawal
                    && max < details.min_withdrawal
                {
                    return Err(RewardError::InvalidReward(
                        "max_withdrawal is below min_withdrawal".to_string(),
                    ));
                }
                if details.withdrawal_fee_percent > 100 {
                    return Err(RewardError::InvalidReward(
                        "withdrawal fee above 100 percent".to_string(),
                    ));
                }
            }
            (_, Some(_)) => {
                return Err(RewardError::InvalidReward(format!(
                    "{} rewards cannot carry currency details",
                    self.reward_type
                )));
            }
            (_, None) => {}
        }

        Ok(())
    }
}

/// Reward instance lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardStatus {
    Earned,
    Claimed,
    Expired,
}

impl std::fmt::Display for RewardStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RewardStatus::Earned => write!(f, "earned"),
            RewardStatus::Claimed => write!(f, "claimed"),
            RewardStatus::Expired => write!(f, "expired"),
        }
    }
}

/// One withdrawal from a currency reward
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalRecord {
    pub idempotency_key: String,
    pub amount: i64,
    pub fee: i64,
    pub net: i64,
    pub at: DateTime<Utc>,
}

/// Reward earned by a single user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerReward {
    pub id: PlayerRewardId,
    pub user_id: UserId,
    /// Definition as it was at grant time
    pub reward: Reward,
    pub status: RewardStatus,
    pub earned_at: DateTime<Utc>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub withdrawals: Vec<WithdrawalRecord>,
}

impl PlayerReward {
    pub fn new(user_id: UserId, reward: Reward, earned_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            expires_at: reward.expiry_from(earned_at),
            reward,
            status: RewardStatus::Earned,
            earned_at,
            claimed_at: None,
            withdrawals: Vec::new(),
        }
    }

    /// Past its expiry at `now`
    pub fn is_past_expiry(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }

    /// Remaining withdrawable balance, for currency rewards
    pub fn balance(&self) -> Option<i64> {
        self.reward.currency_details.as_ref().map(|d| d.amount)
    }
}

/// One member's share of a team reward
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionShare {
    pub participant: UserId,
    pub share_percent: u32,
    pub claimed_at: Option<DateTime<Utc>>,
}

/// Reward earned by a team and split among its members
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamReward {
    pub id: TeamRewardId,
    pub team_id: TeamId,
    pub reward: Reward,
    pub status: RewardStatus,
    pub distribution: Vec<DistributionShare>,
    pub earned_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub claimed_at: Option<DateTime<Utc>>,
    /// Member whose claim completed the distribution
    pub claimed_by: Option<UserId>,
}

impl TeamReward {
    pub fn new(
        team_id: TeamId,
        reward: Reward,
        shares: &[(UserId, u32)],
        earned_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            team_id,
            expires_at: reward.expiry_from(earned_at),
            reward,
            status: RewardStatus::Earned,
            distribution: shares
                .iter()
                .map(|&(participant, share_percent)| DistributionShare {
                    participant,
                    share_percent,
                    claimed_at: None,
                })
                .collect(),
            earned_at,
            claimed_at: None,
            claimed_by: None,
        }
    }

    pub fn is_past_expiry(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }

    pub fn share_of(&self, participant: UserId) -> Option<&DistributionShare> {
        self.distribution
            .iter()
            .find(|s| s.participant == participant)
    }

    pub fn all_shares_claimed(&self) -> bool {
        self.distribution.iter().all(|s| s.claimed_at.is_some())
    }

    /// Check the distribution: unique members, shares summing to 100
    pub fn validate_distribution(&self) -> RewardResult<()> {
        let members: HashSet<UserId> = self.distribution.iter().map(|s| s.participant).collect();
        if members.len() != self.distribution.len() {
            return Err(RewardError::InvalidDistribution(
                "a member appears more than once".to_string(),
            ));
        }

        let total: u32 = self.distribution.iter().map(|s| s.share_percent).sum();
        if total != FULL_SHARE {
            return Err(RewardError::InvalidShareSum(total));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cash(amount: i64) -> Reward {
        Reward::currency(
            "Prize pool".to_string(),
            CurrencyDetails {
                currency: "USD".to_string(),
                amount,
                min_withdrawal: 10,
                max_withdrawal: Some(500),
                withdrawal_fee_percent: 5,
            },
        )
    }

    #[test]
    fn test_reward_validation() {
        assert!(cash(100).validate().is_ok());
        assert!(Reward::new("Gold badge".to_string(), RewardType::Badge).validate().is_ok());
        assert!(Reward::new("Cash".to_string(), RewardType::Currency).validate().is_err());

        let mut inverted = cash(100);
        if let Some(details) = inverted.currency_details.as_mut() {
            details.max_withdrawal = Some(5);
        }
        assert!(matches!(inverted.validate(), Err(RewardError::InvalidReward(_))));

        let mut badge = Reward::new("Badge".to_string(), RewardType::Badge);
        badge.currency_details = cash(1).currency_details;
        assert!(badge.validate().is_err());
    }

    #[test]
    fn test_expiry_computed_from_valid_days() {
        let earned_at = Utc::now();
        let instance = PlayerReward::new(Uuid::new_v4(), cash(100).with_valid_days(7), earned_at);
        assert_eq!(instance.expires_at, Some(earned_at + Duration::days(7)));
        assert!(!instance.is_past_expiry(earned_at + Duration::days(6)));
        assert!(instance.is_past_expiry(earned_at + Duration::days(7)));

        let forever = PlayerReward::new(Uuid::new_v4(), cash(100), earned_at);
        assert!(!forever.is_past_expiry(earned_at + Duration::days(10_000)));
    }

    #[test]
    fn test_distribution_must_total_one_hundred() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let reward = Reward::new("Team title".to_string(), RewardType::Title);

        let ok = TeamReward::new(Uuid::new_v4(), reward.clone(), &[(a, 60), (b, 40)], Utc::now());
        assert!(ok.validate_distribution().is_ok());

        let short = TeamReward::new(Uuid::new_v4(), reward.clone(), &[(a, 60), (b, 30)], Utc::now());
        assert!(matches!(short.validate_distribution(), Err(RewardError::InvalidShareSum(90))));

        let dup = TeamReward::new(Uuid::new_v4(), reward, &[(a, 50), (a, 50)], Utc::now());
        assert!(matches!(
            dup.validate_distribution(),
            Err(RewardError::InvalidDistribution(_))
        ));
    }

    #[test]
    fn test_reward_serializes_type_tag() {
        let value = serde_json::to_value(cash(100)).unwrap();
        assert_eq!(value["type"], "currency");
        assert_eq!(value["currencyDetails"]["withdrawalFeePercent"], 5);
    }
}
