//! Reward error types.

use crate::store::StoreError;
use crate::tournament::models::UserId;
use thiserror::Error;
use uuid::Uuid;

/// Reward errors
#[derive(Debug, Error)]
pub enum RewardError {
    /// Reward instance not found
    #[error("Reward not found: {0}")]
    NotFound(Uuid),

    #[error("Reward already claimed")]
    AlreadyClaimed,

    /// User has no share in the team reward
    #[error("User {0} is not eligible for this reward")]
    NotEligible(UserId),

    #[error("Reward has expired")]
    Expired,

    #[error("Reward is not a currency reward")]
    NotCurrencyReward,

    /// Currency rewards are settled by withdrawing the balance, not by claiming
    #[error("Currency reward still holds a balance of {0}")]
    BalanceOutstanding(i64),

    #[error("Withdrawal of {amount} is below the minimum of {minimum}")]
    BelowMinimum { amount: i64, minimum: i64 },

    #[error("Withdrawal of {amount} is above the maximum of {maximum}")]
    AboveMaximum { amount: i64, maximum: i64 },

    #[error("Insufficient balance: available {available}, required {required}")]
    InsufficientBalance { available: i64, required: i64 },

    /// Team distribution shares do not total 100
    #[error("Distribution shares total {0}, expected 100")]
    InvalidShareSum(u32),

    #[error("Invalid distribution: {0}")]
    InvalidDistribution(String),

    /// Invalid amount (must be positive)
    #[error("Invalid amount: {0}")]
    InvalidAmount(i64),

    /// Idempotency key already used on this reward
    #[error("Duplicate withdrawal: {0}")]
    DuplicateWithdrawal(String),

    #[error("Invalid reward definition: {0}")]
    InvalidReward(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl RewardError {
    /// Get a client-safe error message
    pub fn client_message(&self) -> String {
        match self {
            RewardError::Store(_) => "Internal server error".to_string(),
            RewardError::NotFound(_) => "Reward not found".to_string(),
            RewardError::NotEligible(_) => "Not eligible for this reward".to_string(),
            _ => self.to_string(),
        }
    }

    /// Whether this error, raised while committing, signals a broken invariant
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            RewardError::InvalidShareSum(_) | RewardError::InvalidDistribution(_)
        )
    }
}

/// Result type for reward operations
pub type RewardResult<T> = Result<T, RewardError>;
