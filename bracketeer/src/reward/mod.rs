//! Reward module for player and team rewards.
//!
//! This module implements:
//! - Reward definitions, including currency rewards with withdrawal terms
//! - Claim state machines for player rewards and team reward shares
//! - Withdrawal validation, fees and idempotency keys
//! - Expiry, both on claim and through a periodic sweep

pub mod errors;
pub mod ledger;
pub mod models;
pub mod withdrawal;

pub use errors::{RewardError, RewardResult};
pub use ledger::{RewardLedger, SweepOutcome};
pub use models::{
    CurrencyDetails, DistributionShare, PlayerReward, PlayerRewardId, Reward, RewardId,
    RewardStatus, RewardType, TeamReward, TeamRewardId, WithdrawalRecord,
};
pub use withdrawal::{WithdrawalQuote, WithdrawalReceipt, fee_for, validate_withdrawal};
