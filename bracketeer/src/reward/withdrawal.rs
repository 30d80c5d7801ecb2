//! Withdrawal validation and fee computation for currency rewards.

use super::{
    errors::{RewardError, RewardResult},
    models::{PlayerRewardId, Reward},
};
use serde::Serialize;

/// Validated withdrawal, before any balance is debited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WithdrawalQuote {
    pub amount: i64,
    pub fee: i64,
    pub net: i64,
}

/// Result of a committed withdrawal, handed to the payment collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalReceipt {
    pub player_reward_id: PlayerRewardId,
    pub idempotency_key: String,
    pub amount: i64,
    pub fee: i64,
    pub net: i64,
    /// Balance left on the reward
    pub remaining: i64,
}

/// Fee for `amount` at a whole-percent rate, rounded half up
pub fn fee_for(amount: i64, fee_percent: u32) -> i64 {
    let scaled = i128::from(amount) * i128::from(fee_percent);
    ((scaled + 50) / 100) as i64
}

/// Check a withdrawal against the reward's terms and balance
///
/// Checks run in order: currency reward, positive amount, minimum, maximum,
/// balance.
pub fn validate_withdrawal(reward: &Reward, amount: i64) -> RewardResult<WithdrawalQuote> {
    let details = reward
        .currency_details
        .as_ref()
        .ok_or(RewardError::NotCurrencyReward)?;

    if amount <= 0 {
        return Err(RewardError::InvalidAmount(amount));
    }

    if amount < details.min_withdrawal {
        return Err(RewardError::BelowMinimum {
            amount,
            minimum: details.min_withdrawal,
        });
    }

    if let Some(maximum) = details.max_withdrawal
        && amount > maximum
    {
        return Err(RewardError::AboveMaximum { amount, maximum });
    }

    if amount > details.amount {
        return Err(RewardError::InsufficientBalance {
            available: details.amount,
            required: amount,
        });
    }

    let fee = fee_for(amount, details.withdrawal_fee_percent);
    Ok(WithdrawalQuote {
        amount,
        fee,
        net: amount - fee,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reward::models::{CurrencyDetails, RewardType};

    fn cash(balance: i64) -> Reward {
        Reward::currency(
            "Winnings".to_string(),
            CurrencyDetails {
                currency: "USD".to_string(),
                amount: balance,
                min_withdrawal: 20,
                max_withdrawal: Some(200),
                withdrawal_fee_percent: 5,
            },
        )
    }

    #[test]
    fn test_five_percent_of_one_hundred() {
        let quote = validate_withdrawal(&cash(1000), 100).unwrap();
        assert_eq!(quote.fee, 5);
        assert_eq!(quote.net, 95);
    }

    #[test]
    fn test_fee_rounds_half_up() {
        assert_eq!(fee_for(10, 5), 1); // 0.5
        assert_eq!(fee_for(29, 5), 1); // 1.45
        assert_eq!(fee_for(30, 5), 2); // 1.5
        assert_eq!(fee_for(100, 0), 0);
        assert_eq!(fee_for(i64::MAX, 100), i64::MAX);
    }

    #[test]
    fn test_distinct_errors() {
        let reward = cash(150);
        assert!(matches!(
            validate_withdrawal(&reward, 19),
            Err(RewardError::BelowMinimum {
                amount: 19,
                minimum: 20
            })
        ));
        assert!(matches!(
            validate_withdrawal(&reward, 201),
            Err(RewardError::AboveMaximum {
                amount: 201,
                maximum: 200
            })
        ));
        assert!(matches!(
            validate_withdrawal(&reward, 160),
            Err(RewardError::InsufficientBalance {
                available: 150,
                required: 160
            })
        ));
        assert!(matches!(
            validate_withdrawal(&reward, 0),
            Err(RewardError::InvalidAmount(0))
        ));
    }

    #[test]
    fn test_non_currency_rejected() {
        let badge = Reward::new("Badge".to_string(), RewardType::Badge);
        assert!(matches!(
            validate_withdrawal(&badge, 50),
            Err(RewardError::NotCurrencyReward)
        ));
    }

    #[test]
    fn test_no_maximum() {
        let mut reward = cash(10_000);
        if let Some(details) = reward.currency_details.as_mut() {
            details.max_withdrawal = None;
        }
        assert_eq!(validate_withdrawal(&reward, 10_000).unwrap().net, 9_500);
    }
}
