//! Coin amounts
//!
//! Domain primitive for coin quantities. Coins are whole units; there is no
//! fractional coin. Every amount that moves between accounts passes through
//! [`Coins`], so a zero or negative transfer cannot be expressed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Upper bound for a single movement of coins.
const MAX_COINS: i64 = 1_000_000_000_000;

/// Balance every account starts with.
pub const STARTING_BALANCE: i64 = 1000;

/// A validated, strictly positive number of coins.
///
/// # Invariants
/// - Value is always positive (> 0)
/// - Value never exceeds one trillion coins
///
/// # Example
/// ```
/// use merch_store::domain::Coins;
///
/// let coins = Coins::new(25).unwrap();
/// assert_eq!(coins.value(), 25);
/// assert!(Coins::new(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Coins(i64);

/// Errors that can occur when creating a [`Coins`] value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("Amount must be positive (got {0})")]
    NotPositive(i64),

    #[error("Amount exceeds maximum allowed value ({MAX_COINS})")]
    Overflow,

    #[error("Invalid amount format: {0}")]
    ParseError(String),
}

impl Coins {
    /// Create a new amount with validation.
    ///
    /// # Errors
    /// - `AmountError::NotPositive` if value <= 0
    /// - `AmountError::Overflow` if value > one trillion
    pub fn new(value: i64) -> Result<Self, AmountError> {
        if value <= 0 {
            return Err(AmountError::NotPositive(value));
        }

        if value > MAX_COINS {
            return Err(AmountError::Overflow);
        }

        Ok(Self(value))
    }

    /// Get the underlying integer value.
    pub fn value(&self) -> i64 {
        self.0
    }

    /// Check whether `balance` covers this amount.
    pub fn is_covered_by(&self, balance: i64) -> bool {
        balance >= self.0
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Coins {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .trim()
            .parse::<i64>()
            .map_err(|e| AmountError::ParseError(e.to_string()))?;
        Coins::new(value)
    }
}

impl TryFrom<i64> for Coins {
    type Error = AmountError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Coins::new(value)
    }
}

impl From<Coins> for i64 {
    fn from(coins: Coins) -> Self {
        coins.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coins_positive() {
        let coins = Coins::new(100).unwrap();
        assert_eq!(coins.value(), 100);
    }

    #[test]
    fn test_coins_zero_rejected() {
        assert!(matches!(Coins::new(0), Err(AmountError::NotPositive(0))));
    }

    #[test]
    fn test_coins_negative_rejected() {
        assert!(matches!(Coins::new(-5), Err(AmountError::NotPositive(-5))));
    }

    #[test]
    fn test_coins_overflow() {
        assert!(matches!(Coins::new(MAX_COINS + 1), Err(AmountError::Overflow)));
        assert!(Coins::new(MAX_COINS).is_ok());
    }

    #[test]
    fn test_coins_from_str() {
        let coins: Coins = " 42 ".parse().unwrap();
        assert_eq!(coins.value(), 42);

        let bad: Result<Coins, _> = "4.2".parse();
        assert!(matches!(bad, Err(AmountError::ParseError(_))));
    }

    #[test]
    fn test_coins_deserialize_validates() {
        let ok: Coins = serde_json::from_str("10").unwrap();
        assert_eq!(ok.value(), 10);

        let err = serde_json::from_str::<Coins>("-10");
        assert!(err.is_err());
    }

    #[test]
    fn test_is_covered_by() {
        let price = Coins::new(80).unwrap();
        assert!(price.is_covered_by(80));
        assert!(price.is_covered_by(1000));
        assert!(!price.is_covered_by(79));
    }
}
