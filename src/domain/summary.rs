//! Account summary read model
//!
//! What a user sees on the info screen: balance, owned merch and the
//! grouped coin history. Field names follow the public JSON contract.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Full per-account view returned by the history aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSummary {
    pub coins: i64,
    pub inventory: Vec<InventoryItem>,
    #[serde(rename = "coinHistory")]
    pub coin_history: CoinHistory,
}

/// Number of units of one catalog item owned by the account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    #[serde(rename = "type")]
    pub item: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinHistory {
    pub received: Vec<Received>,
    pub sent: Vec<Sent>,
}

/// Coins received from one counterparty, summed over all transfers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Received {
    #[serde(rename = "fromUser")]
    pub from_user: String,
    pub amount: i64,
}

/// Coins sent to one counterparty, summed over all transfers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sent {
    #[serde(rename = "toUser")]
    pub to_user: String,
    pub amount: i64,
}

/// Which side of a transfer the summarised account was on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Received,
    Sent,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Received => "received",
            Direction::Sent => "sent",
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "received" => Ok(Direction::Received),
            "sent" => Ok(Direction::Sent),
            other => Err(format!("unknown transfer direction: {other}")),
        }
    }
}

impl CoinHistory {
    /// Split already-grouped `(counterparty, total, direction)` rows into the
    /// two history lists. Row order is preserved within each list.
    pub fn from_grouped<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (String, i64, Direction)>,
    {
        let mut history = CoinHistory::default();

        for (login, amount, direction) in rows {
            match direction {
                Direction::Received => history.received.push(Received {
                    from_user: login,
                    amount,
                }),
                Direction::Sent => history.sent.push(Sent {
                    to_user: login,
                    amount,
                }),
            }
        }

        history
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_grouped_splits_by_direction() {
        let history = CoinHistory::from_grouped(vec![
            ("bob".to_string(), 10, Direction::Received),
            ("carol".to_string(), 25, Direction::Sent),
            ("dave".to_string(), 5, Direction::Received),
        ]);

        assert_eq!(
            history.received,
            vec![
                Received { from_user: "bob".to_string(), amount: 10 },
                Received { from_user: "dave".to_string(), amount: 5 },
            ]
        );
        assert_eq!(
            history.sent,
            vec![Sent { to_user: "carol".to_string(), amount: 25 }]
        );
    }

    #[test]
    fn test_direction_round_trip() {
        for direction in [Direction::Received, Direction::Sent] {
            assert_eq!(direction.as_str().parse::<Direction>(), Ok(direction));
        }
        assert!("refund".parse::<Direction>().is_err());
    }

    #[test]
    fn test_summary_json_shape() {
        let summary = AccountSummary {
            coins: 975,
            inventory: vec![InventoryItem { item: "pen".to_string(), quantity: 1 }],
            coin_history: CoinHistory {
                received: vec![Received { from_user: "b".to_string(), amount: 10 }],
                sent: vec![Sent { to_user: "c".to_string(), amount: 25 }],
            },
        };

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["coins"], 975);
        assert_eq!(json["inventory"][0]["type"], "pen");
        assert_eq!(json["inventory"][0]["quantity"], 1);
        assert_eq!(json["coinHistory"]["received"][0]["fromUser"], "b");
        assert_eq!(json["coinHistory"]["sent"][0]["toUser"], "c");
    }
}
