//! Reward Granting
//!
//! Rewards hand off to a `RewardSink` owned by the game (player stats,
//! inventory, wallet, equipment). The engine never deduplicates grants.

use thiserror::Error;
use tracing::info;

use super::definition::Reward;

/// Failure reported by a reward sink
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GrantError {
    #[error("inventory full, could not add {count} x {item_id}")]
    InventoryFull { item_id: String, count: i32 },
    #[error("unknown {kind} '{id}'")]
    Unknown { kind: &'static str, id: String },
    #[error("{0}")]
    Rejected(String),
}

/// Collaborator that applies reward side-effects
pub trait RewardSink {
    fn grant_experience(&mut self, amount: i32) -> Result<(), GrantError>;
    fn grant_item(&mut self, item_id: &str, count: i32) -> Result<(), GrantError>;
    fn grant_currency(&mut self, currency: &str, amount: i32) -> Result<(), GrantError>;
    fn grant_equipment(&mut self, equipment_id: &str) -> Result<(), GrantError>;
}

impl Reward {
    /// Apply this reward through exactly one sink call
    pub fn grant(&self, sink: &mut dyn RewardSink) -> Result<(), GrantError> {
        match self {
            Reward::Experience { amount } => sink.grant_experience(*amount),
            Reward::Item { item_id, count } => sink.grant_item(item_id, *count),
            Reward::Currency { currency, amount } => sink.grant_currency(currency, *amount),
            Reward::Equipment { equipment_id } => sink.grant_equipment(equipment_id),
        }
    }
}

/// Sink that only logs grants, for tools and headless runs
#[derive(Debug, Default)]
pub struct LoggingRewardSink;

impl RewardSink for LoggingRewardSink {
    fn grant_experience(&mut self, amount: i32) -> Result<(), GrantError> {
        info!("Granting {} experience", amount);
        Ok(())
    }

    fn grant_item(&mut self, item_id: &str, count: i32) -> Result<(), GrantError> {
        info!("Granting {} x {}", count, item_id);
        Ok(())
    }

    fn grant_currency(&mut self, currency: &str, amount: i32) -> Result<(), GrantError> {
        info!("Granting {} {}", amount, currency);
        Ok(())
    }

    fn grant_equipment(&mut self, equipment_id: &str) -> Result<(), GrantError> {
        info!("Granting equipment: {}", equipment_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Tally {
        calls: Vec<String>,
    }

    impl RewardSink for Tally {
        fn grant_experience(&mut self, amount: i32) -> Result<(), GrantError> {
            self.calls.push(format!("exp:{}", amount));
            Ok(())
        }

        fn grant_item(&mut self, item_id: &str, count: i32) -> Result<(), GrantError> {
            if count > 99 {
                return Err(GrantError::InventoryFull { item_id: item_id.to_string(), count });
            }
            self.calls.push(format!("item:{}:{}", item_id, count));
            Ok(())
        }

        fn grant_currency(&mut self, currency: &str, amount: i32) -> Result<(), GrantError> {
            self.calls.push(format!("currency:{}:{}", currency, amount));
            Ok(())
        }

        fn grant_equipment(&mut self, equipment_id: &str) -> Result<(), GrantError> {
            Err(GrantError::Unknown { kind: "equipment", id: equipment_id.to_string() })
        }
    }

    #[test]
    fn test_each_reward_hits_one_sink_method() {
        let mut sink = Tally::default();
        Reward::Experience { amount: 50 }.grant(&mut sink).unwrap();
        Reward::Item { item_id: "cheese".to_string(), count: 2 }.grant(&mut sink).unwrap();
        Reward::Currency { currency: "gold".to_string(), amount: 5 }.grant(&mut sink).unwrap();

        assert_eq!(sink.calls, vec!["exp:50", "item:cheese:2", "currency:gold:5"]);

        let err = Reward::Equipment { equipment_id: "rusty_sword".to_string() }
            .grant(&mut sink)
            .unwrap_err();
        assert_eq!(err.to_string(), "unknown equipment 'rusty_sword'");

        let err = Reward::Item { item_id: "arrow".to_string(), count: 500 }
            .grant(&mut sink)
            .unwrap_err();
        assert_eq!(err.to_string(), "inventory full, could not add 500 x arrow");
        assert_eq!(sink.calls.len(), 3);
    }
}
