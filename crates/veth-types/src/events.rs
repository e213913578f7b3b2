//! Events emitted by the ledger and the vesting vault.
//!
//! Each successful state transition records exactly one event. Failed
//! operations record nothing.

use serde::Serialize;

use crate::{Address, Amount};

/// Every observable protocol event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// Base asset deposited and vouchers minted.
    Deposited {
        user: Address,
        base_amount: Amount,
        voucher_amount: Amount,
    },
    /// Legacy tokens burned and vouchers minted.
    Renewed {
        user: Address,
        base_amount: Amount,
        voucher_amount: Amount,
    },
    /// Reported reward added to the pool, with the fee vouchers minted.
    RewardAdded {
        reporter: Address,
        amount: Amount,
        fee: Amount,
    },
    /// Reported penalty removed from the pool.
    RewardRemoved { reporter: Address, amount: Amount },
    /// Vouchers burned and a base-asset claim queued.
    WithdrawalRequested {
        user: Address,
        voucher_amount: Amount,
        base_amount: Amount,
    },
    /// Queued base asset paid out.
    WithdrawalCompleted { user: Address, amount: Amount },
    /// Lump reward received by the vesting vault.
    RewardReceived { payer: Address, amount: Amount },
    /// Vested reward forwarded by the vault to the liquidity sink.
    VaultRewardAdded {
        operator: Address,
        sink: Address,
        amount: Amount,
    },
}

impl Event {
    /// Stable name of the event kind.
    pub fn name(&self) -> &'static str {
        match self {
            Event::Deposited { .. } => "Deposited",
            Event::Renewed { .. } => "Renewed",
            Event::RewardAdded { .. } => "RewardAdded",
            Event::RewardRemoved { .. } => "RewardRemoved",
            Event::WithdrawalRequested { .. } => "WithdrawalRequested",
            Event::WithdrawalCompleted { .. } => "WithdrawalCompleted",
            Event::RewardReceived { .. } => "RewardReceived",
            Event::VaultRewardAdded { .. } => "VaultRewardAdded",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_shape() {
        let event = Event::WithdrawalCompleted {
            user: Address::repeat_byte(0x11),
            amount: 5,
        };
        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["event"], "withdrawal_completed");
        assert_eq!(json["amount"], 5);
        assert_eq!(event.name(), "WithdrawalCompleted");
    }
}
