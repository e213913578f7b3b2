//! Integration test: serial, all-or-nothing operations under concurrency.
//!
//! The ledger itself is single-writer. Concurrent callers share it behind a
//! `tokio::sync::Mutex`, holding the lock for exactly one operation, and the
//! totals must come out as if the operations ran one after another.

use std::sync::Arc;

use tokio::sync::Mutex;
use veth_ledger::{ExchangeRateLedger, LedgerConfig, LedgerError};
use veth_math::SCALE;
use veth_types::capability::{MemorySink, MemoryToken};
use veth_types::{Address, LiquiditySink};

const OWNER: Address = Address::repeat_byte(0x01);
const REPORTER: Address = Address::repeat_byte(0x0e);
const SINK: Address = Address::repeat_byte(0x0d);

type Ledger = ExchangeRateLedger<MemoryToken, MemoryToken, MemorySink>;

fn ledger() -> Ledger {
    let mut voucher = MemoryToken::new();
    voucher.mint(&OWNER, SCALE).expect("seed mint");
    ExchangeRateLedger::new(
        LedgerConfig {
            owner: OWNER,
            fee_receiver: OWNER,
            fee_rate: SCALE / 20,
            reward_reporter: REPORTER,
        },
        voucher,
        MemoryToken::new(),
        MemorySink::new(SINK),
    )
    .expect("ledger")
}

#[tokio::test]
async fn concurrent_deposits_and_rewards_serialize() {
    let shared = Arc::new(Mutex::new(ledger()));
    let mut handles = Vec::new();

    for i in 0..16u8 {
        let shared = Arc::clone(&shared);
        handles.push(tokio::spawn(async move {
            let user = Address::repeat_byte(0x40 + i);
            for _ in 0..4 {
                let mut ledger = shared.lock().await;
                ledger.deposit(&user, SCALE).expect("deposit");
                drop(ledger);
                tokio::task::yield_now().await;
            }
        }));
    }
    {
        let shared = Arc::clone(&shared);
        handles.push(tokio::spawn(async move {
            for _ in 0..8 {
                shared
                    .lock()
                    .await
                    .add_reward(&REPORTER, SCALE / 10)
                    .expect("reward");
                tokio::task::yield_now().await;
            }
        }));
    }
    for handle in handles {
        handle.await.expect("task");
    }

    let mut ledger = shared.lock().await;
    // 1 seed + 64 deposits + 8 rewards of 0.1
    assert_eq!(ledger.token_pool(), 65 * SCALE + 8 * SCALE / 10);
    assert_eq!(ledger.sink().balance(), 64 * SCALE);

    let events = ledger.drain_events();
    assert_eq!(events.len(), 72);
    let minted: u128 = (0..16u8)
        .map(|i| ledger.voucher().balance_of(&Address::repeat_byte(0x40 + i)))
        .sum();
    let fees = ledger.voucher().balance_of(&OWNER) - SCALE;
    assert_eq!(ledger.voucher_supply(), SCALE + minted + fees);
}

#[tokio::test]
async fn failed_operation_leaves_no_trace() {
    let shared = Arc::new(Mutex::new(ledger()));
    let holder = Address::repeat_byte(0x77);

    let result = {
        let mut ledger = shared.lock().await;
        ledger.withdraw_request(&holder, SCALE)
    };
    assert!(matches!(result, Err(LedgerError::Token(_))));

    let mut ledger = shared.lock().await;
    assert_eq!(ledger.token_pool(), SCALE);
    assert_eq!(ledger.voucher_supply(), SCALE);
    assert_eq!(ledger.queued_withdrawal(), 0);
    assert_eq!(ledger.withdrawal(&holder).pending, 0);
    assert!(ledger.drain_events().is_empty());
}
