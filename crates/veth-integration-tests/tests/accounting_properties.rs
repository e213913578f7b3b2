//! Integration test: accounting properties under random operation mixes.
//!
//! - Deposits and legacy conversions never lower the exchange rate
//! - Deposit then immediate redemption never returns more than was put in
//! - The vault never forwards more than it received

use primitive_types::U256;
use proptest::prelude::*;
use veth_ledger::{ExchangeRateLedger, LedgerConfig};
use veth_math::{Amount, SCALE};
use veth_types::capability::{MemorySink, MemoryToken};
use veth_types::time::DAY_SECONDS;
use veth_types::{Address, LiquiditySink};
use veth_vesting::{RewardVestingVault, VaultConfig, VestingError};

const OWNER: Address = Address::repeat_byte(0x01);
const OPERATOR: Address = Address::repeat_byte(0x02);
const REPORTER: Address = Address::repeat_byte(0x0e);
const FEE_RECEIVER: Address = Address::repeat_byte(0x0f);
const SINK: Address = Address::repeat_byte(0x0d);
const HOLDER: Address = Address::repeat_byte(0xa1);

const BASE_TIME: u64 = 1_700_000_000;
const MAX_AMOUNT: u128 = 1_000_000 * SCALE;

type Ledger = ExchangeRateLedger<MemoryToken, MemoryToken, MemorySink>;

fn ledger(fee_rate: Amount) -> Ledger {
    let mut voucher = MemoryToken::new();
    voucher.mint(&OWNER, SCALE).expect("seed mint");
    let mut legacy = MemoryToken::new();
    legacy.mint(&HOLDER, u128::MAX / 2).expect("legacy supply");
    ExchangeRateLedger::new(
        LedgerConfig {
            owner: OWNER,
            fee_receiver: FEE_RECEIVER,
            fee_rate,
            reward_reporter: REPORTER,
        },
        voucher,
        legacy,
        MemorySink::new(SINK),
    )
    .expect("ledger")
}

/// `pool_a / supply_a <= pool_b / supply_b`, compared exactly.
fn rate_not_lower(pool_a: Amount, supply_a: Amount, pool_b: Amount, supply_b: Amount) -> bool {
    U256::from(pool_a) * U256::from(supply_b) <= U256::from(pool_b) * U256::from(supply_a)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn entries_never_lower_the_rate(
        fee_rate in 0u128..=SCALE,
        reward in 1u128..MAX_AMOUNT,
        entries in prop::collection::vec((any::<bool>(), 1u128..MAX_AMOUNT), 1..10),
    ) {
        let mut ledger = ledger(fee_rate);
        ledger.add_reward(&REPORTER, reward).expect("reward");

        for (legacy, amount) in entries {
            let (pool, supply) = (ledger.token_pool(), ledger.voucher_supply());
            if legacy {
                ledger.convert_legacy(&HOLDER, amount).expect("convert");
            } else {
                ledger.deposit(&HOLDER, amount).expect("deposit");
            }
            prop_assert!(rate_not_lower(
                pool,
                supply,
                ledger.token_pool(),
                ledger.voucher_supply()
            ));
        }
    }

    #[test]
    fn deposit_then_redeem_never_gains(
        fee_rate in 0u128..=SCALE,
        reward in 0u128..MAX_AMOUNT,
        amount in 1u128..MAX_AMOUNT,
    ) {
        let mut ledger = ledger(fee_rate);
        if reward > 0 {
            ledger.add_reward(&REPORTER, reward).expect("reward");
        }
        let minted = ledger.deposit(&HOLDER, amount).expect("deposit");
        prop_assume!(minted > 0);
        let owed = ledger.withdraw_request(&HOLDER, minted).expect("request");
        prop_assert!(owed <= amount);
        if reward == 0 {
            prop_assert_eq!(owed, amount);
        }
    }

    #[test]
    fn vault_never_pays_more_than_received(
        lumps in prop::collection::vec((0u64..40, 30u128..MAX_AMOUNT), 1..6),
        drip_days in prop::collection::vec(0u64..20, 1..20),
    ) {
        let mut vault = RewardVestingVault::new(
            VaultConfig::new(Address::repeat_byte(0x0c), OWNER, OPERATOR),
            MemorySink::new(SINK),
            BASE_TIME,
        )
        .expect("vault");

        let mut lump_day = 0u64;
        let mut drip_day = 0u64;
        let mut lumps = lumps.into_iter();
        for gap in drip_days {
            if let Some((offset, amount)) = lumps.next() {
                lump_day = lump_day.max(drip_day) + offset;
                vault
                    .receive_reward(&OPERATOR, amount, BASE_TIME + lump_day * DAY_SECONDS)
                    .expect("receive");
            }
            drip_day = drip_day.max(lump_day) + gap;
            match vault.drip(&OPERATOR, BASE_TIME + drip_day * DAY_SECONDS) {
                Ok(_) | Err(VestingError::PaidToday { .. }) => {}
                Err(other) => return Err(TestCaseError::fail(format!("drip: {other}"))),
            }
            let reward = vault.reward();
            prop_assert!(reward.paid <= reward.total);
            prop_assert_eq!(vault.sink().balance(), reward.paid);
            prop_assert!(reward.last_paid_at <= reward.finish_at);
        }
    }
}

#[test]
fn vault_releases_everything_but_rounding_dust() {
    let mut vault = RewardVestingVault::new(
        VaultConfig::new(Address::repeat_byte(0x0c), OWNER, OPERATOR),
        MemorySink::new(SINK),
        BASE_TIME,
    )
    .expect("vault");
    vault.receive_reward(&OPERATOR, 7 * SCALE, BASE_TIME).expect("first");
    vault
        .receive_reward(&OPERATOR, 5 * SCALE, BASE_TIME + 11 * DAY_SECONDS)
        .expect("second");

    vault.drip(&OPERATOR, BASE_TIME + 365 * DAY_SECONDS).expect("drip");
    let reward = vault.reward();
    // At most one unit per window day is lost to the per-day floor, per lump
    assert!(reward.total - reward.paid <= 2 * 30);
    assert_eq!(vault.claimable(BASE_TIME + 400 * DAY_SECONDS).expect("claimable"), 0);
}
