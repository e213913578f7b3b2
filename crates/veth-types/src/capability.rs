//! Capabilities the accounting core consumes from external collaborators.
//!
//! The ledger never keeps token balances itself. It drives a voucher token,
//! a legacy token and a liquidity sink through these traits. The in-memory
//! implementations back the simulator and the test suites.

use std::collections::HashMap;

use crate::{Address, Amount};

/// Token collaborator failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// Holder balance is below the amount to move or burn.
    #[error("insufficient balance for {holder}: have {balance}, need {required}")]
    InsufficientBalance {
        /// The account being debited.
        holder: Address,
        /// Its current balance.
        balance: Amount,
        /// The amount requested.
        required: Amount,
    },

    /// Supply or balance would overflow.
    #[error("token supply overflow")]
    Overflow,
}

/// The receipt token representing a pro-rata claim on the pool.
pub trait VoucherToken {
    /// Total vouchers outstanding.
    fn total_supply(&self) -> Amount;
    /// Vouchers held by `holder`.
    fn balance_of(&self, holder: &Address) -> Amount;
    /// Create `amount` vouchers for `to`.
    fn mint(&mut self, to: &Address, amount: Amount) -> Result<(), TokenError>;
    /// Destroy `amount` vouchers held by `from`.
    fn burn(&mut self, from: &Address, amount: Amount) -> Result<(), TokenError>;
}

/// The predecessor claim token retired by conversion.
pub trait LegacyToken {
    /// Legacy tokens held by `holder`.
    fn balance_of(&self, holder: &Address) -> Amount;
    /// Move `amount` from `from` to `to`.
    fn transfer_from(&mut self, from: &Address, to: &Address, amount: Amount)
        -> Result<(), TokenError>;
}

/// Where deposited base asset and vested rewards are forwarded.
pub trait LiquiditySink {
    /// Identity of the sink, reported in events.
    fn address(&self) -> Address;
    /// Accept `amount` of base asset sent by `from`.
    fn accept(&mut self, from: &Address, amount: Amount);
    /// Base asset currently held.
    fn balance(&self) -> Amount;
}

/// A balance-map token usable as either a voucher or a legacy token.
#[derive(Debug, Clone, Default)]
pub struct MemoryToken {
    balances: HashMap<Address, Amount>,
    total_supply: Amount,
}

impl MemoryToken {
    /// Create an empty token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Balance of `holder`, zero when unknown.
    pub fn balance_of(&self, holder: &Address) -> Amount {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    /// Total supply.
    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Credit newly created tokens to `to`.
    ///
    /// # Errors
    ///
    /// - [`TokenError::Overflow`] if supply or balance would overflow
    pub fn mint(&mut self, to: &Address, amount: Amount) -> Result<(), TokenError> {
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;
        let balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;
        self.total_supply = supply;
        self.balances.insert(*to, balance);
        Ok(())
    }

    /// Destroy tokens held by `from`.
    ///
    /// # Errors
    ///
    /// - [`TokenError::InsufficientBalance`] if `from` holds less than `amount`
    pub fn burn(&mut self, from: &Address, amount: Amount) -> Result<(), TokenError> {
        let balance = self.debit_check(from, amount)?;
        self.balances.insert(*from, balance - amount);
        self.total_supply -= amount;
        Ok(())
    }

    /// Move tokens between holders.
    ///
    /// # Errors
    ///
    /// - [`TokenError::InsufficientBalance`] if `from` holds less than `amount`
    /// - [`TokenError::Overflow`] if the recipient balance would overflow
    pub fn transfer(&mut self, from: &Address, to: &Address, amount: Amount) -> Result<(), TokenError> {
        let balance = self.debit_check(from, amount)?;
        if from == to {
            return Ok(());
        }
        let credited = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;
        self.balances.insert(*from, balance - amount);
        self.balances.insert(*to, credited);
        Ok(())
    }

    fn debit_check(&self, from: &Address, amount: Amount) -> Result<Amount, TokenError> {
        let balance = self.balance_of(from);
        if balance < amount {
            return Err(TokenError::InsufficientBalance {
                holder: *from,
                balance,
                required: amount,
            });
        }
        Ok(balance)
    }
}

impl VoucherToken for MemoryToken {
    fn total_supply(&self) -> Amount {
        MemoryToken::total_supply(self)
    }

    fn balance_of(&self, holder: &Address) -> Amount {
        MemoryToken::balance_of(self, holder)
    }

    fn mint(&mut self, to: &Address, amount: Amount) -> Result<(), TokenError> {
        MemoryToken::mint(self, to, amount)
    }

    fn burn(&mut self, from: &Address, amount: Amount) -> Result<(), TokenError> {
        MemoryToken::burn(self, from, amount)
    }
}

impl LegacyToken for MemoryToken {
    fn balance_of(&self, holder: &Address) -> Amount {
        MemoryToken::balance_of(self, holder)
    }

    fn transfer_from(
        &mut self,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), TokenError> {
        self.transfer(from, to, amount)
    }
}

/// A sink that only counts what it receives.
#[derive(Debug, Clone)]
pub struct MemorySink {
    address: Address,
    balance: Amount,
    received: Vec<(Address, Amount)>,
}

impl MemorySink {
    /// Create an empty sink with the given identity.
    pub fn new(address: Address) -> Self {
        Self {
            address,
            balance: 0,
            received: Vec::new(),
        }
    }

    /// Every transfer accepted so far, in arrival order.
    pub fn received(&self) -> &[(Address, Amount)] {
        &self.received
    }
}

impl LiquiditySink for MemorySink {
    fn address(&self) -> Address {
        self.address
    }

    fn accept(&mut self, from: &Address, amount: Amount) {
        self.balance = self.balance.saturating_add(amount);
        self.received.push((*from, amount));
    }

    fn balance(&self) -> Amount {
        self.balance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: Address = Address::repeat_byte(0xa1);
    const BOB: Address = Address::repeat_byte(0xb0);

    #[test]
    fn test_mint_and_burn() {
        let mut token = MemoryToken::new();
        token.mint(&ALICE, 100).expect("mint");
        assert_eq!(token.balance_of(&ALICE), 100);
        assert_eq!(token.total_supply(), 100);

        token.burn(&ALICE, 40).expect("burn");
        assert_eq!(token.balance_of(&ALICE), 60);
        assert_eq!(token.total_supply(), 60);
    }

    #[test]
    fn test_burn_more_than_balance_rejected() {
        let mut token = MemoryToken::new();
        token.mint(&ALICE, 10).expect("mint");
        let err = token.burn(&ALICE, 11).expect_err("overdraw");
        assert!(matches!(err, TokenError::InsufficientBalance { balance: 10, required: 11, .. }));
        assert_eq!(token.total_supply(), 10);
    }

    #[test]
    fn test_mint_overflow_leaves_state() {
        let mut token = MemoryToken::new();
        token.mint(&ALICE, u128::MAX).expect("mint");
        assert_eq!(token.mint(&BOB, 1), Err(TokenError::Overflow));
        assert_eq!(token.balance_of(&BOB), 0);
    }

    #[test]
    fn test_transfer_via_legacy_trait() {
        let mut token = MemoryToken::new();
        token.mint(&ALICE, 5).expect("mint");
        LegacyToken::transfer_from(&mut token, &ALICE, &BOB, 5).expect("transfer");
        assert_eq!(token.balance_of(&ALICE), 0);
        assert_eq!(token.balance_of(&BOB), 5);
        assert_eq!(token.total_supply(), 5);
    }

    #[test]
    fn test_self_transfer_is_noop() {
        let mut token = MemoryToken::new();
        token.mint(&ALICE, 5).expect("mint");
        token.transfer(&ALICE, &ALICE, 5).expect("self transfer");
        assert_eq!(token.balance_of(&ALICE), 5);
    }

    #[test]
    fn test_sink_records_transfers() {
        let mut sink = MemorySink::new(BOB);
        sink.accept(&ALICE, 7);
        sink.accept(&ALICE, 3);
        assert_eq!(sink.balance(), 10);
        assert_eq!(sink.received(), &[(ALICE, 7), (ALICE, 3)]);
        assert_eq!(sink.address(), BOB);
    }
}
