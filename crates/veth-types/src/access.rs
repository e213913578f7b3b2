//! Owner gating and emergency pause.
//!
//! Administrative calls check the caller against the recorded owner;
//! user-facing calls check the pause flag first. Each privileged operation
//! states its [`Role`] so a rejection says which role was missing.

use std::fmt;

use crate::Address;

/// A privileged identity an operation may require.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// Administrator of a component.
    Owner,
    /// The collaborator allowed to report rewards and penalties.
    RewardReporter,
    /// The account allowed to trigger the vault drip.
    Operator,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Owner => "owner",
            Role::RewardReporter => "reward reporter",
            Role::Operator => "operator",
        };
        f.write_str(name)
    }
}

/// Access-gate failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    /// Caller does not hold the required role.
    #[error("caller {caller} is not the {role}")]
    Unauthorized {
        /// The role that was required.
        role: Role,
        /// The rejected caller.
        caller: Address,
    },

    /// The component is paused.
    #[error("paused")]
    Paused,
}

/// Check that `caller` is the holder of `role`.
///
/// # Errors
///
/// - [`AccessError::Unauthorized`] if the identities differ
pub fn ensure_role(role: Role, holder: &Address, caller: &Address) -> Result<(), AccessError> {
    if holder != caller {
        return Err(AccessError::Unauthorized {
            role,
            caller: *caller,
        });
    }
    Ok(())
}

/// Owner identity plus a pause switch.
#[derive(Debug, Clone)]
pub struct AccessGate {
    owner: Address,
    paused: bool,
}

impl AccessGate {
    /// Create an unpaused gate owned by `owner`.
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            paused: false,
        }
    }

    /// Require `caller` to be the owner.
    ///
    /// # Errors
    ///
    /// - [`AccessError::Unauthorized`] if `caller` is not the owner
    pub fn ensure_owner(&self, caller: &Address) -> Result<(), AccessError> {
        ensure_role(Role::Owner, &self.owner, caller)
    }

    /// Require the gate to be open.
    ///
    /// # Errors
    ///
    /// - [`AccessError::Paused`] while paused
    pub fn ensure_not_paused(&self) -> Result<(), AccessError> {
        if self.paused {
            return Err(AccessError::Paused);
        }
        Ok(())
    }

    /// Pause user-facing operations. Owner only.
    pub fn pause(&mut self, caller: &Address) -> Result<(), AccessError> {
        self.ensure_owner(caller)?;
        tracing::warn!(%caller, "access gate: paused");
        self.paused = true;
        Ok(())
    }

    /// Resume user-facing operations. Owner only.
    pub fn unpause(&mut self, caller: &Address) -> Result<(), AccessError> {
        self.ensure_owner(caller)?;
        tracing::info!(%caller, "access gate: unpaused");
        self.paused = false;
        Ok(())
    }

    /// Hand ownership to `new_owner`. Owner only.
    pub fn transfer_ownership(
        &mut self,
        caller: &Address,
        new_owner: Address,
    ) -> Result<(), AccessError> {
        self.ensure_owner(caller)?;
        tracing::warn!(previous = %self.owner, %new_owner, "access gate: ownership transferred");
        self.owner = new_owner;
        Ok(())
    }

    /// Current owner.
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Whether user-facing operations are paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: Address = Address::repeat_byte(0x01);
    const ATTACKER: Address = Address::repeat_byte(0x66);

    #[test]
    fn test_new_gate_is_open() {
        let gate = AccessGate::new(OWNER);
        assert!(!gate.is_paused());
        assert_eq!(gate.owner(), OWNER);
        gate.ensure_not_paused().expect("open");
    }

    #[test]
    fn test_pause_and_unpause() {
        let mut gate = AccessGate::new(OWNER);
        gate.pause(&OWNER).expect("pause");
        assert!(gate.is_paused());
        assert_eq!(gate.ensure_not_paused(), Err(AccessError::Paused));

        gate.unpause(&OWNER).expect("unpause");
        assert!(!gate.is_paused());
    }

    #[test]
    fn test_pause_by_attacker_rejected() {
        let mut gate = AccessGate::new(OWNER);
        let err = gate.pause(&ATTACKER).expect_err("attacker");
        assert_eq!(
            err,
            AccessError::Unauthorized {
                role: Role::Owner,
                caller: ATTACKER
            }
        );
        assert!(!gate.is_paused());
        assert!(gate.unpause(&ATTACKER).is_err());
    }

    #[test]
    fn test_transfer_ownership() {
        let mut gate = AccessGate::new(OWNER);
        let new_owner = Address::repeat_byte(0x02);
        gate.transfer_ownership(&OWNER, new_owner).expect("transfer");
        assert_eq!(gate.owner(), new_owner);
        // Old owner lost its rights
        assert!(gate.ensure_owner(&OWNER).is_err());
    }

    #[test]
    fn test_transfer_ownership_by_attacker_rejected() {
        let mut gate = AccessGate::new(OWNER);
        assert!(gate.transfer_ownership(&ATTACKER, ATTACKER).is_err());
        assert_eq!(gate.owner(), OWNER);
    }

    #[test]
    fn test_role_display() {
        let err = ensure_role(Role::Operator, &OWNER, &ATTACKER).expect_err("mismatch");
        assert!(err.to_string().contains("operator"));
    }
}
