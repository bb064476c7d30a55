//! Allow-list capability: the set of principals eligible to purchase.
//!
//! Membership defaults to `false`. Only the owner can flip it, and flipping
//! is idempotent.

use std::collections::HashSet;

use tokensale_types::{Principal, Result, SaleError};

use crate::owner::{OwnerCapability, SingleOwner};

/// Eligibility policy consulted before any purchase.
pub trait AllowListCapability {
    /// Whether `principal` may purchase.
    fn is_allowed(&self, principal: &Principal) -> bool;

    /// Set membership of `principal`. Owner-gated.
    ///
    /// # Errors
    /// Returns `Unauthorized` if `caller` is not the owner.
    fn set_allowed(&mut self, caller: Principal, principal: Principal, allowed: bool)
    -> Result<()>;

    /// Fail with [`SaleError::NotAllowed`] for non-members.
    fn require_allowed(&self, principal: &Principal) -> Result<()> {
        if self.is_allowed(principal) {
            Ok(())
        } else {
            Err(SaleError::NotAllowed)
        }
    }
}

/// In-memory allow-list whose mutations are guarded by an owner capability.
#[derive(Debug, Clone)]
pub struct AllowList<O: OwnerCapability = SingleOwner> {
    /// Guard for `set_allowed`.
    owner: O,
    /// Current members.
    members: HashSet<Principal>,
}

impl<O: OwnerCapability> AllowList<O> {
    /// Create an empty allow-list administered by `owner`.
    #[must_use]
    pub fn new(owner: O) -> Self {
        Self {
            owner,
            members: HashSet::new(),
        }
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether nobody is allowed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl<O: OwnerCapability> AllowListCapability for AllowList<O> {
    fn is_allowed(&self, principal: &Principal) -> bool {
        self.members.contains(principal)
    }

    fn set_allowed(
        &mut self,
        caller: Principal,
        principal: Principal,
        allowed: bool,
    ) -> Result<()> {
        self.owner.require_owner(caller)?;
        if allowed {
            self.members.insert(principal);
        } else {
            self.members.remove(&principal);
        }
        tracing::debug!(principal = %principal, allowed, "Allow-list updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Principal, AllowList) {
        let owner = Principal::random();
        (owner, AllowList::new(SingleOwner::new(owner)))
    }

    #[test]
    fn default_is_not_allowed() {
        let (_, list) = setup();
        assert!(!list.is_allowed(&Principal::random()));
        assert!(list.is_empty());
    }

    #[test]
    fn owner_can_allow_and_revoke() {
        let (owner, mut list) = setup();
        let buyer = Principal::random();

        list.set_allowed(owner, buyer, true).unwrap();
        assert!(list.is_allowed(&buyer));
        assert!(list.require_allowed(&buyer).is_ok());

        list.set_allowed(owner, buyer, false).unwrap();
        assert!(!list.is_allowed(&buyer));
        assert_eq!(list.require_allowed(&buyer).unwrap_err(), SaleError::NotAllowed);
    }

    #[test]
    fn set_allowed_is_idempotent() {
        let (owner, mut list) = setup();
        let buyer = Principal::random();
        list.set_allowed(owner, buyer, true).unwrap();
        list.set_allowed(owner, buyer, true).unwrap();
        assert_eq!(list.len(), 1);

        list.set_allowed(owner, buyer, false).unwrap();
        list.set_allowed(owner, buyer, false).unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn non_owner_cannot_mutate() {
        let (_, mut list) = setup();
        let intruder = Principal::random();
        let err = list.set_allowed(intruder, intruder, true).unwrap_err();
        assert_eq!(err, SaleError::Unauthorized);
        assert!(!list.is_allowed(&intruder));
    }
}
