//! Owner capability: a single principal allowed to perform privileged calls.

use tokensale_types::{Principal, Result, SaleError};

/// Access-control policy naming exactly one authorized principal.
pub trait OwnerCapability {
    /// The authorized principal.
    fn owner(&self) -> Principal;

    /// Fail with [`SaleError::Unauthorized`] for any caller but the owner.
    fn require_owner(&self, caller: Principal) -> Result<()> {
        if caller == self.owner() {
            Ok(())
        } else {
            tracing::warn!(caller = %caller, "Privileged call rejected: caller is not the owner");
            Err(SaleError::Unauthorized)
        }
    }
}

/// The plain owner capability: a fixed principal set at deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SingleOwner {
    owner: Principal,
}

impl SingleOwner {
    #[must_use]
    pub fn new(owner: Principal) -> Self {
        Self { owner }
    }
}

impl OwnerCapability for SingleOwner {
    fn owner(&self) -> Principal {
        self.owner
    }
}
