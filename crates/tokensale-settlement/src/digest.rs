//! Settlement digest for cross-replica consistency.
//!
//! Two replicas that replay the same purchases in the same order must reach
//! the same allocations. The digest is a SHA-256 over every allocation line
//! in buyer order, so replicas can compare one 32-byte value instead of the
//! full ledger.

use sha2::{Digest, Sha256};
use tokensale_types::{Allocation, constants};

/// Compute the digest over allocation lines, in order.
///
/// Depends on: buyer address, contribution, granted tokens, cost, refund.
/// The same lines in the same order always produce the same digest.
#[must_use]
pub fn compute_settlement_digest(allocations: &[Allocation]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(constants::SETTLEMENT_DIGEST_DOMAIN);
    hasher.update((allocations.len() as u64).to_le_bytes());

    for line in allocations {
        hasher.update(line.buyer.as_bytes());
        hasher.update(line.contribution.to_le_bytes());
        hasher.update(line.granted_tokens.to_le_bytes());
        hasher.update(line.cost.to_le_bytes());
        hasher.update(line.refund.to_le_bytes());
    }

    hasher.finalize().into()
}

/// Recompute the digest and compare it with `expected`.
#[must_use]
pub fn verify_settlement_digest(allocations: &[Allocation], expected: &[u8; 32]) -> bool {
    compute_settlement_digest(allocations) == *expected
}

#[cfg(test)]
mod tests {
    use tokensale_types::Principal;

    use super::*;

    fn line(n: u8, granted: u128) -> Allocation {
        Allocation {
            buyer: Principal::repeat(n),
            contribution: granted * 10 + 3,
            granted_tokens: granted,
            cost: granted * 10,
            refund: 3,
        }
    }

    #[test]
    fn empty_is_deterministic() {
        assert_eq!(compute_settlement_digest(&[]), compute_settlement_digest(&[]));
    }

    #[test]
    fn same_lines_same_digest() {
        let lines = vec![line(1, 5), line(2, 7)];
        assert_eq!(
            compute_settlement_digest(&lines),
            compute_settlement_digest(&lines.clone())
        );
    }

    #[test]
    fn order_matters() {
        let ab = compute_settlement_digest(&[line(1, 5), line(2, 7)]);
        let ba = compute_settlement_digest(&[line(2, 7), line(1, 5)]);
        assert_ne!(ab, ba, "Buyer order must affect the digest");
    }

    #[test]
    fn refund_change_changes_digest() {
        let mut changed = line(1, 5);
        changed.refund = 4;
        assert_ne!(
            compute_settlement_digest(&[line(1, 5)]),
            compute_settlement_digest(&[changed])
        );
    }

    #[test]
    fn verify_roundtrip() {
        let lines = vec![line(1, 5)];
        let digest = compute_settlement_digest(&lines);
        assert!(verify_settlement_digest(&lines, &digest));
        assert!(!verify_settlement_digest(&lines, &[0xAB; 32]));
    }
}
