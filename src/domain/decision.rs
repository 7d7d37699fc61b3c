//! Decision types returned to the caller, plus deterministic fallbacks.
//!
//! Field names are fixed wire contracts with the assessor:
//! `allocation_self`/`allocation_other`/`reason` for proposals,
//! `accept`/`reason` for verdicts, `error`/`action` for the terminal
//! unrecognized-action case.

use serde::{Deserialize, Serialize};

/// Quantities assumed by the proposal fallback when the message carried no
/// usable quantities at all. An arbitrary placeholder kept for
/// compatibility with the assessor's original agent behavior.
const PLACEHOLDER_QUANTITIES: [u32; 3] = [1, 1, 1];

/// A proposed split of the items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposeDecision {
    /// Items we keep, per item-type index.
    pub allocation_self: Vec<u32>,
    /// Items the counterpart receives, per item-type index.
    pub allocation_other: Vec<u32>,
    /// Human-readable rationale.
    pub reason: String,
}

/// An accept/reject verdict on the offer currently on the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictDecision {
    pub accept: bool,
    pub reason: String,
}

/// Disposition reported when the requested action is unrecognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Disposition {
    /// Withdraw from the interaction; commits to nothing.
    Walk,
}

/// Terminal error decision for messages with no recognized action marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnknownActionDecision {
    pub error: String,
    pub action: Disposition,
}

/// The final decision produced by the pipeline, always structurally valid
/// for the requested action type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Decision {
    Propose(ProposeDecision),
    Verdict(VerdictDecision),
    UnknownAction(UnknownActionDecision),
}

impl Decision {
    /// Deterministic even-split proposal used when the oracle fails.
    ///
    /// For each item type we keep `q / 2` (integer floor) and hand the
    /// remainder across, so the two allocations always sum exactly to the
    /// totals, odd quantities included. Wholly unknown quantities fall back
    /// to [`PLACEHOLDER_QUANTITIES`].
    pub fn fallback_proposal(quantities: Option<&[u32]>, cause: &str) -> Self {
        let quantities = quantities.unwrap_or(&PLACEHOLDER_QUANTITIES);
        let allocation_self: Vec<u32> = quantities.iter().map(|q| q / 2).collect();
        let allocation_other: Vec<u32> = quantities
            .iter()
            .zip(&allocation_self)
            .map(|(q, s)| q - s)
            .collect();
        Decision::Propose(ProposeDecision {
            allocation_self,
            allocation_other,
            reason: format!("Fallback proposal due to error: {cause}"),
        })
    }

    /// Reject-by-default verdict used when the oracle fails.
    pub fn fallback_rejection(cause: &str) -> Self {
        Decision::Verdict(VerdictDecision {
            accept: false,
            reason: format!("Fallback rejection due to error: {cause}"),
        })
    }

    /// Terminal decision for an unrecognized action: withdraw rather than
    /// commit to anything.
    pub fn unknown_action() -> Self {
        Decision::UnknownAction(UnknownActionDecision {
            error: "Unknown action type".to_string(),
            action: Disposition::Walk,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn fallback_proposal_splits_evenly() {
        let decision = Decision::fallback_proposal(Some(&[3, 5]), "oracle unreachable");
        let Decision::Propose(p) = decision else {
            panic!("expected proposal");
        };
        assert_eq!(p.allocation_self, vec![1, 2]);
        assert_eq!(p.allocation_other, vec![2, 3]);
        assert_eq!(
            p.reason,
            "Fallback proposal due to error: oracle unreachable"
        );
    }

    #[test]
    fn fallback_proposal_without_quantities_uses_placeholder() {
        let Decision::Propose(p) = Decision::fallback_proposal(None, "x") else {
            panic!("expected proposal");
        };
        assert_eq!(p.allocation_self, vec![0, 0, 0]);
        assert_eq!(p.allocation_other, vec![1, 1, 1]);
    }

    #[test]
    fn fallback_rejection_embeds_cause() {
        let Decision::Verdict(v) = Decision::fallback_rejection("timeout") else {
            panic!("expected verdict");
        };
        assert!(!v.accept);
        assert_eq!(v.reason, "Fallback rejection due to error: timeout");
    }

    #[test]
    fn unknown_action_serializes_to_walk_shape() {
        let json = serde_json::to_value(Decision::unknown_action()).unwrap();
        assert_eq!(json["error"], "Unknown action type");
        assert_eq!(json["action"], "WALK");
    }

    #[test]
    fn proposal_serializes_with_contract_field_names() {
        let decision = Decision::Propose(ProposeDecision {
            allocation_self: vec![2, 0],
            allocation_other: vec![1, 4],
            reason: "keep the books".to_string(),
        });
        let json = serde_json::to_value(decision).unwrap();
        assert_eq!(json["allocation_self"], serde_json::json!([2, 0]));
        assert_eq!(json["allocation_other"], serde_json::json!([1, 4]));
        assert_eq!(json["reason"], "keep the books");
    }

    proptest! {
        #[test]
        fn fallback_allocations_always_sum_to_quantities(
            quantities in proptest::collection::vec(0u32..10_000, 0..16)
        ) {
            let Decision::Propose(p) =
                Decision::fallback_proposal(Some(&quantities), "err")
            else {
                panic!("expected proposal");
            };
            prop_assert_eq!(p.allocation_self.len(), quantities.len());
            for (i, q) in quantities.iter().enumerate() {
                prop_assert_eq!(p.allocation_self[i], q / 2);
                prop_assert_eq!(p.allocation_self[i] + p.allocation_other[i], *q);
            }
        }
    }
}
