//! NegotiationHandler - the message-to-decision pipeline.
//!
//! Composes the three stages per inbound message: extract a game state and
//! action from the raw text, consult the decision oracle once, and
//! guarantee a structurally valid decision comes back whatever the oracle
//! does. No state survives across calls.

use std::sync::Arc;

use crate::domain::{
    classify_action, extract_game_state, ActionType, Decision, GameState, ProposeDecision,
    VerdictDecision,
};
use crate::ports::{DecisionOracle, OracleRequest};

/// Fixed system instruction sent with every oracle request. States the
/// JSON-only rule, both reply shapes and the allocations-sum constraint.
const SYSTEM_PROMPT: &str = "\
You are an expert negotiator in a bargaining game. You will receive game \
state information and must make strategic decisions.

IMPORTANT RULES:
1. Always respond with valid JSON only - no extra text
2. Be strategic but fair - aim for mutually beneficial outcomes when possible
3. Consider your BATNA (Best Alternative To Negotiated Agreement) carefully
4. Factor in the discount rate - delayed agreements lose value

For PROPOSE actions, respond with:
{\"allocation_self\": [list of integers], \"allocation_other\": [list of integers], \"reason\": \"brief explanation\"}

For ACCEPT_OR_REJECT actions, respond with:
{\"accept\": true/false, \"reason\": \"brief explanation\"}

The allocations must sum to the total quantities available.";

/// Handler for negotiation messages.
pub struct NegotiationHandler<O: ?Sized + DecisionOracle> {
    oracle: Arc<O>,
}

impl<O: ?Sized + DecisionOracle> NegotiationHandler<O> {
    pub fn new(oracle: Arc<O>) -> Self {
        Self { oracle }
    }

    /// Processes one raw message into a final decision.
    ///
    /// Infallible by contract: every oracle failure degrades to a
    /// deterministic fallback and an unrecognized action yields the
    /// terminal withdrawal decision.
    pub async fn handle(&self, message: &str) -> Decision {
        let action = classify_action(message);

        if action == ActionType::Unknown {
            tracing::warn!("no recognized action marker in message");
            return Decision::unknown_action();
        }

        let state = extract_game_state(message);
        tracing::info!(action = %action, round = ?state.round, "handling negotiation message");

        let request = build_request(&state, action);
        let outcome = match self.oracle.decide(request).await {
            Ok(reply) => parse_oracle_reply(action, &reply),
            Err(err) => Err(err.to_string()),
        };

        match outcome {
            Ok(decision) => decision,
            Err(cause) => {
                tracing::warn!(%cause, action = %action, "oracle failed, using fallback decision");
                fallback_decision(action, &state, &cause)
            }
        }
    }
}

/// Renders the oracle request for a game state and action.
fn build_request(state: &GameState, action: ActionType) -> OracleRequest {
    OracleRequest::new(SYSTEM_PROMPT, build_user_prompt(state, action))
}

/// Renders the per-call user prompt: a game-state summary with "unknown"
/// placeholders, then action-specific guidance.
fn build_user_prompt(state: &GameState, action: ActionType) -> String {
    let mut prompt = format!(
        "Game State:\n\
         - Your valuations: {}\n\
         - Your BATNA: {}\n\
         - Total quantities: {}\n\
         - Discount factor: {}\n\
         - Current round: {}\n\
         - Role: {}\n\
         \n\
         Action Required: {}\n",
        fmt_list(&state.valuations_self),
        fmt_value(&state.batna_self),
        fmt_list(&state.quantities),
        state.discount.unwrap_or(0.98),
        state.round.unwrap_or(1),
        state.role.map(|r| r.to_string()).unwrap_or_else(unknown),
        action,
    );

    match action {
        ActionType::AcceptOrReject => {
            let offer = state.current_offer.clone().unwrap_or_default();
            prompt.push_str(&format!(
                "\nCurrent Offer to You: {}\n\
                 Their Allocation: {}\n\
                 \n\
                 Calculate the value of this offer based on your valuations and compare to your BATNA.\n\
                 Should you accept this offer?\n",
                fmt_list(&offer.allocation_self),
                fmt_list(&offer.allocation_other),
            ));
        }
        _ => {
            prompt.push_str(
                "\nMake a strategic proposal. Consider:\n\
                 1. What allocation gives you good value while being acceptable to the other party?\n\
                 2. Remember they have different valuations than you.\n\
                 3. A rejected offer means another round with discounting.\n\
                 \n\
                 Propose an allocation.\n",
            );
        }
    }

    prompt
}

fn unknown() -> String {
    "unknown".to_string()
}

fn fmt_value<T: std::fmt::Display>(value: &Option<T>) -> String {
    value.as_ref().map(|v| v.to_string()).unwrap_or_else(unknown)
}

fn fmt_list<T: std::fmt::Display>(values: &Option<Vec<T>>) -> String {
    match values {
        Some(items) => {
            let rendered: Vec<String> = items.iter().map(|v| v.to_string()).collect();
            format!("[{}]", rendered.join(", "))
        }
        None => unknown(),
    }
}

/// Parses the oracle's free-text reply into a typed decision for the
/// requested action.
///
/// Looser than the extractor's depth-balanced scan on purpose: if the
/// trimmed reply is not itself an object, take first `{` to last `}` and
/// let the JSON parser arbitrate. Tolerates commentary the oracle appends
/// around the object.
fn parse_oracle_reply(action: ActionType, reply: &str) -> Result<Decision, String> {
    let trimmed = reply.trim();

    let candidate = if trimmed.starts_with('{') {
        trimmed
    } else if let Some(start) = trimmed.find('{') {
        let end = trimmed
            .rfind('}')
            .filter(|&end| end > start)
            .ok_or_else(|| format!("Could not parse oracle reply: {trimmed}"))?;
        &trimmed[start..=end]
    } else {
        return Err(format!("Could not parse oracle reply: {trimmed}"));
    };

    match action {
        ActionType::Propose => serde_json::from_str::<ProposeDecision>(candidate)
            .map(Decision::Propose)
            .map_err(|e| format!("Oracle reply did not match proposal shape: {e}")),
        ActionType::AcceptOrReject => serde_json::from_str::<VerdictDecision>(candidate)
            .map(Decision::Verdict)
            .map_err(|e| format!("Oracle reply did not match verdict shape: {e}")),
        ActionType::Unknown => Err("no decision shape for unknown action".to_string()),
    }
}

/// Synthesizes the deterministic fallback for an oracle failure.
fn fallback_decision(action: ActionType, state: &GameState, cause: &str) -> Decision {
    match action {
        ActionType::Propose => Decision::fallback_proposal(state.quantities.as_deref(), cause),
        ActionType::AcceptOrReject => Decision::fallback_rejection(cause),
        ActionType::Unknown => Decision::unknown_action(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod prompts {
        use super::*;
        use crate::domain::{CurrentOffer, Role};

        #[test]
        fn missing_fields_render_as_unknown() {
            let prompt = build_user_prompt(&GameState::default(), ActionType::Propose);

            assert!(prompt.contains("- Your valuations: unknown"));
            assert!(prompt.contains("- Your BATNA: unknown"));
            assert!(prompt.contains("- Total quantities: unknown"));
            assert!(prompt.contains("- Role: unknown"));
            // Discount and round have conventional defaults instead.
            assert!(prompt.contains("- Discount factor: 0.98"));
            assert!(prompt.contains("- Current round: 1"));
        }

        #[test]
        fn populated_fields_render_as_lists() {
            let state = GameState {
                valuations_self: Some(vec![5.0, 2.5]),
                batna_self: Some(3.0),
                quantities: Some(vec![3, 5]),
                discount: Some(0.9),
                round: Some(4),
                role: Some(Role::Proposer),
                current_offer: None,
            };
            let prompt = build_user_prompt(&state, ActionType::Propose);

            assert!(prompt.contains("- Your valuations: [5, 2.5]"));
            assert!(prompt.contains("- Your BATNA: 3"));
            assert!(prompt.contains("- Total quantities: [3, 5]"));
            assert!(prompt.contains("- Discount factor: 0.9"));
            assert!(prompt.contains("- Current round: 4"));
            assert!(prompt.contains("- Role: proposer"));
            assert!(prompt.contains("Action Required: PROPOSE"));
        }

        #[test]
        fn propose_prompt_appends_strategic_guidance() {
            let prompt = build_user_prompt(&GameState::default(), ActionType::Propose);
            assert!(prompt.contains("Make a strategic proposal."));
            assert!(prompt.contains("another round with discounting"));
        }

        #[test]
        fn verdict_prompt_renders_the_offer() {
            let state = GameState {
                current_offer: Some(CurrentOffer {
                    allocation_self: Some(vec![2, 1]),
                    allocation_other: Some(vec![1, 4]),
                }),
                ..GameState::default()
            };
            let prompt = build_user_prompt(&state, ActionType::AcceptOrReject);

            assert!(prompt.contains("Current Offer to You: [2, 1]"));
            assert!(prompt.contains("Their Allocation: [1, 4]"));
            assert!(prompt.contains("compare to your BATNA"));
        }

        #[test]
        fn verdict_prompt_without_offer_uses_unknown() {
            let prompt = build_user_prompt(&GameState::default(), ActionType::AcceptOrReject);
            assert!(prompt.contains("Current Offer to You: unknown"));
            assert!(prompt.contains("Their Allocation: unknown"));
        }

        #[test]
        fn request_carries_the_system_prompt() {
            let request = build_request(&GameState::default(), ActionType::Propose);
            assert!(request.system_prompt.contains("valid JSON only"));
            assert!(request
                .system_prompt
                .contains("must sum to the total quantities"));
        }
    }

    mod reply_parsing {
        use super::*;

        #[test]
        fn parses_bare_verdict_object() {
            let decision =
                parse_oracle_reply(ActionType::AcceptOrReject, r#"{"accept": true, "reason": "good value"}"#)
                    .unwrap();
            let Decision::Verdict(v) = decision else {
                panic!("expected verdict");
            };
            assert!(v.accept);
            assert_eq!(v.reason, "good value");
        }

        #[test]
        fn parses_object_embedded_in_commentary() {
            let reply = r#"Sure, here you go: {"accept": false, "reason": "low value"} Thanks!"#;
            let decision = parse_oracle_reply(ActionType::AcceptOrReject, reply).unwrap();
            let Decision::Verdict(v) = decision else {
                panic!("expected verdict");
            };
            assert!(!v.accept);
        }

        #[test]
        fn parses_proposal_shape() {
            let reply = r#"{"allocation_self": [2, 3], "allocation_other": [1, 2], "reason": "fair"}"#;
            let decision = parse_oracle_reply(ActionType::Propose, reply).unwrap();
            let Decision::Propose(p) = decision else {
                panic!("expected proposal");
            };
            assert_eq!(p.allocation_self, vec![2, 3]);
            assert_eq!(p.allocation_other, vec![1, 2]);
        }

        #[test]
        fn reply_without_object_is_an_error() {
            let err = parse_oracle_reply(ActionType::Propose, "I refuse to answer.").unwrap_err();
            assert!(err.contains("Could not parse oracle reply"));
            assert!(err.contains("I refuse to answer."));
        }

        #[test]
        fn wrong_shape_for_action_is_an_error() {
            // A verdict object arriving for a PROPOSE action must not pass.
            let reply = r#"{"accept": true, "reason": "oops"}"#;
            let err = parse_oracle_reply(ActionType::Propose, reply).unwrap_err();
            assert!(err.contains("proposal shape"));
        }

        #[test]
        fn close_brace_before_open_brace_is_an_error() {
            let err = parse_oracle_reply(ActionType::Propose, "} stray then { nothing").unwrap_err();
            assert!(err.contains("Could not parse oracle reply"));
        }
    }
}
