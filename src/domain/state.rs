//! Game state extraction and action classification.
//!
//! Incoming messages are free text with a structured payload embedded either
//! in a ```json fenced block or as a bare brace-delimited object. Extraction
//! degrades rather than fails: any malformed payload yields an empty
//! (all-unknown) state so the rest of the pipeline never sees a parse error.

use serde::{Deserialize, Serialize};

/// Marker line for proposal requests. The exact format is a contract with
/// the assessor that routes messages to this agent.
const PROPOSE_MARKER: &str = "Action: PROPOSE";

/// Marker line for accept/reject requests.
const ACCEPT_OR_REJECT_MARKER: &str = "Action: ACCEPT_OR_REJECT";

/// The action a message asks the agent to take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    /// Make a proposal for how to split the items.
    Propose,
    /// Accept or reject the offer currently on the table.
    AcceptOrReject,
    /// No recognized action marker; terminal, no oracle call is made.
    Unknown,
}

impl ActionType {
    /// Display name used in prompts, matching the marker convention.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Propose => "PROPOSE",
            ActionType::AcceptOrReject => "ACCEPT_OR_REJECT",
            ActionType::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side of the bargaining game this agent plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Proposer,
    Responder,
    /// Any role string we do not recognize. Tolerated rather than failing
    /// the whole state parse, since role is informational in prompts.
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Proposer => f.write_str("proposer"),
            Role::Responder => f.write_str("responder"),
            Role::Unknown => f.write_str("unknown"),
        }
    }
}

/// The offer currently on the table, from this agent's perspective.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentOffer {
    /// Items offered to us, per item-type index.
    #[serde(default)]
    pub allocation_self: Option<Vec<u32>>,
    /// Items the counterpart keeps, per item-type index.
    #[serde(default)]
    pub allocation_other: Option<Vec<u32>>,
}

/// Structured bargaining state recovered from a message.
///
/// Every field is optional: missing data is legal and rendered as "unknown"
/// in oracle prompts, never treated as an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Our valuation per item type, aligned by index with `quantities`.
    #[serde(default)]
    pub valuations_self: Option<Vec<f64>>,
    /// Value we secure if no deal is reached.
    #[serde(default)]
    pub batna_self: Option<f64>,
    /// Total quantity available per item type.
    #[serde(default)]
    pub quantities: Option<Vec<u32>>,
    /// Per-round multiplicative value decay, in (0, 1].
    #[serde(default)]
    pub discount: Option<f64>,
    /// Current round, starting at 1.
    #[serde(default)]
    pub round: Option<u32>,
    /// Which side we play.
    #[serde(default)]
    pub role: Option<Role>,
    /// Present only when responding to an offer.
    #[serde(default)]
    pub current_offer: Option<CurrentOffer>,
}

impl GameState {
    /// An all-unknown state, used when no payload can be recovered.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Classifies the requested action by scanning for the literal markers.
///
/// Deliberately a substring containment test and nothing more; the marker
/// line format is trusted upstream contract.
pub fn classify_action(message: &str) -> ActionType {
    if message.contains(PROPOSE_MARKER) {
        ActionType::Propose
    } else if message.contains(ACCEPT_OR_REJECT_MARKER) {
        ActionType::AcceptOrReject
    } else {
        ActionType::Unknown
    }
}

/// Extracts a [`GameState`] from raw message text.
///
/// Priority order: a ```json fenced block wins, then the first
/// depth-balanced `{...}` object, then the empty state. Any JSON parse
/// failure also yields the empty state.
pub fn extract_game_state(message: &str) -> GameState {
    let Some(payload) = locate_payload(message) else {
        return GameState::empty();
    };
    serde_json::from_str(payload).unwrap_or_else(|_| GameState::empty())
}

/// Finds the candidate JSON payload inside the message, if any.
fn locate_payload(message: &str) -> Option<&str> {
    if let Some(block) = fenced_block(message) {
        return Some(block);
    }
    balanced_object(message)
}

/// Everything between a ```json opening fence and the next closing fence.
fn fenced_block(message: &str) -> Option<&str> {
    let start = message.find("```json")? + "```json".len();
    let rest = &message[start..];
    let end = rest.find("```")?;
    Some(rest[..end].trim())
}

/// The first balanced `{...}` object, found by tracking brace depth from
/// the first `{`. Braces before the first `{` cannot affect the scan.
fn balanced_object(message: &str) -> Option<&str> {
    let start = message.find('{')?;
    let mut depth = 0usize;
    for (offset, c) in message[start..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&message[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}
