//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `state` - Extracted game state and action classification
//! - `decision` - Decision shapes and deterministic fallbacks

mod decision;
mod state;

pub use decision::{
    Decision, Disposition, ProposeDecision, UnknownActionDecision, VerdictDecision,
};
pub use state::{
    classify_action, extract_game_state, ActionType, CurrentOffer, GameState, Role,
};
