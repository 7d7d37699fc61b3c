//! Application layer - the message-to-decision pipeline handler.
//!
//! Orchestrates domain operations and coordinates with the oracle port.

mod negotiate;

pub use negotiate::NegotiationHandler;
