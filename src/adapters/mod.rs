//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `oracle` - Decision oracle implementations (Anthropic, mock)

pub mod oracle;

pub use oracle::{AnthropicConfig, AnthropicOracle, MockError, MockOracle};
