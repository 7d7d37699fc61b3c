//! Decision oracle adapters: the Anthropic-backed implementation and a
//! configurable mock for tests.

mod anthropic;
mod mock;

pub use anthropic::{AnthropicConfig, AnthropicOracle};
pub use mock::{MockError, MockOracle};
