//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `DecisionOracle` - Port for the external reasoning service

mod oracle;

pub use oracle::{DecisionOracle, OracleError, OracleRequest};
