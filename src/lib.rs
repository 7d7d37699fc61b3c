//! Bargain Pilot - LLM-Powered Negotiation Agent
//!
//! This crate implements the message-to-decision pipeline for a turn-based
//! bargaining game: extract a game state from free text, consult an LLM
//! oracle for a strategic decision, and guarantee a game-legal response
//! even when the oracle fails.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
