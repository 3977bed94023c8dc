//! Deterministic maze-chase simulation: a turn-based Pac-Man engine with
//! text rendering, JSON persistence and per-channel session management.

pub mod board;
pub mod constants;
pub mod engine;
pub mod ledger;
pub mod render;
pub mod rng;
pub mod session;
pub mod store;
pub mod types;
