//! Command-line host for the bracketeer engine.
//!
//! Wires the engine to an in-memory store and the wall clock, then runs a
//! simulated tournament from registration to payout.

pub mod config;
pub mod logging;
pub mod simulation;
pub mod throttle;
