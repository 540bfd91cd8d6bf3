//! Terminal harness for the idle-session subsystem.
//!
//! Exposes the resolved policy, manages a file-backed bearer credential and
//! runs a live idle session driven by stdin lines.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod store;
pub mod terminal;
