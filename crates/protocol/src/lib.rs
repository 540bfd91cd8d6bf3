//! Data types for the idle-session subsystem.
//!
//! This crate contains the serde-serializable types exchanged between the
//! idle-session core and the surfaces around it: input signals, the derived
//! session state projection, and credential cookie attributes.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! * Pure data: No behavior beyond serialization/deserialization
//! * Consumer-facing: Safe to hand to UI code without exposing timer handles
//!
//! Scheduling behavior is built on top of these types in `idle-rs`.

pub mod credential;
pub mod signal;
pub mod state;

pub use credential::*;
pub use signal::*;
pub use state::*;
