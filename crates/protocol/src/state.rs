//! Derived session state exposed to UI consumers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Phase of an idle session, computed on demand and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
	/// Before the warning deadline.
	Active,
	/// Warning deadline elapsed, expiry not yet reached.
	Warning,
	/// Expiry deadline reached or the session was terminated.
	Expired,
}

impl fmt::Display for SessionState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			SessionState::Active => "active",
			SessionState::Warning => "warning",
			SessionState::Expired => "expired",
		})
	}
}

/// Read projection for countdown rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
	pub state: SessionState,
	pub time_until_warning_ms: u64,
	pub time_until_expiry_ms: u64,
	/// Whether the logout path has already run for this session.
	pub terminated: bool,
}
