//! Error types for the idle-session subsystem.

use thiserror::Error;

/// Errors surfaced by the idle-session core and its collaborators.
#[derive(Debug, Error)]
pub enum Error {
	/// Policy values violate `0 < warning_lead < timeout`.
	#[error("Invalid session policy: {0}")]
	InvalidPolicy(String),

	/// The identity provider rejected or failed sign-out.
	#[error("Identity revocation failed: {0}")]
	Revocation(String),

	/// The credential store could not be read or written.
	#[error("Credential store error: {0}")]
	Credential(String),

	/// The warning prompt was dismissed without an answer.
	#[error("Warning prompt dismissed: {0}")]
	Prompt(String),

	/// The session has already been logged out.
	#[error("Session already terminated")]
	Terminated,

	/// The session was detached from its view.
	#[error("Session detached")]
	Detached,

	/// Scheduling requires a Tokio runtime.
	#[error("No Tokio runtime available: {0}")]
	Runtime(String),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),
}

/// Result alias for idle-session operations.
pub type Result<T> = std::result::Result<T, Error>;
