//! Pure derivation of the session phase.

use idle_protocol::SessionState;
use tokio::time::Instant;

use crate::policy::SessionPolicy;

/// Computes the phase at `now` from the last recorded activity.
///
/// An ended session, terminated or detached, is always
/// [`SessionState::Expired`]. Otherwise the phase depends only on how far
/// `now` is past `last_activity`.
pub fn derive_state(now: Instant, last_activity: Instant, policy: &SessionPolicy, ended: bool) -> SessionState {
	if ended {
		return SessionState::Expired;
	}
	let idle = now.saturating_duration_since(last_activity);
	if idle < policy.warning_delay() {
		SessionState::Active
	} else if idle < policy.timeout() {
		SessionState::Warning
	} else {
		SessionState::Expired
	}
}
