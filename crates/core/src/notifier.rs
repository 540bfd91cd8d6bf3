//! Warning notifier.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::collaborators::WarningPrompt;

/// Operator decision at the warning deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningOutcome {
	/// Keep the session; the scheduler resets.
	Extend,
	/// Log out now without waiting for expiry.
	Terminate,
}

/// Offers the extend-or-accept choice through an injected prompt.
#[derive(Clone)]
pub struct WarningNotifier {
	prompt: Arc<dyn WarningPrompt>,
}

impl WarningNotifier {
	pub fn new(prompt: Arc<dyn WarningPrompt>) -> Self {
		Self { prompt }
	}

	/// Asks the operator whether to extend. Dismissal counts as declining.
	pub async fn notify(&self, remaining: Duration) -> WarningOutcome {
		info!(target = "idle.notifier", remaining_ms = remaining.as_millis() as u64, "session about to expire");
		match self.prompt.ask_extend(remaining).await {
			Ok(true) => {
				info!(target = "idle.notifier", "operator extended session");
				WarningOutcome::Extend
			}
			Ok(false) => {
				info!(target = "idle.notifier", "operator accepted logout");
				WarningOutcome::Terminate
			}
			Err(err) => {
				warn!(target = "idle.notifier", error = %err, "warning prompt dismissed; logging out");
				WarningOutcome::Terminate
			}
		}
	}
}
