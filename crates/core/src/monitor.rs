//! Activity monitor.

use std::sync::Arc;

use idle_protocol::SurfaceEvent;
use tracing::debug;

use crate::collaborators::{InputSurface, ListenerId, SignalHandler};
use crate::policy::SessionPolicy;

/// Listens for the policy's activity signals and reports each one.
///
/// The monitor does not debounce: high-frequency signals such as pointer
/// movement simply report more often. It never touches the activity record
/// itself; `on_activity` decides what a signal means.
pub struct ActivityMonitor {
	surface: Arc<dyn InputSurface>,
	listeners: Vec<ListenerId>,
}

impl ActivityMonitor {
	/// Registers one capturing listener per signal in `policy`.
	pub fn attach(surface: Arc<dyn InputSurface>, policy: &SessionPolicy, on_activity: impl Fn() + Send + Sync + 'static) -> Self {
		let handler: SignalHandler = Arc::new(on_activity);
		let listeners = policy
			.signals()
			.iter()
			.map(|signal| surface.add_listener(SurfaceEvent::Activity(*signal), Arc::clone(&handler), true))
			.collect::<Vec<_>>();
		debug!(target = "idle.monitor", count = listeners.len(), "activity listeners attached");
		Self { surface, listeners }
	}

	/// Removes every listener. Safe to call more than once.
	pub fn detach(&mut self) {
		if self.listeners.is_empty() {
			return;
		}
		for id in self.listeners.drain(..) {
			self.surface.remove_listener(id);
		}
		debug!(target = "idle.monitor", "activity listeners detached");
	}

	pub fn is_attached(&self) -> bool {
		!self.listeners.is_empty()
	}
}

impl Drop for ActivityMonitor {
	fn drop(&mut self) {
		self.detach();
	}
}
