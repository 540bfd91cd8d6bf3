//! Page-unload credential guard.
//!
//! The guard covers only the local half of logout: the credential is erased
//! synchronously before the page goes away. Remote revocation during unload is
//! best effort and left to the session owner.

use std::sync::Arc;

use idle_protocol::SurfaceEvent;
use tracing::{debug, info, warn};

use crate::collaborators::{CredentialStore, InputSurface, ListenerId};

/// Erases the stored credential when the page is about to unload.
pub struct UnloadGuard {
	surface: Arc<dyn InputSurface>,
	listener: Option<ListenerId>,
}

impl UnloadGuard {
	/// Registers the pre-unload handler. `after_erase` runs once the credential is gone.
	pub fn attach(surface: Arc<dyn InputSurface>, credentials: Arc<dyn CredentialStore>, after_erase: impl Fn() + Send + Sync + 'static) -> Self {
		let listener = surface.add_listener(
			SurfaceEvent::BeforeUnload,
			Arc::new(move || {
				match credentials.remove() {
					Ok(()) => info!(target = "idle.unload", "credential erased on unload"),
					Err(err) => warn!(target = "idle.unload", error = %err, "failed to erase credential on unload"),
				}
				after_erase();
			}),
			false,
		);
		debug!(target = "idle.unload", "unload guard attached");
		Self {
			surface,
			listener: Some(listener),
		}
	}

	pub fn detach(&mut self) {
		if let Some(id) = self.listener.take() {
			self.surface.remove_listener(id);
			debug!(target = "idle.unload", "unload guard detached");
		}
	}

	pub fn is_attached(&self) -> bool {
		self.listener.is_some()
	}
}

impl Drop for UnloadGuard {
	fn drop(&mut self) {
		self.detach();
	}
}
