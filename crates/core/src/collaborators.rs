//! Interfaces to the systems around the idle-session core.
//!
//! The core never talks to the identity provider, the cookie jar, the router
//! or the DOM directly. Each is injected behind one of these traits so the
//! state machine can run against in-memory doubles (see [`crate::memory`]).

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use idle_protocol::{CredentialAttributes, SurfaceEvent};

use crate::error::Result;

/// Signed-in principal as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
	pub uid: String,
	/// Bearer token minted for privileged requests.
	pub id_token: String,
}

/// Callback invoked with the current user, or `None` after sign-out.
pub type SessionChangeCallback = Box<dyn Fn(Option<&SessionUser>) + Send + Sync>;

/// Remote authentication provider.
#[async_trait]
pub trait IdentitySession: Send + Sync {
	/// Revokes the provider-side session.
	async fn sign_out(&self) -> Result<()>;

	/// Observes sign-in and sign-out transitions until the subscription is dropped.
	fn on_session_change(&self, callback: SessionChangeCallback) -> Subscription;
}

/// Persisted client-side slot holding the bearer token.
///
/// Writes are last-writer-wins. Removing an absent credential succeeds.
pub trait CredentialStore: Send + Sync {
	fn set(&self, token: &str, attributes: &CredentialAttributes) -> Result<()>;

	fn get(&self) -> Result<Option<String>>;

	fn remove(&self) -> Result<()>;
}

/// Client-side router.
pub trait Navigator: Send + Sync {
	fn navigate_to(&self, path: &str);
}

/// Identifier returned by [`InputSurface::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// Listener callback registered on the input surface.
pub type SignalHandler = Arc<dyn Fn() + Send + Sync>;

/// Global event target that user interaction and page lifecycle events arrive on.
pub trait InputSurface: Send + Sync {
	fn add_listener(&self, event: SurfaceEvent, handler: SignalHandler, use_capture: bool) -> ListenerId;

	/// Removing an unknown id is a no-op.
	fn remove_listener(&self, id: ListenerId);
}

/// Extend-or-accept choice offered when the warning deadline passes.
#[async_trait]
pub trait WarningPrompt: Send + Sync {
	/// Resolves `true` to keep the session alive, `false` to log out now.
	///
	/// An `Err` means the prompt was dismissed and is treated as `false`.
	async fn ask_extend(&self, remaining: Duration) -> Result<bool>;
}

/// Handle for an identity-session observer. Unsubscribes on drop.
pub struct Subscription {
	cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
	pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
		Self {
			cancel: Some(Box::new(cancel)),
		}
	}

	/// A subscription with nothing to release.
	pub fn noop() -> Self {
		Self { cancel: None }
	}

	pub fn unsubscribe(mut self) {
		if let Some(cancel) = self.cancel.take() {
			cancel();
		}
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		if let Some(cancel) = self.cancel.take() {
			cancel();
		}
	}
}

impl fmt::Debug for Subscription {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Subscription").field("active", &self.cancel.is_some()).finish()
	}
}
