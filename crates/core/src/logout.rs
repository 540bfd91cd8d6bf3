//! Forced logout.
//!
//! The executor runs three steps in a fixed order: revoke the identity
//! session, erase the local credential, navigate to the login page. A failed
//! revocation never prevents erasure or navigation.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use crate::collaborators::{CredentialStore, IdentitySession, Navigator};

/// How long sign-out may take before logout carries on without it.
pub const REVOCATION_TIMEOUT: Duration = Duration::from_secs(10);

/// What a logout run managed to do. Navigation always happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutReport {
	pub revoked: bool,
	pub credential_erased: bool,
}

/// Revokes, erases and redirects.
#[derive(Clone)]
pub struct LogoutExecutor {
	identity: Arc<dyn IdentitySession>,
	credentials: Arc<dyn CredentialStore>,
	navigator: Arc<dyn Navigator>,
	login_path: String,
	revocation_timeout: Duration,
}

impl LogoutExecutor {
	pub fn new(identity: Arc<dyn IdentitySession>, credentials: Arc<dyn CredentialStore>, navigator: Arc<dyn Navigator>, login_path: impl Into<String>) -> Self {
		Self {
			identity,
			credentials,
			navigator,
			login_path: login_path.into(),
			revocation_timeout: REVOCATION_TIMEOUT,
		}
	}

	pub fn with_revocation_timeout(mut self, timeout: Duration) -> Self {
		self.revocation_timeout = timeout;
		self
	}

	/// Runs the full logout sequence.
	pub async fn execute(&self) -> LogoutReport {
		let revoked = self.revoke().await;
		let credential_erased = self.erase_credential();
		self.navigator.navigate_to(&self.login_path);
		info!(
			target = "idle.logout",
			revoked,
			credential_erased,
			path = %self.login_path,
			"session terminated"
		);
		LogoutReport { revoked, credential_erased }
	}

	/// Signs out of the identity provider, returning whether it succeeded.
	///
	/// Sign-out runs on its own task so a panicking provider is contained
	/// the same way as a rejected one. A sign-out still pending after the
	/// revocation timeout is abandoned.
	pub async fn revoke(&self) -> bool {
		let identity = Arc::clone(&self.identity);
		let mut task = tokio::spawn(async move { identity.sign_out().await });
		match tokio::time::timeout(self.revocation_timeout, &mut task).await {
			Ok(Ok(Ok(()))) => true,
			Ok(Ok(Err(err))) => {
				warn!(target = "idle.logout", error = %err, "identity revocation failed; continuing logout");
				false
			}
			Ok(Err(err)) => {
				warn!(target = "idle.logout", error = %err, "identity revocation task failed; continuing logout");
				false
			}
			Err(_) => {
				task.abort();
				warn!(
					target = "idle.logout",
					timeout_ms = self.revocation_timeout.as_millis() as u64,
					"identity revocation timed out; continuing logout"
				);
				false
			}
		}
	}

	/// Removes the stored credential. Absent credentials count as erased.
	pub fn erase_credential(&self) -> bool {
		match self.credentials.remove() {
			Ok(()) => true,
			Err(err) => {
				warn!(target = "idle.logout", error = %err, "failed to erase credential");
				false
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use async_trait::async_trait;

	use super::*;
	use crate::collaborators::{SessionChangeCallback, Subscription};
	use crate::error::Result;
	use crate::memory::{MemoryCredentialStore, RecordingNavigator, StaticIdentity};

	struct Fixture {
		identity: Arc<StaticIdentity>,
		store: Arc<MemoryCredentialStore>,
		navigator: Arc<RecordingNavigator>,
		executor: LogoutExecutor,
	}

	fn fixture() -> Fixture {
		let identity = Arc::new(StaticIdentity::signed_in("admin", "tok"));
		let store = Arc::new(MemoryCredentialStore::with_token("tok"));
		let navigator = Arc::new(RecordingNavigator::new());
		let executor = LogoutExecutor::new(identity.clone(), store.clone(), navigator.clone(), "/login");
		Fixture {
			identity,
			store,
			navigator,
			executor,
		}
	}

	#[tokio::test]
	async fn logout_revokes_erases_and_redirects() {
		let fx = fixture();
		let report = fx.executor.execute().await;
		assert_eq!(
			report,
			LogoutReport {
				revoked: true,
				credential_erased: true
			}
		);
		assert!(fx.identity.current_user().is_none());
		assert!(!fx.store.is_present());
		assert_eq!(fx.navigator.visits(), vec!["/login".to_string()]);
	}

	#[tokio::test]
	async fn rejected_revocation_still_erases_and_redirects() {
		let fx = fixture();
		fx.identity.reject_sign_out(true);

		let report = fx.executor.execute().await;
		assert!(!report.revoked);
		assert!(report.credential_erased);
		assert_eq!(fx.identity.sign_out_calls(), 1);
		assert!(!fx.store.is_present());
		assert_eq!(fx.navigator.count(), 1);
	}

	#[tokio::test]
	async fn erase_failure_still_redirects() {
		let fx = fixture();
		fx.store.fail_removal(true);
		let report = fx.executor.execute().await;
		assert!(!report.credential_erased);
		assert_eq!(fx.navigator.count(), 1);
	}

	#[tokio::test]
	async fn already_absent_credential_is_not_an_error() {
		let fx = fixture();
		fx.store.remove().unwrap();
		assert!(fx.executor.execute().await.credential_erased);
	}

	struct PanickingIdentity;

	#[async_trait]
	impl IdentitySession for PanickingIdentity {
		async fn sign_out(&self) -> Result<()> {
			panic!("provider exploded");
		}

		fn on_session_change(&self, _callback: SessionChangeCallback) -> Subscription {
			Subscription::noop()
		}
	}

	struct UnresponsiveIdentity;

	#[async_trait]
	impl IdentitySession for UnresponsiveIdentity {
		async fn sign_out(&self) -> Result<()> {
			std::future::pending().await
		}

		fn on_session_change(&self, _callback: SessionChangeCallback) -> Subscription {
			Subscription::noop()
		}
	}

	#[tokio::test(start_paused = true)]
	async fn unresponsive_revocation_times_out_then_erases_and_redirects() {
		let store = Arc::new(MemoryCredentialStore::with_token("tok"));
		let navigator = Arc::new(RecordingNavigator::new());
		let executor = LogoutExecutor::new(Arc::new(UnresponsiveIdentity), store.clone(), navigator.clone(), "/login")
			.with_revocation_timeout(Duration::from_secs(3));

		let started = tokio::time::Instant::now();
		let report = executor.execute().await;
		assert_eq!(started.elapsed(), Duration::from_secs(3));
		assert!(!report.revoked);
		assert!(report.credential_erased);
		assert!(!store.is_present());
		assert_eq!(navigator.visits(), vec!["/login".to_string()]);
	}

	#[tokio::test(start_paused = true)]
	async fn default_revocation_timeout_bounds_logout() {
		let store = Arc::new(MemoryCredentialStore::with_token("tok"));
		let navigator = Arc::new(RecordingNavigator::new());
		let executor = LogoutExecutor::new(Arc::new(UnresponsiveIdentity), store.clone(), navigator.clone(), "/login");

		let started = tokio::time::Instant::now();
		executor.execute().await;
		assert_eq!(started.elapsed(), REVOCATION_TIMEOUT);
		assert_eq!(navigator.count(), 1);
	}

	#[tokio::test]
	async fn panicking_revocation_is_contained() {
		let store = Arc::new(MemoryCredentialStore::with_token("tok"));
		let navigator = Arc::new(RecordingNavigator::new());
		let executor = LogoutExecutor::new(Arc::new(PanickingIdentity), store.clone(), navigator.clone(), "/login");

		let report = executor.execute().await;
		assert!(!report.revoked);
		assert!(!store.is_present());
		assert_eq!(navigator.count(), 1);
	}
}
