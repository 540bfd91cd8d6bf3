//! Idle session attached to one authenticated view.

use std::sync::Arc;
use std::time::Duration;

use idle_protocol::{CredentialAttributes, SessionState, SessionStatus};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::DEFAULT_LOGIN_PATH;
use crate::collaborators::{CredentialStore, IdentitySession, InputSurface, Navigator, SessionUser, Subscription, WarningPrompt};
use crate::error::Result;
use crate::logout::{LogoutExecutor, LogoutReport};
use crate::monitor::ActivityMonitor;
use crate::notifier::WarningNotifier;
use crate::policy::SessionPolicy;
use crate::scheduler::TimeoutScheduler;
use crate::unload::UnloadGuard;

/// External systems an idle session depends on.
#[derive(Clone)]
pub struct Collaborators {
	pub identity: Arc<dyn IdentitySession>,
	pub credentials: Arc<dyn CredentialStore>,
	pub navigator: Arc<dyn Navigator>,
	pub surface: Arc<dyn InputSurface>,
	pub prompt: Arc<dyn WarningPrompt>,
	/// Where logout redirects to.
	pub login_path: String,
}

impl Collaborators {
	/// Bundles collaborators with the default login path.
	pub fn new(
		identity: Arc<dyn IdentitySession>,
		credentials: Arc<dyn CredentialStore>,
		navigator: Arc<dyn Navigator>,
		surface: Arc<dyn InputSurface>,
		prompt: Arc<dyn WarningPrompt>,
	) -> Self {
		Self {
			identity,
			credentials,
			navigator,
			surface,
			prompt,
			login_path: DEFAULT_LOGIN_PATH.to_string(),
		}
	}

	pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
		self.login_path = path.into();
		self
	}
}

#[derive(Default)]
struct Attachments {
	monitor: Option<ActivityMonitor>,
	unload: Option<UnloadGuard>,
}

impl Attachments {
	fn release(&mut self) {
		drop(self.monitor.take());
		drop(self.unload.take());
	}
}

/// Activity monitor, unload guard and scheduler wired onto one view.
///
/// Listeners and timers live until the session terminates, [`detach`](Self::detach)
/// is called, or the value is dropped. Dropping does not log the operator out.
pub struct IdleSession {
	scheduler: TimeoutScheduler,
	attachments: Arc<Mutex<Attachments>>,
}

impl IdleSession {
	/// Attaches listeners and arms the first warning/expiry pair.
	///
	/// # Errors
	///
	/// Returns [`crate::Error::Runtime`] outside a Tokio runtime.
	pub fn attach(policy: SessionPolicy, collaborators: Collaborators) -> Result<Self> {
		let Collaborators {
			identity,
			credentials,
			navigator,
			surface,
			prompt,
			login_path,
		} = collaborators;

		let executor = LogoutExecutor::new(identity, Arc::clone(&credentials), navigator, login_path);
		let scheduler = TimeoutScheduler::new(policy.clone(), WarningNotifier::new(prompt), executor)?;

		let weak = scheduler.downgrade();
		let monitor = ActivityMonitor::attach(Arc::clone(&surface), &policy, move || {
			let Some(scheduler) = weak.upgrade() else {
				return;
			};
			if let Err(err) = scheduler.reset() {
				debug!(target = "idle.monitor", error = %err, "activity after session end ignored");
			}
		});

		let unload = policy.unload_termination_enabled().then(|| {
			let weak = scheduler.downgrade();
			UnloadGuard::attach(Arc::clone(&surface), credentials, move || {
				if let Some(scheduler) = weak.upgrade() {
					scheduler.terminate_on_unload();
				}
			})
		});

		let attachments = Arc::new(Mutex::new(Attachments {
			monitor: Some(monitor),
			unload,
		}));
		let released = Arc::clone(&attachments);
		scheduler.on_teardown(move || released.lock().release());
		scheduler.reset()?;

		info!(
			target = "idle.session",
			timeout_secs = policy.timeout().as_secs_f64(),
			warning_secs = policy.warning_lead().as_secs_f64(),
			unload = policy.unload_termination_enabled(),
			"idle session attached"
		);
		Ok(Self { scheduler, attachments })
	}

	/// Records activity now. See [`TimeoutScheduler::reset`].
	pub fn reset(&self) -> Result<()> {
		self.scheduler.reset()
	}

	pub fn time_until_warning(&self) -> Duration {
		self.scheduler.time_until_warning()
	}

	pub fn time_until_expiry(&self) -> Duration {
		self.scheduler.time_until_expiry()
	}

	pub fn state(&self) -> SessionState {
		self.scheduler.state()
	}

	pub fn status(&self) -> SessionStatus {
		self.scheduler.status()
	}

	pub fn policy(&self) -> &SessionPolicy {
		self.scheduler.policy()
	}

	/// Logs out now, as from a sign-out button.
	pub async fn logout(&self) -> Option<LogoutReport> {
		self.scheduler.logout().await
	}

	/// Whether activity listeners are still registered.
	pub fn is_monitoring(&self) -> bool {
		self.attachments.lock().monitor.as_ref().is_some_and(ActivityMonitor::is_attached)
	}

	/// Tears down listeners and timers without logging out.
	pub fn detach(&self) {
		self.scheduler.detach();
	}
}

impl Drop for IdleSession {
	fn drop(&mut self) {
		self.scheduler.detach();
	}
}

/// Keeps the credential store in step with the identity provider.
///
/// Each sign-in writes the freshly minted token; sign-out removes it.
pub fn persist_identity_token(identity: &dyn IdentitySession, credentials: Arc<dyn CredentialStore>, attributes: CredentialAttributes) -> Subscription {
	identity.on_session_change(Box::new(move |user: Option<&SessionUser>| {
		let result = match user {
			Some(user) => credentials.set(&user.id_token, &attributes),
			None => credentials.remove(),
		};
		if let Err(err) = result {
			warn!(target = "idle.session", error = %err, "failed to sync credential with identity session");
		}
	}))
}
