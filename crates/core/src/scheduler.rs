//! Timeout scheduler.
//!
//! Owns the single live pair of deferred actions for a session:
//!
//! ```text
//!            activity / reset()                 warning deadline
//!   Active ─────────────────────▶ Active ────────────────────────▶ Warning
//!     ▲                                                              │
//!     └──────────── extend / activity ◀──────────────────────────────┤
//!                                                                    │ expiry deadline,
//!                                                                    │ declined warning,
//!                                                                    ▼ unload, logout()
//!                                                                 Expired
//! ```
//!
//! Both deadlines are measured from the last activity, not from each other,
//! so a slow or stuck warning prompt cannot delay expiry.
//!
//! # Invariants
//!
//! - Every reschedule aborts the previous pair and bumps `generation` inside
//!   one critical section; a task re-checks its generation under the same lock
//!   before acting, so a superseded task never fires even if it raced past
//!   the abort.
//! - A firing task detaches its own handle before running side effects, so
//!   the teardown it triggers can never abort itself.
//! - Termination is latched. Whichever trigger wins runs logout; the rest are
//!   no-ops.

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use idle_protocol::{SessionState, SessionStatus};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, trace};

use crate::error::{Error, Result};
use crate::logout::{LogoutExecutor, LogoutReport};
use crate::notifier::{WarningNotifier, WarningOutcome};
use crate::policy::SessionPolicy;
use crate::state::derive_state;

type Teardown = Box<dyn FnOnce() + Send>;

#[derive(Debug, Clone, Copy)]
enum TerminationCause {
	Expired,
	WarningDeclined,
	Unload,
	Manual,
}

impl fmt::Display for TerminationCause {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			TerminationCause::Expired => "expired",
			TerminationCause::WarningDeclined => "warning declined",
			TerminationCause::Unload => "unload",
			TerminationCause::Manual => "manual",
		})
	}
}

struct Timers {
	generation: u64,
	last_activity: Instant,
	warning: Option<JoinHandle<()>>,
	expiry: Option<JoinHandle<()>>,
	terminated: bool,
	detached: bool,
}

impl Timers {
	fn is_live(&self) -> bool {
		!self.terminated && !self.detached
	}

	fn ensure_live(&self) -> Result<()> {
		if self.terminated {
			Err(Error::Terminated)
		} else if self.detached {
			Err(Error::Detached)
		} else {
			Ok(())
		}
	}

	fn cancel(&mut self) {
		if let Some(handle) = self.warning.take() {
			handle.abort();
		}
		if let Some(handle) = self.expiry.take() {
			handle.abort();
		}
	}

	fn remaining(&self, offset: Duration) -> Duration {
		if !self.is_live() {
			return Duration::ZERO;
		}
		(self.last_activity + offset).saturating_duration_since(Instant::now())
	}

	fn state(&self, policy: &SessionPolicy) -> SessionState {
		derive_state(Instant::now(), self.last_activity, policy, !self.is_live())
	}

	/// Latches termination. Returns `false` if another trigger already won.
	fn begin_termination(&mut self) -> bool {
		if !self.is_live() {
			return false;
		}
		self.terminated = true;
		self.cancel();
		true
	}
}

struct Inner {
	policy: SessionPolicy,
	notifier: WarningNotifier,
	executor: LogoutExecutor,
	runtime: Handle,
	timers: Mutex<Timers>,
	teardown: Mutex<Option<Teardown>>,
}

impl Inner {
	fn rearm(self: &Arc<Self>, timers: &mut Timers) {
		timers.cancel();
		timers.generation += 1;
		timers.last_activity = Instant::now();

		let generation = timers.generation;
		let warning_at = timers.last_activity + self.policy.warning_delay();
		let expiry_at = timers.last_activity + self.policy.timeout();

		let inner = Arc::clone(self);
		timers.warning = Some(self.runtime.spawn(async move {
			sleep_until(warning_at).await;
			inner.on_warning_fire(generation).await;
		}));

		let inner = Arc::clone(self);
		timers.expiry = Some(self.runtime.spawn(async move {
			sleep_until(expiry_at).await;
			inner.on_expiry_fire(generation).await;
		}));

		trace!(target = "idle.scheduler", generation, "timers rearmed");
	}

	async fn on_warning_fire(self: Arc<Self>, generation: u64) {
		let remaining = {
			let timers = self.timers.lock();
			if timers.generation != generation || !timers.is_live() {
				trace!(target = "idle.scheduler", generation, "stale warning ignored");
				return;
			}
			(timers.last_activity + self.policy.timeout()).saturating_duration_since(Instant::now())
		};

		debug!(target = "idle.scheduler", generation, "warning deadline reached");
		// The handle stays in its slot while the prompt is open so activity can dismiss it.
		let outcome = self.notifier.notify(remaining).await;

		let terminate = {
			let mut timers = self.timers.lock();
			if timers.generation != generation || !timers.is_live() {
				debug!(target = "idle.scheduler", generation, "warning answer superseded");
				return;
			}
			drop(timers.warning.take());
			match outcome {
				WarningOutcome::Extend => {
					self.rearm(&mut timers);
					false
				}
				WarningOutcome::Terminate => timers.begin_termination(),
			}
		};

		if terminate {
			self.finish(TerminationCause::WarningDeclined).await;
		}
	}

	async fn on_expiry_fire(self: Arc<Self>, generation: u64) {
		{
			let mut timers = self.timers.lock();
			if timers.generation != generation || !timers.is_live() {
				trace!(target = "idle.scheduler", generation, "stale expiry ignored");
				return;
			}
			drop(timers.expiry.take());
			timers.begin_termination();
		}
		self.finish(TerminationCause::Expired).await;
	}

	async fn finish(&self, cause: TerminationCause) -> LogoutReport {
		info!(target = "idle.scheduler", %cause, "terminating session");
		self.run_teardown();
		self.executor.execute().await
	}

	fn run_teardown(&self) {
		let hook = self.teardown.lock().take();
		if let Some(hook) = hook {
			hook();
		}
	}
}

/// Schedules the warning and expiry transitions for one session.
///
/// Cloning yields another handle to the same scheduler. Scheduling requires a
/// Tokio runtime; the handle of the runtime current at construction is used
/// for every deferred action, so `reset` may be called from any thread.
#[derive(Clone)]
pub struct TimeoutScheduler {
	inner: Arc<Inner>,
}

/// Non-owning scheduler handle for listeners that must not keep it alive.
#[derive(Clone)]
pub struct WeakScheduler(Weak<Inner>);

impl WeakScheduler {
	pub fn upgrade(&self) -> Option<TimeoutScheduler> {
		self.0.upgrade().map(|inner| TimeoutScheduler { inner })
	}
}

impl TimeoutScheduler {
	/// Creates an unarmed scheduler. Call [`reset`](Self::reset) to arm it.
	///
	/// # Errors
	///
	/// Returns [`Error::Runtime`] outside a Tokio runtime.
	pub fn new(policy: SessionPolicy, notifier: WarningNotifier, executor: LogoutExecutor) -> Result<Self> {
		let runtime = Handle::try_current().map_err(|e| Error::Runtime(e.to_string()))?;
		Ok(Self {
			inner: Arc::new(Inner {
				policy,
				notifier,
				executor,
				runtime,
				timers: Mutex::new(Timers {
					generation: 0,
					last_activity: Instant::now(),
					warning: None,
					expiry: None,
					terminated: false,
					detached: false,
				}),
				teardown: Mutex::new(None),
			}),
		})
	}

	pub fn downgrade(&self) -> WeakScheduler {
		WeakScheduler(Arc::downgrade(&self.inner))
	}

	pub fn policy(&self) -> &SessionPolicy {
		&self.inner.policy
	}

	/// Registers the hook run once when the session terminates or detaches.
	pub fn on_teardown(&self, hook: impl FnOnce() + Send + 'static) {
		*self.inner.teardown.lock() = Some(Box::new(hook));
	}

	/// Records activity now and replaces the live warning/expiry pair.
	///
	/// Idempotent: any number of calls leaves exactly one pair, timed from
	/// the most recent call.
	///
	/// # Errors
	///
	/// Returns [`Error::Terminated`] or [`Error::Detached`] once the session
	/// has ended; an ended session is never revived.
	pub fn reset(&self) -> Result<()> {
		let mut timers = self.inner.timers.lock();
		timers.ensure_live()?;
		self.inner.rearm(&mut timers);
		Ok(())
	}

	/// Time left before the warning fires, clamped at zero.
	pub fn time_until_warning(&self) -> Duration {
		self.inner.timers.lock().remaining(self.inner.policy.warning_delay())
	}

	/// Time left before expiry, clamped at zero.
	pub fn time_until_expiry(&self) -> Duration {
		self.inner.timers.lock().remaining(self.inner.policy.timeout())
	}

	/// Current phase. A detached session no longer guards anything and
	/// reports [`SessionState::Expired`], matching its zeroed countdowns.
	pub fn state(&self) -> SessionState {
		self.inner.timers.lock().state(&self.inner.policy)
	}

	pub fn is_terminated(&self) -> bool {
		self.inner.timers.lock().terminated
	}

	/// Snapshot of phase and countdowns taken under one lock.
	pub fn status(&self) -> SessionStatus {
		let timers = self.inner.timers.lock();
		let policy = &self.inner.policy;
		SessionStatus {
			state: timers.state(policy),
			time_until_warning_ms: timers.remaining(policy.warning_delay()).as_millis() as u64,
			time_until_expiry_ms: timers.remaining(policy.timeout()).as_millis() as u64,
			terminated: timers.terminated,
		}
	}

	/// Runs logout now. Returns `None` if the session already ended.
	pub async fn logout(&self) -> Option<LogoutReport> {
		let won = self.inner.timers.lock().begin_termination();
		if !won {
			return None;
		}
		Some(self.inner.finish(TerminationCause::Manual).await)
	}

	/// Ends the session after the unload guard erased the credential.
	///
	/// Timers are cancelled and teardown runs synchronously; revocation is
	/// spawned and not awaited since the page may be gone before it completes.
	pub fn terminate_on_unload(&self) {
		let won = self.inner.timers.lock().begin_termination();
		if !won {
			return;
		}
		info!(target = "idle.scheduler", cause = %TerminationCause::Unload, "terminating session");
		self.inner.run_teardown();
		let executor = self.inner.executor.clone();
		self.inner.runtime.spawn(async move {
			executor.revoke().await;
		});
	}

	/// Cancels both timers and runs teardown without logging out.
	pub fn detach(&self) {
		{
			let mut timers = self.inner.timers.lock();
			if timers.detached {
				return;
			}
			timers.detached = true;
			timers.generation += 1;
			timers.cancel();
		}
		debug!(target = "idle.scheduler", "scheduler detached");
		self.inner.run_teardown();
	}

	#[cfg(test)]
	pub(crate) fn live_timers(&self) -> (bool, bool) {
		let timers = self.inner.timers.lock();
		let live = |slot: &Option<JoinHandle<()>>| slot.as_ref().is_some_and(|h| !h.is_finished());
		(live(&timers.warning), live(&timers.expiry))
	}
}
