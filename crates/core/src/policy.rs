//! Session policy resolution.
//!
//! A policy is resolved once per session from built-in defaults layered with
//! optional overrides read from the environment. Resolution never fails: a
//! malformed override is logged and replaced by its default so a bad deploy
//! setting cannot lock operators out of the console.

use std::collections::BTreeSet;
use std::time::Duration;

use idle_protocol::ActivitySignal;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Idle timeout applied when no valid override is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30 * 60);
/// Warning lead time applied when no valid override is configured.
pub const DEFAULT_WARNING_LEAD: Duration = Duration::from_secs(5 * 60);

/// Shortest duration a timeout or warning lead may take.
pub const MIN_DURATION: Duration = Duration::from_millis(1);
/// Longest duration a timeout may take; deadlines must stay representable as instants.
pub const MAX_TIMEOUT: Duration = Duration::from_secs(366 * 24 * 60 * 60);

pub const TIMEOUT_MINUTES_ENV: &str = "IDLE_TIMEOUT_MINUTES";
pub const WARNING_MINUTES_ENV: &str = "IDLE_WARNING_MINUTES";
pub const UNLOAD_LOGOUT_ENV: &str = "IDLE_UNLOAD_LOGOUT";

/// Raw, unvalidated override values as they arrive from configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyOverrides {
	pub timeout_minutes: Option<String>,
	pub warning_minutes: Option<String>,
	pub unload_termination: Option<String>,
}

impl PolicyOverrides {
	/// Reads overrides from the process environment.
	pub fn from_env() -> Self {
		Self {
			timeout_minutes: std::env::var(TIMEOUT_MINUTES_ENV).ok(),
			warning_minutes: std::env::var(WARNING_MINUTES_ENV).ok(),
			unload_termination: std::env::var(UNLOAD_LOGOUT_ENV).ok(),
		}
	}

	/// Layers `other` on top of `self`; values present in `other` win.
	pub fn merge(self, other: PolicyOverrides) -> Self {
		Self {
			timeout_minutes: other.timeout_minutes.or(self.timeout_minutes),
			warning_minutes: other.warning_minutes.or(self.warning_minutes),
			unload_termination: other.unload_termination.or(self.unload_termination),
		}
	}
}

/// Immutable per-session timing and signal configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPolicy {
	timeout: Duration,
	warning_lead: Duration,
	signals: BTreeSet<ActivitySignal>,
	unload_termination: bool,
}

impl SessionPolicy {
	/// Builds a policy with the default signal set and unload termination enabled.
	///
	/// # Errors
	///
	/// Returns [`Error::InvalidPolicy`] unless `0 < warning_lead < timeout <= MAX_TIMEOUT`.
	pub fn new(timeout: Duration, warning_lead: Duration) -> Result<Self> {
		if warning_lead.is_zero() {
			return Err(Error::InvalidPolicy("warning lead time must be positive".into()));
		}
		if timeout > MAX_TIMEOUT {
			return Err(Error::InvalidPolicy(format!(
				"timeout ({}s) exceeds the maximum of {}s",
				timeout.as_secs_f64(),
				MAX_TIMEOUT.as_secs()
			)));
		}
		if warning_lead >= timeout {
			return Err(Error::InvalidPolicy(format!(
				"warning lead time ({}s) must be shorter than the timeout ({}s)",
				warning_lead.as_secs_f64(),
				timeout.as_secs_f64()
			)));
		}
		Ok(Self {
			timeout,
			warning_lead,
			signals: ActivitySignal::DEFAULTS.into_iter().collect(),
			unload_termination: true,
		})
	}

	/// Resolves a policy from defaults and `overrides`, falling back per field.
	pub fn resolve(overrides: &PolicyOverrides) -> Self {
		let timeout = resolve_minutes("timeout", overrides.timeout_minutes.as_deref(), DEFAULT_TIMEOUT);
		let mut warning_lead = resolve_minutes("warning", overrides.warning_minutes.as_deref(), DEFAULT_WARNING_LEAD);

		if warning_lead >= timeout {
			let fallback = if DEFAULT_WARNING_LEAD < timeout { DEFAULT_WARNING_LEAD } else { timeout / 2 };
			warn!(
				target = "idle.policy",
				timeout_secs = timeout.as_secs_f64(),
				warning_secs = warning_lead.as_secs_f64(),
				fallback_secs = fallback.as_secs_f64(),
				"warning lead time not shorter than timeout; using fallback"
			);
			warning_lead = fallback;
		}

		let unload_termination = match overrides.unload_termination.as_deref() {
			None => true,
			Some(raw) => parse_flag(raw).unwrap_or_else(|| {
				warn!(target = "idle.policy", value = raw, "ignoring malformed unload override");
				true
			}),
		};

		let policy = Self {
			timeout,
			warning_lead,
			signals: ActivitySignal::DEFAULTS.into_iter().collect(),
			unload_termination,
		};
		debug!(
			target = "idle.policy",
			timeout_secs = policy.timeout.as_secs_f64(),
			warning_secs = policy.warning_lead.as_secs_f64(),
			unload = policy.unload_termination,
			"resolved session policy"
		);
		policy
	}

	/// Restricts the activity signals that count as operator presence.
	pub fn with_signals(mut self, signals: impl IntoIterator<Item = ActivitySignal>) -> Self {
		self.signals = signals.into_iter().collect();
		self
	}

	pub fn with_unload_termination(mut self, enabled: bool) -> Self {
		self.unload_termination = enabled;
		self
	}

	pub fn timeout(&self) -> Duration {
		self.timeout
	}

	pub fn warning_lead(&self) -> Duration {
		self.warning_lead
	}

	/// Delay from last activity until the warning fires.
	pub fn warning_delay(&self) -> Duration {
		self.timeout - self.warning_lead
	}

	pub fn signals(&self) -> &BTreeSet<ActivitySignal> {
		&self.signals
	}

	pub fn unload_termination_enabled(&self) -> bool {
		self.unload_termination
	}
}

impl Default for SessionPolicy {
	fn default() -> Self {
		Self::resolve(&PolicyOverrides::default())
	}
}

fn resolve_minutes(field: &'static str, raw: Option<&str>, default: Duration) -> Duration {
	let Some(raw) = raw else {
		return default;
	};
	match parse_minutes(raw) {
		Some(value) => value,
		None => {
			warn!(
				target = "idle.policy",
				field,
				value = raw,
				default_secs = default.as_secs_f64(),
				"ignoring malformed minutes override"
			);
			default
		}
	}
}

/// Parses a finite number of minutes within `MIN_DURATION..=MAX_TIMEOUT`.
pub fn parse_minutes(raw: &str) -> Option<Duration> {
	let minutes: f64 = raw.trim().parse().ok()?;
	if !minutes.is_finite() || minutes <= 0.0 {
		return None;
	}
	Duration::try_from_secs_f64(minutes * 60.0)
		.ok()
		.filter(|d| (MIN_DURATION..=MAX_TIMEOUT).contains(d))
}

fn parse_flag(raw: &str) -> Option<bool> {
	match raw.trim().to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Some(true),
		"0" | "false" | "no" | "off" => Some(false),
		_ => None,
	}
}
