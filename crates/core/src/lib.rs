//! Idle-session timeout and forced logout for the admin console.
//!
//! The subsystem tracks operator activity on an authenticated view and drives
//! two deadlines per session: a warning offered `warning_lead` before expiry,
//! and the expiry itself, which revokes the identity session, erases the
//! stored bearer token and navigates to the login page.
//!
//! # Components
//!
//! - [`SessionPolicy`] - timeout, warning lead, activity signals, unload flag
//! - [`ActivityMonitor`] - listens for interaction signals on the input surface
//! - [`TimeoutScheduler`] - owns the live warning/expiry pair
//! - [`WarningNotifier`] - asks the operator to extend or accept logout
//! - [`LogoutExecutor`] - best-effort revocation, then erase, then redirect
//! - [`UnloadGuard`] - erases the credential when the page is torn down
//! - [`IdleSession`] - wires the above onto one authenticated view
//!
//! External systems are reached only through the traits in [`collaborators`].
//!
//! # Example
//!
//! ```ignore
//! let session = IdleSession::attach(SessionPolicy::resolve(&PolicyOverrides::from_env()), collaborators)?;
//! let remaining = session.time_until_expiry();
//! ```

pub mod collaborators;
pub mod error;
pub mod logout;
pub mod memory;
pub mod monitor;
pub mod notifier;
pub mod policy;
pub mod scheduler;
pub mod session;
pub mod state;
pub mod unload;

/// Unauthenticated entry point the operator is sent to after logout.
pub const DEFAULT_LOGIN_PATH: &str = "/login";

pub use collaborators::{
	CredentialStore, IdentitySession, InputSurface, ListenerId, Navigator, SessionChangeCallback, SessionUser, SignalHandler, Subscription, WarningPrompt,
};
pub use error::{Error, Result};
pub use idle_protocol::{ActivitySignal, CredentialAttributes, Environment, SameSite, SessionState, SessionStatus, SurfaceEvent};
pub use logout::{LogoutExecutor, LogoutReport, REVOCATION_TIMEOUT};
pub use monitor::ActivityMonitor;
pub use notifier::{WarningNotifier, WarningOutcome};
pub use policy::{PolicyOverrides, SessionPolicy};
pub use scheduler::{TimeoutScheduler, WeakScheduler};
pub use session::{Collaborators, IdleSession, persist_identity_token};
pub use unload::UnloadGuard;
