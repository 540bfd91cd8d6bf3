//! In-memory collaborators.
//!
//! Provides process-local implementations of every collaborator trait. They
//! back the test-suite and the terminal console, and double as a reference
//! for how each contract behaves at its edges (idempotent removal, rejected
//! sign-out, listener bookkeeping).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use idle_protocol::{CredentialAttributes, SurfaceEvent};
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::collaborators::{
	CredentialStore, IdentitySession, InputSurface, ListenerId, Navigator, SessionChangeCallback, SessionUser, SignalHandler, Subscription, WarningPrompt,
};
use crate::error::{Error, Result};

/// Credential slot held in process memory.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
	slot: Mutex<Option<(String, CredentialAttributes)>>,
	fail_removal: AtomicBool,
	removals: AtomicUsize,
}

impl MemoryCredentialStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Store pre-populated with `token` under default attributes.
	pub fn with_token(token: &str) -> Self {
		let store = Self::default();
		*store.slot.lock() = Some((token.to_string(), CredentialAttributes::default()));
		store
	}

	/// Makes subsequent [`CredentialStore::remove`] calls fail.
	pub fn fail_removal(&self, fail: bool) {
		self.fail_removal.store(fail, Ordering::SeqCst);
	}

	pub fn attributes(&self) -> Option<CredentialAttributes> {
		self.slot.lock().as_ref().map(|(_, attrs)| attrs.clone())
	}

	pub fn is_present(&self) -> bool {
		self.slot.lock().is_some()
	}

	/// Number of successful `remove` calls, including no-op removals.
	pub fn removals(&self) -> usize {
		self.removals.load(Ordering::SeqCst)
	}
}

impl CredentialStore for MemoryCredentialStore {
	fn set(&self, token: &str, attributes: &CredentialAttributes) -> Result<()> {
		*self.slot.lock() = Some((token.to_string(), attributes.clone()));
		Ok(())
	}

	fn get(&self) -> Result<Option<String>> {
		Ok(self.slot.lock().as_ref().map(|(token, _)| token.clone()))
	}

	fn remove(&self) -> Result<()> {
		if self.fail_removal.load(Ordering::SeqCst) {
			return Err(Error::Credential("credential slot is read-only".into()));
		}
		self.slot.lock().take();
		self.removals.fetch_add(1, Ordering::SeqCst);
		Ok(())
	}
}

struct Registration {
	id: ListenerId,
	event: SurfaceEvent,
	use_capture: bool,
	handler: SignalHandler,
}

/// Event target that dispatches synthetic events to registered listeners.
#[derive(Default)]
pub struct EventSurface {
	next_id: AtomicU64,
	listeners: Mutex<Vec<Registration>>,
}

impl EventSurface {
	pub fn new() -> Self {
		Self::default()
	}

	/// Invokes every listener registered for `event` and returns how many ran.
	///
	/// Capturing listeners run before bubbling ones. The listener table is not
	/// locked while handlers run, so handlers may add or remove listeners.
	pub fn dispatch(&self, event: SurfaceEvent) -> usize {
		let handlers: Vec<SignalHandler> = {
			let listeners = self.listeners.lock();
			let capture = listeners.iter().filter(|r| r.event == event && r.use_capture);
			let bubble = listeners.iter().filter(|r| r.event == event && !r.use_capture);
			capture.chain(bubble).map(|r| Arc::clone(&r.handler)).collect()
		};
		for handler in &handlers {
			handler();
		}
		handlers.len()
	}

	pub fn listener_count(&self) -> usize {
		self.listeners.lock().len()
	}

	pub fn listener_count_for(&self, event: SurfaceEvent) -> usize {
		self.listeners.lock().iter().filter(|r| r.event == event).count()
	}
}

impl InputSurface for EventSurface {
	fn add_listener(&self, event: SurfaceEvent, handler: SignalHandler, use_capture: bool) -> ListenerId {
		let id = ListenerId(self.next_id.fetch_add(1, Ordering::SeqCst));
		self.listeners.lock().push(Registration {
			id,
			event,
			use_capture,
			handler,
		});
		id
	}

	fn remove_listener(&self, id: ListenerId) {
		self.listeners.lock().retain(|r| r.id != id);
	}
}

/// Navigator that records every requested path.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
	visits: Mutex<Vec<String>>,
}

impl RecordingNavigator {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn visits(&self) -> Vec<String> {
		self.visits.lock().clone()
	}

	pub fn count(&self) -> usize {
		self.visits.lock().len()
	}
}

impl Navigator for RecordingNavigator {
	fn navigate_to(&self, path: &str) {
		self.visits.lock().push(path.to_string());
	}
}

type Observer = Arc<dyn Fn(Option<&SessionUser>) + Send + Sync>;

/// Identity provider with a fixed signed-in user.
#[derive(Default)]
pub struct StaticIdentity {
	user: Mutex<Option<SessionUser>>,
	reject_sign_out: AtomicBool,
	sign_out_calls: AtomicUsize,
	next_observer: AtomicU64,
	observers: Arc<Mutex<Vec<(u64, Observer)>>>,
}

impl StaticIdentity {
	pub fn signed_in(uid: &str, id_token: &str) -> Self {
		let identity = Self::default();
		*identity.user.lock() = Some(SessionUser {
			uid: uid.to_string(),
			id_token: id_token.to_string(),
		});
		identity
	}

	/// Makes `sign_out` reject, simulating a provider outage.
	pub fn reject_sign_out(&self, reject: bool) {
		self.reject_sign_out.store(reject, Ordering::SeqCst);
	}

	pub fn sign_out_calls(&self) -> usize {
		self.sign_out_calls.load(Ordering::SeqCst)
	}

	pub fn current_user(&self) -> Option<SessionUser> {
		self.user.lock().clone()
	}

	pub fn observer_count(&self) -> usize {
		self.observers.lock().len()
	}

	fn notify(&self) {
		let user = self.current_user();
		let observers: Vec<Observer> = self.observers.lock().iter().map(|(_, cb)| Arc::clone(cb)).collect();
		for observer in observers {
			observer(user.as_ref());
		}
	}
}

#[async_trait]
impl IdentitySession for StaticIdentity {
	async fn sign_out(&self) -> Result<()> {
		self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
		if self.reject_sign_out.load(Ordering::SeqCst) {
			return Err(Error::Revocation("identity provider unavailable".into()));
		}
		self.user.lock().take();
		self.notify();
		Ok(())
	}

	fn on_session_change(&self, callback: SessionChangeCallback) -> Subscription {
		let id = self.next_observer.fetch_add(1, Ordering::SeqCst);
		let observer: Observer = Arc::from(callback);
		self.observers.lock().push((id, Arc::clone(&observer)));
		observer(self.current_user().as_ref());

		let observers = Arc::clone(&self.observers);
		Subscription::new(move || observers.lock().retain(|(oid, _)| *oid != id))
	}
}

/// Answer a [`ScriptedPrompt`] gives to the next warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptAnswer {
	Extend,
	Decline,
	/// The prompt reports dismissal.
	Dismiss,
	/// The prompt never resolves, like an unattended dialog.
	Ignore,
}

/// Warning prompt that replays queued answers and records each ask.
pub struct ScriptedPrompt {
	script: Mutex<Vec<PromptAnswer>>,
	fallback: PromptAnswer,
	asked: Mutex<Vec<(Instant, Duration)>>,
}

impl ScriptedPrompt {
	/// Prompt that always gives `answer`.
	pub fn always(answer: PromptAnswer) -> Self {
		Self {
			script: Mutex::new(Vec::new()),
			fallback: answer,
			asked: Mutex::new(Vec::new()),
		}
	}

	/// Prompt that gives `answers` in order, then `fallback`.
	pub fn sequence(answers: impl IntoIterator<Item = PromptAnswer>, fallback: PromptAnswer) -> Self {
		let mut script: Vec<_> = answers.into_iter().collect();
		script.reverse();
		Self {
			script: Mutex::new(script),
			fallback,
			asked: Mutex::new(Vec::new()),
		}
	}

	/// Instants at which the prompt was shown.
	pub fn asked_at(&self) -> Vec<Instant> {
		self.asked.lock().iter().map(|(at, _)| *at).collect()
	}

	/// Remaining time reported with each ask.
	pub fn remaining_reported(&self) -> Vec<Duration> {
		self.asked.lock().iter().map(|(_, remaining)| *remaining).collect()
	}

	pub fn ask_count(&self) -> usize {
		self.asked.lock().len()
	}
}

#[async_trait]
impl WarningPrompt for ScriptedPrompt {
	async fn ask_extend(&self, remaining: Duration) -> Result<bool> {
		self.asked.lock().push((Instant::now(), remaining));
		let answer = self.script.lock().pop().unwrap_or(self.fallback);
		match answer {
			PromptAnswer::Extend => Ok(true),
			PromptAnswer::Decline => Ok(false),
			PromptAnswer::Dismiss => Err(Error::Prompt("dialog closed".into())),
			PromptAnswer::Ignore => std::future::pending().await,
		}
	}
}

#[cfg(test)]
mod tests {
	use idle_protocol::{ActivitySignal, Environment};

	use super::*;

	#[test]
	fn credential_removal_is_idempotent() {
		let store = MemoryCredentialStore::with_token("tok");
		store.remove().unwrap();
		store.remove().unwrap();
		assert!(!store.is_present());
		assert_eq!(store.removals(), 2);
	}

	#[test]
	fn credential_set_is_last_writer_wins() {
		let store = MemoryCredentialStore::new();
		store.set("first", &CredentialAttributes::default()).unwrap();
		store
			.set("second", &CredentialAttributes::for_environment(Environment::Production))
			.unwrap();
		assert_eq!(store.get().unwrap().as_deref(), Some("second"));
		assert!(store.attributes().unwrap().secure);
	}

	#[test]
	fn surface_dispatches_only_matching_listeners() {
		let surface = EventSurface::new();
		let hits = Arc::new(AtomicUsize::new(0));
		let counter = Arc::clone(&hits);
		let id = surface.add_listener(
			SurfaceEvent::Activity(ActivitySignal::Click),
			Arc::new(move || {
				counter.fetch_add(1, Ordering::SeqCst);
			}),
			true,
		);

		assert_eq!(surface.dispatch(SurfaceEvent::Activity(ActivitySignal::KeyDown)), 0);
		assert_eq!(surface.dispatch(SurfaceEvent::Activity(ActivitySignal::Click)), 1);
		surface.remove_listener(id);
		surface.remove_listener(id);
		assert_eq!(surface.dispatch(SurfaceEvent::Activity(ActivitySignal::Click)), 0);
		assert_eq!(hits.load(Ordering::SeqCst), 1);
	}

	#[test]
	fn surface_runs_capturing_listeners_first() {
		let surface = EventSurface::new();
		let order = Arc::new(Mutex::new(Vec::new()));
		for (label, capture) in [("bubble", false), ("capture", true)] {
			let order = Arc::clone(&order);
			surface.add_listener(SurfaceEvent::BeforeUnload, Arc::new(move || order.lock().push(label)), capture);
		}
		surface.dispatch(SurfaceEvent::BeforeUnload);
		assert_eq!(*order.lock(), vec!["capture", "bubble"]);
	}

	#[test]
	fn handler_may_remove_itself_during_dispatch() {
		let surface = Arc::new(EventSurface::new());
		let slot = Arc::new(Mutex::new(None));
		let (surface_ref, slot_ref) = (Arc::clone(&surface), Arc::clone(&slot));
		let id = surface.add_listener(
			SurfaceEvent::BeforeUnload,
			Arc::new(move || {
				if let Some(id) = slot_ref.lock().take() {
					surface_ref.remove_listener(id);
				}
			}),
			false,
		);
		*slot.lock() = Some(id);
		assert_eq!(surface.dispatch(SurfaceEvent::BeforeUnload), 1);
		assert_eq!(surface.listener_count(), 0);
	}

	#[tokio::test]
	async fn identity_notifies_observers_on_sign_out() {
		let identity = StaticIdentity::signed_in("admin", "tok");
		let seen = Arc::new(Mutex::new(Vec::new()));
		let sink = Arc::clone(&seen);
		let sub = identity.on_session_change(Box::new(move |user: Option<&SessionUser>| sink.lock().push(user.map(|u| u.uid.clone()))));

		identity.sign_out().await.unwrap();
		assert_eq!(*seen.lock(), vec![Some("admin".to_string()), None]);

		drop(sub);
		assert_eq!(identity.observer_count(), 0);
	}

	#[tokio::test]
	async fn rejected_sign_out_keeps_user() {
		let identity = StaticIdentity::signed_in("admin", "tok");
		identity.reject_sign_out(true);
		assert!(matches!(identity.sign_out().await, Err(Error::Revocation(_))));
		assert!(identity.current_user().is_some());
		assert_eq!(identity.sign_out_calls(), 1);
	}

	#[tokio::test]
	async fn scripted_prompt_replays_then_falls_back() {
		let prompt = ScriptedPrompt::sequence([PromptAnswer::Extend, PromptAnswer::Dismiss], PromptAnswer::Decline);
		assert!(prompt.ask_extend(Duration::from_secs(1)).await.unwrap());
		assert!(prompt.ask_extend(Duration::from_secs(1)).await.is_err());
		assert!(!prompt.ask_extend(Duration::from_secs(1)).await.unwrap());
		assert_eq!(prompt.ask_count(), 3);
	}
}
