//! Live idle session on the terminal.
//!
//! Stdin lines drive the session: `status` prints the current status,
//! `logout` signs out immediately, `quit` (or end of input) tears the view
//! down, and any other line is a key press. While the warning prompt is open
//! the next line answers it. The command ends once logout navigates away or
//! the view is torn down.

use std::io::BufRead;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use idle::memory::{EventSurface, StaticIdentity};
use idle::{ActivitySignal, Collaborators, IdleSession, SessionPolicy, SurfaceEvent, persist_identity_token};
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::print_json;
use crate::store::FileCredentialStore;
use crate::terminal::{ExitNavigator, TerminalPrompt};

const OPERATOR_UID: &str = "operator";
const UNLOAD_GRACE: Duration = Duration::from_millis(50);

#[derive(Debug, Clone)]
pub struct WatchOptions {
	pub token: Option<String>,
	pub fail_revocation: bool,
	pub login_path: String,
}

enum Line {
	Status,
	Logout,
	Quit,
	Activity,
}

impl Line {
	fn parse(raw: &str) -> Self {
		match raw.trim() {
			"status" => Self::Status,
			"logout" => Self::Logout,
			"quit" => Self::Quit,
			_ => Self::Activity,
		}
	}
}

pub async fn run(policy: SessionPolicy, store: FileCredentialStore, options: WatchOptions) -> Result<()> {
	let record = store.load().with_context(|| format!("failed to read {}", store.path().display()))?;
	let attributes = record.as_ref().map(|r| r.attributes.clone()).unwrap_or_default();
	let token = options
		.token
		.or_else(|| record.map(|r| r.token))
		.context("no credential stored; run `idle token set` or pass --token")?;

	let store = Arc::new(store);
	let identity = Arc::new(StaticIdentity::signed_in(OPERATOR_UID, &token));
	identity.reject_sign_out(options.fail_revocation);
	let _token_sync = persist_identity_token(identity.as_ref(), store.clone(), attributes);

	let surface = Arc::new(EventSurface::new());
	let prompt = Arc::new(TerminalPrompt::new());
	let (navigator, mut navigations) = ExitNavigator::channel();
	let collaborators = Collaborators::new(identity, store, Arc::new(navigator), surface.clone(), prompt.clone()).with_login_path(options.login_path);
	let session = IdleSession::attach(policy, collaborators)?;

	info!(target = "idle.watch", "watching terminal input");
	print_json(&json!({ "event": "attached", "status": session.status() }))?;

	let mut lines = spawn_line_reader();
	loop {
		tokio::select! {
			Some(path) = navigations.recv() => {
				print_json(&json!({ "event": "navigate", "path": path }))?;
				break;
			}
			line = lines.recv() => {
				let Some(line) = line else {
					debug!(target = "idle.watch", "input closed");
					unload(&session, &surface).await?;
					break;
				};
				let Some(line) = prompt.offer(line) else {
					continue;
				};
				match Line::parse(&line) {
					Line::Status => print_json(&json!({ "event": "status", "status": session.status() }))?,
					Line::Logout => {
						if let Some(report) = session.logout().await {
							print_json(&json!({ "event": "logout", "report": report }))?;
						}
					}
					Line::Quit => {
						unload(&session, &surface).await?;
						break;
					}
					Line::Activity => {
						surface.dispatch(SurfaceEvent::Activity(ActivitySignal::KeyDown));
					}
				}
			}
		}
	}
	Ok(())
}

async fn unload(session: &IdleSession, surface: &EventSurface) -> Result<()> {
	surface.dispatch(SurfaceEvent::BeforeUnload);
	print_json(&json!({ "event": "unload", "status": session.status() }))?;
	tokio::time::sleep(UNLOAD_GRACE).await;
	Ok(())
}

/// Reads stdin on a detached thread so a pending read never blocks shutdown.
fn spawn_line_reader() -> mpsc::UnboundedReceiver<String> {
	let (tx, rx) = mpsc::unbounded_channel();
	std::thread::spawn(move || {
		for line in std::io::stdin().lock().lines() {
			let Ok(line) = line else {
				break;
			};
			if tx.send(line).is_err() {
				break;
			}
		}
	});
	rx
}
