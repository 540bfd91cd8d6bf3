//! Terminal-backed warning prompt and navigator.
//!
//! Both share the stdin line stream with activity input: while a prompt is
//! open the next line answers it instead of counting as a key press.

use std::io::Write;
use std::time::Duration;

use async_trait::async_trait;
use idle::{Navigator, WarningPrompt};
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

/// Warning prompt answered by the next stdin line.
#[derive(Default)]
pub struct TerminalPrompt {
	pending: Mutex<Option<oneshot::Sender<String>>>,
}

impl TerminalPrompt {
	pub fn new() -> Self {
		Self::default()
	}

	/// Hands `line` to an open prompt. Returns the line back when no prompt
	/// is waiting for it.
	pub fn offer(&self, line: String) -> Option<String> {
		let Some(tx) = self.pending.lock().take() else {
			return Some(line);
		};
		tx.send(line).err()
	}
}

#[async_trait]
impl WarningPrompt for TerminalPrompt {
	async fn ask_extend(&self, remaining: Duration) -> idle::Result<bool> {
		let (tx, rx) = oneshot::channel();
		*self.pending.lock() = Some(tx);
		{
			let mut stderr = std::io::stderr().lock();
			writeln!(stderr, "Session expires in {}s. Stay signed in? [y/N]", remaining.as_secs())?;
		}
		let answer = rx.await.map_err(|_| idle::Error::Prompt("input closed".into()))?;
		Ok(is_affirmative(&answer))
	}
}

fn is_affirmative(answer: &str) -> bool {
	matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Navigator that reports the destination to the command loop.
pub struct ExitNavigator {
	tx: mpsc::UnboundedSender<String>,
}

impl ExitNavigator {
	pub fn channel() -> (Self, mpsc::UnboundedReceiver<String>) {
		let (tx, rx) = mpsc::unbounded_channel();
		(Self { tx }, rx)
	}
}

impl Navigator for ExitNavigator {
	fn navigate_to(&self, path: &str) {
		if self.tx.send(path.to_string()).is_err() {
			debug!(target = "idle.watch", %path, "navigation after command loop ended");
		}
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use super::*;

	#[test]
	fn affirmative_answers() {
		assert!(is_affirmative("y"));
		assert!(is_affirmative(" YES \n"));
		assert!(!is_affirmative("n"));
		assert!(!is_affirmative(""));
	}

	#[test]
	fn lines_pass_through_without_open_prompt() {
		let prompt = TerminalPrompt::new();
		assert_eq!(prompt.offer("hello".into()).as_deref(), Some("hello"));
	}

	#[tokio::test]
	async fn next_line_answers_open_prompt() {
		let prompt = Arc::new(TerminalPrompt::new());
		let asking = Arc::clone(&prompt);
		let answer = tokio::spawn(async move { asking.ask_extend(Duration::from_secs(300)).await });

		let mut line = Some("y".to_string());
		while let Some(pending) = line {
			tokio::task::yield_now().await;
			line = prompt.offer(pending);
		}
		assert!(answer.await.unwrap().unwrap());
		assert_eq!(prompt.offer("after".into()).as_deref(), Some("after"));
	}

	#[tokio::test]
	async fn navigation_reaches_receiver() {
		let (navigator, mut rx) = ExitNavigator::channel();
		navigator.navigate_to("/login");
		assert_eq!(rx.recv().await.as_deref(), Some("/login"));
	}
}
