//! Subcommand implementations.
//!
//! - [`policy`] - print the resolved policy
//! - [`token`] - manage the stored bearer credential
//! - [`watch`] - run a live idle session on the terminal

pub mod policy;
pub mod token;
pub mod watch;

use anyhow::Result;
use idle::SessionPolicy;

use crate::cli::{Cli, Commands};
use crate::store::FileCredentialStore;

pub async fn dispatch(cli: Cli) -> Result<()> {
	let policy = SessionPolicy::resolve(&cli.overrides());
	let store = FileCredentialStore::new(cli.store.clone());

	match cli.command {
		Commands::Policy => policy::show(&policy),
		Commands::Token { action } => token::run(action, &store),
		Commands::Watch {
			token,
			fail_revocation,
			login_path,
		} => {
			watch::run(
				policy,
				store,
				watch::WatchOptions {
					token,
					fail_revocation,
					login_path,
				},
			)
			.await
		}
	}
}

pub(crate) fn print_json(value: &serde_json::Value) -> Result<()> {
	println!("{}", serde_json::to_string(value)?);
	Ok(())
}
