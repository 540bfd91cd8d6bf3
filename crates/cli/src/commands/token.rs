use anyhow::{Context, Result};
use idle::{CredentialAttributes, CredentialStore, Environment};
use serde_json::json;
use tracing::info;

use super::print_json;
use crate::cli::TokenAction;
use crate::store::FileCredentialStore;

pub fn run(action: TokenAction, store: &FileCredentialStore) -> Result<()> {
	match action {
		TokenAction::Set { token, production } => set(store, &token, production),
		TokenAction::Show => show(store),
		TokenAction::Clear => clear(store),
	}
}

fn set(store: &FileCredentialStore, token: &str, production: bool) -> Result<()> {
	let env = if production { Environment::Production } else { Environment::Development };
	let attributes = CredentialAttributes::for_environment(env);
	store
		.set(token, &attributes)
		.with_context(|| format!("failed to write {}", store.path().display()))?;
	info!(target = "idle.store", path = %store.path().display(), secure = attributes.secure, "credential stored");
	print_json(&json!({ "stored": true, "path": store.path(), "attributes": attributes }))
}

fn show(store: &FileCredentialStore) -> Result<()> {
	let record = store.load().with_context(|| format!("failed to read {}", store.path().display()))?;
	match record {
		Some(record) => print_json(&json!({ "present": true, "token": record.token, "attributes": record.attributes })),
		None => print_json(&json!({ "present": false })),
	}
}

fn clear(store: &FileCredentialStore) -> Result<()> {
	let removed = store.clear().with_context(|| format!("failed to remove {}", store.path().display()))?;
	print_json(&json!({ "removed": removed }))
}
