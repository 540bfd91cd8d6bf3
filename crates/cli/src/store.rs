//! JSON-file credential store used by the terminal harness.

use std::path::{Path, PathBuf};

use idle::{CredentialAttributes, CredentialStore};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Credential record as written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCredential {
	pub token: String,
	pub attributes: CredentialAttributes,
}

/// Bearer token persisted as a single JSON file.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
	path: PathBuf,
}

impl FileCredentialStore {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Loads the stored record, `None` when the file does not exist.
	pub fn load(&self) -> idle::Result<Option<StoredCredential>> {
		match std::fs::read_to_string(&self.path) {
			Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
			Err(err) => Err(err.into()),
		}
	}

	/// Writes the record, creating parent directories as needed.
	pub fn save(&self, credential: &StoredCredential) -> idle::Result<()> {
		if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
			std::fs::create_dir_all(parent)?;
		}
		std::fs::write(&self.path, serde_json::to_string_pretty(credential)?)?;
		Ok(())
	}

	/// Removes the file if present. Returns whether anything was removed.
	pub fn clear(&self) -> idle::Result<bool> {
		match std::fs::remove_file(&self.path) {
			Ok(()) => Ok(true),
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
			Err(err) => Err(err.into()),
		}
	}
}

impl CredentialStore for FileCredentialStore {
	fn set(&self, token: &str, attributes: &CredentialAttributes) -> idle::Result<()> {
		self.save(&StoredCredential {
			token: token.to_string(),
			attributes: attributes.clone(),
		})
	}

	fn get(&self) -> idle::Result<Option<String>> {
		Ok(self.load()?.map(|credential| credential.token))
	}

	fn remove(&self) -> idle::Result<()> {
		let removed = self.clear()?;
		debug!(target = "idle.store", path = %self.path.display(), removed, "credential file cleared");
		Ok(())
	}
}
