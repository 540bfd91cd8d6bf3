//! Bearer-token cookie attributes.

use serde::{Deserialize, Serialize};

/// Deployment environment the credential is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
	#[default]
	Development,
	Production,
}

/// Cross-site sending restriction for the credential cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
	#[default]
	Strict,
	Lax,
	None,
}

/// Security flags stored alongside the bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialAttributes {
	/// Only send over secure transport.
	pub secure: bool,
	pub same_site: SameSite,
	/// Path scope of the cookie.
	pub path: String,
}

impl CredentialAttributes {
	/// Attributes for the admin bearer token in `env`.
	///
	/// Secure transport is required in production only so local development
	/// over plain HTTP keeps working.
	pub fn for_environment(env: Environment) -> Self {
		Self {
			secure: env == Environment::Production,
			same_site: SameSite::Strict,
			path: "/".to_string(),
		}
	}
}

impl Default for CredentialAttributes {
	fn default() -> Self {
		Self::for_environment(Environment::default())
	}
}
