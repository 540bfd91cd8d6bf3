use std::path::PathBuf;

use clap::{Parser, Subcommand};
use idle::PolicyOverrides;

pub const DEFAULT_STORE: &str = ".idle/credential.json";

#[derive(Parser, Debug)]
#[command(name = "idle")]
#[command(about = "Idle-session timeout and forced logout for the admin console")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Inactivity period before logout, in minutes (overrides IDLE_TIMEOUT_MINUTES)
	#[arg(long, global = true, value_name = "MINUTES")]
	pub timeout_minutes: Option<String>,

	/// Warning lead before logout, in minutes (overrides IDLE_WARNING_MINUTES)
	#[arg(long, global = true, value_name = "MINUTES")]
	pub warning_minutes: Option<String>,

	/// Keep the credential when the view is torn down
	#[arg(long, global = true)]
	pub no_unload_logout: bool,

	/// Credential file
	#[arg(long, global = true, value_name = "FILE", default_value = DEFAULT_STORE)]
	pub store: PathBuf,

	#[command(subcommand)]
	pub command: Commands,
}

impl Cli {
	/// Overrides given on the command line only.
	pub fn flag_overrides(&self) -> PolicyOverrides {
		PolicyOverrides {
			timeout_minutes: self.timeout_minutes.clone(),
			warning_minutes: self.warning_minutes.clone(),
			unload_termination: self.no_unload_logout.then(|| "false".to_string()),
		}
	}

	/// Environment overrides with command-line flags layered on top.
	pub fn overrides(&self) -> PolicyOverrides {
		PolicyOverrides::from_env().merge(self.flag_overrides())
	}
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Print the resolved session policy
	Policy,

	/// Manage the stored bearer credential
	Token {
		#[command(subcommand)]
		action: TokenAction,
	},

	/// Run an idle session on this terminal
	///
	/// Every stdin line counts as a key press. `status` prints the session
	/// status, `logout` signs out now and `quit` tears the view down.
	Watch {
		/// Sign in with this token instead of the stored one
		#[arg(long)]
		token: Option<String>,

		/// Make the identity provider reject sign-out
		#[arg(long)]
		fail_revocation: bool,

		/// Path navigated to after logout
		#[arg(long, default_value = idle::DEFAULT_LOGIN_PATH)]
		login_path: String,
	},
}

#[derive(Subcommand, Debug)]
pub enum TokenAction {
	/// Store a bearer token
	Set {
		token: String,
		/// Mark the credential secure as in production
		#[arg(long)]
		production: bool,
	},
	/// Print the stored token and its attributes
	Show,
	/// Remove the stored token
	Clear,
}
