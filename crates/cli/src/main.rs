use clap::Parser;
use idle_cli::cli::Cli;
use idle_cli::{commands, logging};
use tracing::error;

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	if let Err(err) = commands::dispatch(cli).await {
		error!(target = "idle", error = %err, "command failed");
		std::process::exit(1);
	}
}
