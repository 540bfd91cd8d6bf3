use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde_json::Value;
use tempfile::TempDir;

fn idle_binary() -> PathBuf {
	let mut path = std::env::current_exe().expect("current_exe should resolve");
	path.pop();
	path.pop();
	path.push("idle");
	path
}

fn idle_command(workdir: &Path) -> Command {
	let mut cmd = Command::new(idle_binary());
	cmd.current_dir(workdir)
		.env_remove("IDLE_TIMEOUT_MINUTES")
		.env_remove("IDLE_WARNING_MINUTES")
		.env_remove("IDLE_UNLOAD_LOGOUT")
		.env_remove("RUST_LOG");
	cmd
}

fn run_idle(workdir: &Path, args: &[&str], env: &[(&str, &str)]) -> (bool, String, String) {
	let output = idle_command(workdir)
		.args(args)
		.envs(env.iter().copied())
		.output()
		.expect("failed to execute idle");

	let stdout = String::from_utf8_lossy(&output.stdout).to_string();
	let stderr = String::from_utf8_lossy(&output.stderr).to_string();
	(output.status.success(), stdout, stderr)
}

fn json_lines(stdout: &str) -> Vec<Value> {
	stdout
		.lines()
		.filter(|line| !line.trim().is_empty())
		.map(|line| serde_json::from_str(line).unwrap_or_else(|_| panic!("stdout line is not JSON: {line}")))
		.collect()
}

fn single_json(stdout: &str) -> Value {
	let mut lines = json_lines(stdout);
	assert_eq!(lines.len(), 1, "expected one JSON line, got: {stdout}");
	lines.remove(0)
}

#[test]
fn policy_defaults_to_thirty_minutes_with_five_minute_warning() {
	let tmp = TempDir::new().expect("temp dir should be created");
	let (success, stdout, stderr) = run_idle(tmp.path(), &["policy"], &[]);
	assert!(success, "policy failed: {stderr}");

	let json = single_json(&stdout);
	assert_eq!(json["timeoutMs"], 1_800_000);
	assert_eq!(json["warningLeadMs"], 300_000);
	assert_eq!(json["unloadTermination"], true);
}

#[test]
fn policy_malformed_environment_falls_back_to_default() {
	let tmp = TempDir::new().expect("temp dir should be created");
	let (success, stdout, stderr) = run_idle(tmp.path(), &["policy"], &[("IDLE_TIMEOUT_MINUTES", "abc")]);
	assert!(success, "policy failed: {stderr}");
	assert_eq!(single_json(&stdout)["timeoutMs"], 1_800_000);
}

#[test]
fn policy_flags_override_environment() {
	let tmp = TempDir::new().expect("temp dir should be created");
	let (success, stdout, stderr) = run_idle(
		tmp.path(),
		&["--timeout-minutes", "10", "--no-unload-logout", "policy"],
		&[("IDLE_TIMEOUT_MINUTES", "45"), ("IDLE_WARNING_MINUTES", "2")],
	);
	assert!(success, "policy failed: {stderr}");

	let json = single_json(&stdout);
	assert_eq!(json["timeoutMs"], 600_000);
	assert_eq!(json["warningLeadMs"], 120_000);
	assert_eq!(json["unloadTermination"], false);
}

#[test]
fn token_set_show_clear_roundtrip() {
	let tmp = TempDir::new().expect("temp dir should be created");
	let store = tmp.path().join("cred.json");
	let store = store.to_str().expect("utf-8 temp path");

	let (success, _, stderr) = run_idle(tmp.path(), &["--store", store, "token", "set", "bearer-1", "--production"], &[]);
	assert!(success, "token set failed: {stderr}");

	let (success, stdout, stderr) = run_idle(tmp.path(), &["--store", store, "token", "show"], &[]);
	assert!(success, "token show failed: {stderr}");
	let json = single_json(&stdout);
	assert_eq!(json["present"], true);
	assert_eq!(json["token"], "bearer-1");
	assert_eq!(json["attributes"]["secure"], true);
	assert_eq!(json["attributes"]["sameSite"], "strict");

	let (success, stdout, _) = run_idle(tmp.path(), &["--store", store, "token", "clear"], &[]);
	assert!(success);
	assert_eq!(single_json(&stdout)["removed"], true);

	let (success, stdout, _) = run_idle(tmp.path(), &["--store", store, "token", "clear"], &[]);
	assert!(success, "clearing a missing credential should succeed");
	assert_eq!(single_json(&stdout)["removed"], false);

	let (_, stdout, _) = run_idle(tmp.path(), &["--store", store, "token", "show"], &[]);
	assert_eq!(single_json(&stdout)["present"], false);
}

#[test]
fn token_uses_default_store_in_working_directory() {
	let tmp = TempDir::new().expect("temp dir should be created");
	let (success, _, stderr) = run_idle(tmp.path(), &["token", "set", "bearer-2"], &[]);
	assert!(success, "token set failed: {stderr}");
	assert!(tmp.path().join(".idle/credential.json").exists());
}

#[test]
fn watch_without_credential_fails() {
	let tmp = TempDir::new().expect("temp dir should be created");
	let output = idle_command(tmp.path())
		.arg("watch")
		.stdin(Stdio::null())
		.output()
		.expect("failed to execute idle");
	assert!(!output.status.success());
}

#[test]
fn watch_quit_erases_credential_without_navigation() {
	let tmp = TempDir::new().expect("temp dir should be created");
	let (success, _, stderr) = run_idle(tmp.path(), &["token", "set", "bearer-3"], &[]);
	assert!(success, "token set failed: {stderr}");

	let mut child = idle_command(tmp.path())
		.arg("watch")
		.stdin(Stdio::piped())
		.stdout(Stdio::piped())
		.stderr(Stdio::piped())
		.spawn()
		.expect("failed to spawn idle watch");
	child
		.stdin
		.take()
		.expect("stdin piped")
		.write_all(b"typing\nstatus\nquit\n")
		.expect("stdin should accept input");
	let output = child.wait_with_output().expect("watch should exit");
	assert!(output.status.success(), "watch failed: {}", String::from_utf8_lossy(&output.stderr));

	let events = json_lines(&String::from_utf8_lossy(&output.stdout));
	let kinds: Vec<&str> = events.iter().filter_map(|e| e["event"].as_str()).collect();
	assert_eq!(kinds, vec!["attached", "status", "unload"]);
	assert_eq!(events[1]["status"]["state"], "active");
	assert_eq!(events[2]["status"]["terminated"], true);
	assert!(!tmp.path().join(".idle/credential.json").exists());
}

#[test]
fn watch_expiry_logs_out_even_when_revocation_fails() {
	let tmp = TempDir::new().expect("temp dir should be created");
	let store = tmp.path().join("cred.json");
	let store_arg = store.to_str().expect("utf-8 temp path");

	let mut child = idle_command(tmp.path())
		.args([
			"--store",
			store_arg,
			"--timeout-minutes",
			"0.01",
			"--warning-minutes",
			"0.005",
			"watch",
			"--token",
			"bearer-4",
			"--fail-revocation",
		])
		.stdin(Stdio::piped())
		.stdout(Stdio::piped())
		.stderr(Stdio::piped())
		.spawn()
		.expect("failed to spawn idle watch");

	let stdin = child.stdin.take();
	let status = child.wait().expect("watch should exit after expiry");
	drop(stdin);
	assert!(status.success());

	let mut stdout = String::new();
	child.stdout.take().expect("stdout piped").read_to_string(&mut stdout).expect("stdout readable");
	let events = json_lines(&stdout);
	let last = events.last().expect("at least one event");
	assert_eq!(last["event"], "navigate");
	assert_eq!(last["path"], "/login");
	assert!(!store.exists());
}
