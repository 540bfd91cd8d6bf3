use anyhow::Result;
use idle::{ActivitySignal, SessionPolicy};
use serde::Serialize;

use super::print_json;

/// Serializable view of a resolved policy.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyView {
	pub timeout_ms: u64,
	pub warning_lead_ms: u64,
	pub warning_after_ms: u64,
	pub signals: Vec<ActivitySignal>,
	pub unload_termination: bool,
}

impl From<&SessionPolicy> for PolicyView {
	fn from(policy: &SessionPolicy) -> Self {
		Self {
			timeout_ms: policy.timeout().as_millis() as u64,
			warning_lead_ms: policy.warning_lead().as_millis() as u64,
			warning_after_ms: policy.warning_delay().as_millis() as u64,
			signals: policy.signals().iter().copied().collect(),
			unload_termination: policy.unload_termination_enabled(),
		}
	}
}

pub fn show(policy: &SessionPolicy) -> Result<()> {
	print_json(&serde_json::to_value(PolicyView::from(policy))?)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_policy_view() {
		let value = serde_json::to_value(PolicyView::from(&SessionPolicy::default())).unwrap();
		assert_eq!(value["timeoutMs"], 1_800_000);
		assert_eq!(value["warningLeadMs"], 300_000);
		assert_eq!(value["warningAfterMs"], 1_500_000);
		assert_eq!(value["unloadTermination"], true);
		assert_eq!(value["signals"].as_array().unwrap().len(), 6);
	}
}
