//! Input signals observed on the global input surface.

use std::fmt;

use serde::{Deserialize, Serialize};

/// User-interaction signal that proves the operator is still present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivitySignal {
	PointerDown,
	PointerMove,
	KeyDown,
	Scroll,
	TouchStart,
	Click,
}

impl ActivitySignal {
	/// Built-in signal set used when no policy override narrows it.
	pub const DEFAULTS: [ActivitySignal; 6] = [
		ActivitySignal::PointerDown,
		ActivitySignal::PointerMove,
		ActivitySignal::KeyDown,
		ActivitySignal::Scroll,
		ActivitySignal::TouchStart,
		ActivitySignal::Click,
	];

	/// DOM event name for this signal.
	pub fn event_name(self) -> &'static str {
		match self {
			ActivitySignal::PointerDown => "mousedown",
			ActivitySignal::PointerMove => "mousemove",
			ActivitySignal::KeyDown => "keydown",
			ActivitySignal::Scroll => "scroll",
			ActivitySignal::TouchStart => "touchstart",
			ActivitySignal::Click => "click",
		}
	}
}

impl fmt::Display for ActivitySignal {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.event_name())
	}
}

/// Any event a listener can be registered for on the input surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "signal")]
pub enum SurfaceEvent {
	/// Operator interaction.
	Activity(ActivitySignal),
	/// The page or tab is about to be torn down.
	BeforeUnload,
}

impl fmt::Display for SurfaceEvent {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SurfaceEvent::Activity(signal) => signal.fmt(f),
			SurfaceEvent::BeforeUnload => f.write_str("beforeunload"),
		}
	}
}
