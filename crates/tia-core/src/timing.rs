//! Opt-in per-stage wall-clock timing.
//!
//! Enabled by `--timing` or `TIA_TIMING`; the report is printed to stderr as
//! a table followed by JSON.

use std::time::{Duration, Instant};

use serde::Serialize;

/// Wall-clock durations of the pipeline stages run in one invocation.
///
/// Recording is a no-op unless the collector was created enabled, so stage
/// code can always wrap itself in [`StageTimings::time`].
#[derive(Debug, Clone, Default)]
pub struct StageTimings {
    enabled: bool,
    stages: Vec<StageTiming>,
}

/// Duration of one named stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageTiming {
    pub name: String,
    #[serde(rename = "elapsed_us", serialize_with = "as_micros")]
    pub elapsed: Duration,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn as_micros<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u128(d.as_micros())
}

/// Returns true when `TIA_TIMING` enables timing collection.
///
/// Supported truthy values: `1`, `true`, `yes`, `on` (case-insensitive).
#[must_use]
pub fn timing_enabled_from_env() -> bool {
    std::env::var("TIA_TIMING")
        .ok()
        .is_some_and(|value| is_truthy(value.as_str()))
}

impl StageTimings {
    #[must_use]
    pub const fn new(enabled: bool) -> Self {
        Self {
            enabled,
            stages: Vec::new(),
        }
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Run `f`, recording its duration under `name` when enabled.
    pub fn time<R>(&mut self, name: &str, f: impl FnOnce() -> R) -> R {
        if !self.enabled {
            return f();
        }

        let started = Instant::now();
        let result = f();
        self.record(name, started.elapsed());
        result
    }

    fn record(&mut self, name: &str, elapsed: Duration) {
        self.stages.push(StageTiming {
            name: name.to_string(),
            elapsed,
        });
    }

    #[must_use]
    pub fn stages(&self) -> &[StageTiming] {
        &self.stages
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    #[must_use]
    pub fn total(&self) -> Duration {
        self.stages.iter().map(|s| s.elapsed).sum()
    }

    /// Render the timings as JSON.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "stages": self.stages,
            "total_us": self.total().as_micros(),
        })
    }

    /// Render the timings as a simple table for terminal output.
    #[must_use]
    pub fn display_table(&self) -> String {
        use std::fmt::Write as _;

        if self.stages.is_empty() {
            return "No timing samples recorded.".to_string();
        }

        let mut out = String::new();
        out.push_str("stage                          elapsed\n");
        out.push_str("--------------------------------------\n");
        for stage in &self.stages {
            let _ = writeln!(out, "{:<28} {:>9}", stage.name, format_duration(stage.elapsed));
        }
        let _ = writeln!(out, "{:<28} {:>9}", "total", format_duration(self.total()));
        out
    }
}

fn format_duration(duration: Duration) -> String {
    let micros = duration.as_micros();

    if micros >= 1_000_000 {
        let secs = micros / 1_000_000;
        let millis = (micros % 1_000_000) / 1_000;
        format!("{secs}.{millis:03}s")
    } else if micros >= 1_000 {
        let millis = micros / 1_000;
        let rem = micros % 1_000;
        format!("{millis}.{rem:03}ms")
    } else {
        format!("{micros}µs")
    }
}

fn is_truthy(value: &str) -> bool {
    ["1", "true", "yes", "on"]
        .iter()
        .any(|t| value.eq_ignore_ascii_case(t))
}
