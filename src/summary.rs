//! Run summary: counters plus an ordered action log.
//!
//! A [`SyncSummary`] is created at run start, threaded mutably through every
//! stage, and rendered (or serialized) once at run end. Warnings are
//! mirrored into the log with a `WARN:` prefix so the log alone reproduces
//! the full run transcript.

use serde::Serialize;
use std::fmt::Write;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ModeCounts {
    pub created: u32,
    pub existing: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VariableCounts {
    pub created: u32,
    pub updated: u32,
    pub unchanged: u32,
    pub skipped: u32,
}

/// Accumulated results of a sync run (dry-run or commit).
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncSummary {
    pub modes: ModeCounts,
    pub variables: VariableCounts,
    pub warnings: Vec<String>,
    pub logs: Vec<String>,
}

impl SyncSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&mut self, message: impl Into<String>) {
        self.logs.push(message.into());
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.logs.push(format!("WARN: {message}"));
        self.warnings.push(message);
    }

    /// Human-readable rendering: count header, then the log, then warnings.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Modes: +{} existing:{}",
            self.modes.created, self.modes.existing
        );
        let _ = writeln!(
            out,
            "Variables: +{} ~{} ={} skipped:{}",
            self.variables.created,
            self.variables.updated,
            self.variables.unchanged,
            self.variables.skipped
        );
        out.push_str("\nLog:\n");
        for line in &self.logs {
            let _ = writeln!(out, "{line}");
        }
        if !self.warnings.is_empty() {
            out.push_str("\nWarnings:\n");
            for warning in &self.warnings {
                let _ = writeln!(out, "- {warning}");
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warn_mirrors_into_log() {
        let mut summary = SyncSummary::new();
        summary.log("+ created variable x");
        summary.warn("Missing primary in mode dark; skipped");

        assert_eq!(summary.warnings.len(), 1);
        assert_eq!(summary.logs.len(), 2);
        assert_eq!(
            summary.logs[1],
            "WARN: Missing primary in mode dark; skipped"
        );
    }

    #[test]
    fn test_render_includes_counts_log_and_warnings() {
        let mut summary = SyncSummary::new();
        summary.modes.created = 2;
        summary.modes.existing = 4;
        summary.variables.created = 1;
        summary.variables.unchanged = 3;
        summary.log("+ created variable md-primary");
        summary.warn("Missing scrim in mode light; skipped");

        let text = summary.render();
        assert!(text.contains("Modes: +2 existing:4"));
        assert!(text.contains("Variables: +1 ~0 =3 skipped:0"));
        assert!(text.contains("+ created variable md-primary"));
        assert!(text.contains("- Missing scrim in mode light; skipped"));
    }

    #[test]
    fn test_render_omits_warnings_section_when_empty() {
        let summary = SyncSummary::new();
        assert!(!summary.render().contains("Warnings:"));
    }

    #[test]
    fn test_serializes_to_expected_shape() {
        let mut summary = SyncSummary::new();
        summary.variables.skipped = 1;
        summary.warn("w");

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["modes"]["created"], 0);
        assert_eq!(json["variables"]["skipped"], 1);
        assert_eq!(json["warnings"][0], "w");
        assert_eq!(json["logs"][0], "WARN: w");
    }
}
