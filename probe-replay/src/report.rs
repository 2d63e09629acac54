//! Report generation
//!
//! Plain-text summary of a replay run, one section per trace.

use crate::replay::ReplayStats;
use chrono::{DateTime, Utc};
use std::fmt::Write;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub enum Outcome {
    Completed(ReplayStats),
    /// Trace could not be loaded, or was aborted by a failure
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct TraceReport {
    pub path: PathBuf,
    pub outcome: Outcome,
}

#[derive(Debug, Clone)]
pub struct Report {
    pub analysis: String,
    pub generated_at: DateTime<Utc>,
    pub traces: Vec<TraceReport>,
}

impl Report {
    pub fn new(analysis: impl Into<String>, traces: Vec<TraceReport>) -> Self {
        Self {
            analysis: analysis.into(),
            generated_at: Utc::now(),
            traces,
        }
    }

    pub fn failed_traces(&self) -> usize {
        self.traces
            .iter()
            .filter(|t| matches!(t.outcome, Outcome::Failed(_)))
            .count()
    }

    pub fn render_txt(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail
        let _ = self.write_txt(&mut out);
        out
    }

    fn write_txt(&self, out: &mut String) -> std::fmt::Result {
        writeln!(out, "Probe Replay Report")?;
        writeln!(out, "===================")?;
        writeln!(out, "Analysis:  {}", self.analysis)?;
        writeln!(
            out,
            "Generated: {}",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        writeln!(
            out,
            "Traces:    {} ({} failed)",
            self.traces.len(),
            self.failed_traces()
        )?;

        for trace in &self.traces {
            writeln!(out)?;
            writeln!(out, "Trace: {}", trace.path.display())?;
            match &trace.outcome {
                Outcome::Failed(reason) => writeln!(out, "  FAILED: {}", reason)?,
                Outcome::Completed(stats) => write_stats(out, stats)?,
            }
        }
        Ok(())
    }
}

fn write_stats(out: &mut String, stats: &ReplayStats) -> std::fmt::Result {
    writeln!(out, "  Sites:          {}", stats.sites)?;
    if stats.duplicate_sites > 0 {
        writeln!(out, "  Repeated sites: {}", stats.duplicate_sites)?;
    }
    writeln!(
        out,
        "  Handlers:       {} ({} inert)",
        stats.handlers, stats.inert_handlers
    )?;
    writeln!(
        out,
        "  Events:         {} before, {} after",
        stats.before_events, stats.after_events
    )?;
    if stats.unknown_events > 0 {
        writeln!(out, "  Unknown events: {}", stats.unknown_events)?;
    }
    writeln!(out, "  Failures:       {}", stats.failures)?;

    if stats.per_category.is_empty() {
        return Ok(());
    }
    writeln!(out, "  {:<20}{:>8}{:>8}{:>10}", "category", "before", "after", "failures")?;
    for (category, counts) in &stats.per_category {
        writeln!(
            out,
            "  {:<20}{:>8}{:>8}{:>10}",
            category.name(),
            counts.before,
            counts.after,
            counts.failures
        )?;
    }
    Ok(())
}
