//! Recorded instrumentation traces
//!
//! A trace is what a host runtime would have produced while running an
//! instrumented program: the static occurrences it instrumented, followed by the
//! dynamic events it observed at them, in execution order.

use anyhow::{Context, Result};
use probe_dispatch::{CallSite, EventCategory, FrameId, NativeValue, SourceId};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Trace {
    #[serde(default)]
    pub sites: Vec<SiteRecord>,
    #[serde(default)]
    pub events: Vec<TraceEvent>,
}

/// One instrumented occurrence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteRecord {
    pub category: EventCategory,
    #[serde(flatten)]
    pub site: CallSite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraceEvent {
    Before {
        source_id: SourceId,
        #[serde(default)]
        frame: FrameId,
        #[serde(default)]
        inputs: Vec<NativeValue>,
    },
    After {
        source_id: SourceId,
        #[serde(default)]
        frame: FrameId,
        #[serde(default)]
        result: NativeValue,
        #[serde(default)]
        inputs: Vec<NativeValue>,
    },
}

impl TraceEvent {
    pub fn source_id(&self) -> SourceId {
        match self {
            TraceEvent::Before { source_id, .. } | TraceEvent::After { source_id, .. } => {
                *source_id
            }
        }
    }
}

/// Load a trace from a JSON file
pub fn load_trace(path: &Path) -> Result<Trace> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read trace file: {:?}", path))?;

    let trace: Trace = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse trace file: {:?}", path))?;

    log::debug!(
        "Loaded trace {:?}: {} sites, {} events",
        path,
        trace.sites.len(),
        trace.events.len()
    );
    Ok(trace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use probe_dispatch::{LoopKind, SiteDetail};
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "sites": [
            {
                "category": "for_object",
                "source_id": 4,
                "section": {
                    "file": "main.js",
                    "start_line": 2,
                    "start_column": 1,
                    "end_line": 4,
                    "end_column": 2
                },
                "detail": { "kind": "loop", "loop_kind": "for_in" }
            },
            { "category": "conditional", "source_id": 5 }
        ],
        "events": [
            { "event": "before", "source_id": 4, "frame": 1,
              "inputs": [{ "type": "object", "value": { "id": 10 } }] },
            { "event": "after", "source_id": 5, "result": { "type": "boolean", "value": true } }
        ]
    }"#;

    #[test]
    fn test_trace_deserialization() {
        let trace: Trace = serde_json::from_str(SAMPLE).unwrap();

        assert_eq!(trace.sites.len(), 2);
        assert_eq!(trace.sites[0].category, EventCategory::ForObject);
        assert_eq!(
            trace.sites[0].site.detail(),
            &SiteDetail::Loop {
                loop_kind: LoopKind::ForIn
            }
        );
        assert_eq!(trace.sites[1].site.detail(), &SiteDetail::None);

        match &trace.events[1] {
            TraceEvent::After {
                source_id,
                frame,
                result,
                inputs,
            } => {
                assert_eq!(*source_id, SourceId(5));
                assert_eq!(*frame, FrameId(0));
                assert_eq!(*result, NativeValue::Boolean(true));
                assert!(inputs.is_empty());
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(trace.events[0].source_id(), SourceId(4));
    }

    #[test]
    fn test_load_trace_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let trace = load_trace(file.path()).unwrap();
        assert_eq!(trace.events.len(), 2);
    }

    #[test]
    fn test_malformed_trace_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{ \"events\": [{ \"event\": \"during\" }] }").unwrap();

        let err = load_trace(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse trace file"));
    }
}
