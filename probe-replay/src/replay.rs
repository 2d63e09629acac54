//! Trace replay: the host side of the dispatch boundary
//!
//! Replay plays the part of the instrumentation runtime. Every declared site is
//! instrumented once, by creating a handler from each factory registered for the
//! site's category, and every recorded event is then delivered to those handlers
//! in trace order.

use crate::trace::{Trace, TraceEvent};
use probe_dispatch::{DispatchError, EventCategory, EventHandler, Factory, SourceId};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::error::Error;

#[derive(Debug, Clone, Default)]
pub struct ReplayOptions {
    /// Log and count callback failures instead of aborting the trace
    pub keep_going: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryStats {
    pub before: usize,
    pub after: usize,
    pub failures: usize,
}

/// Statistics for one replayed trace
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub sites: usize,
    /// Site records repeating an already declared (source id, category) pair
    pub duplicate_sites: usize,
    pub handlers: usize,
    /// Handlers that can never reach the analysis (e.g. non-object loops)
    pub inert_handlers: usize,
    pub before_events: usize,
    pub after_events: usize,
    /// Events naming a source id no site declared
    pub unknown_events: usize,
    pub failures: usize,
    pub per_category: BTreeMap<EventCategory, CategoryStats>,
}

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("failed to instrument site {source_id}")]
    Instrument {
        source_id: SourceId,
        #[source]
        source: DispatchError,
    },

    #[error("event #{index} at source {source_id} failed")]
    Dispatch {
        index: usize,
        source_id: SourceId,
        #[source]
        source: DispatchError,
    },
}

/// Categories and handlers declared at one source id
#[derive(Default)]
struct Instrumented<'t> {
    categories: Vec<EventCategory>,
    handlers: Vec<EventHandler<'t>>,
}

/// Replay one trace against the registered factories
pub fn replay(
    trace: &Trace,
    factories: &[Factory],
    options: &ReplayOptions,
) -> Result<ReplayStats, ReplayError> {
    let mut stats = ReplayStats::default();
    let mut sites: HashMap<SourceId, Instrumented<'_>> = HashMap::new();
    let mut declared: HashSet<(SourceId, EventCategory)> = HashSet::new();

    for record in &trace.sites {
        let source_id = record.site.source_id();
        if !declared.insert((source_id, record.category)) {
            log::warn!(
                "Site {} already declared as {}, skipping repeat",
                source_id,
                record.category
            );
            stats.duplicate_sites += 1;
            continue;
        }
        stats.sites += 1;
        let entry = sites.entry(source_id).or_default();
        entry.categories.push(record.category);

        for factory in factories.iter().filter(|f| f.category() == record.category) {
            match factory.create(&record.site) {
                Ok(handler) => {
                    if handler.is_inert() {
                        stats.inert_handlers += 1;
                    }
                    stats.handlers += 1;
                    entry.handlers.push(handler);
                }
                Err(source) if options.keep_going => {
                    log::warn!("Skipping site {}: {}", source_id, describe(&source));
                    stats.failures += 1;
                }
                Err(source) => return Err(ReplayError::Instrument { source_id, source }),
            }
        }
    }
    log::debug!(
        "Instrumented {} sites with {} handlers",
        stats.sites,
        stats.handlers
    );

    for (index, event) in trace.events.iter().enumerate() {
        let source_id = event.source_id();
        let Some(instrumented) = sites.get(&source_id) else {
            log::warn!("Event #{} names unknown source {}, skipping", index, source_id);
            stats.unknown_events += 1;
            continue;
        };

        let is_before = matches!(event, TraceEvent::Before { .. });
        if is_before {
            stats.before_events += 1;
        } else {
            stats.after_events += 1;
        }
        for &declared_as in &instrumented.categories {
            let counts = stats.per_category.entry(declared_as).or_default();
            if is_before {
                counts.before += 1;
            } else {
                counts.after += 1;
            }
        }

        for handler in &instrumented.handlers {
            if let Err(source) = deliver(handler, event) {
                if !options.keep_going {
                    return Err(ReplayError::Dispatch {
                        index,
                        source_id,
                        source,
                    });
                }
                log::warn!("Event #{} failed: {}", index, describe(&source));
                stats.per_category.entry(handler.category()).or_default().failures += 1;
                stats.failures += 1;
            }
        }
    }

    Ok(stats)
}

fn deliver(handler: &EventHandler<'_>, event: &TraceEvent) -> probe_dispatch::Result<()> {
    match event {
        TraceEvent::Before { frame, inputs, .. } => handler.before(frame, inputs),
        TraceEvent::After {
            frame,
            result,
            inputs,
            ..
        } => handler.after(frame, result, inputs),
    }
}

/// Error message followed by its source chain
pub fn describe(err: &dyn Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
