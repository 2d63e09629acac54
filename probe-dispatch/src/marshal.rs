//! Value conversion and callback invocation across the analysis boundary
//!
//! Stateless helpers: every function here works only on its arguments. Argument
//! vectors are assembled in a single allocation, location first.

use crate::callback::{AnalysisModule, Callback};
use crate::category::EventCategory;
use crate::types::{
    AnalysisValue, DispatchError, NativeValue, Result, SourceId, ValueHandle, ValueKind,
};
use std::iter;

/// Convert a host value into its analysis-safe form
///
/// Neutral values pass through unchanged (integers are widened to numbers, ropes
/// flattened to strings). Host-only values become a [`ValueHandle`]; the conversion
/// never looks inside them.
///
/// Integers are widened to `f64`, so magnitudes above 2^53 round to the nearest
/// representable number, as they would in the analysis language itself.
pub fn convert_result(value: &NativeValue) -> AnalysisValue {
    match value {
        NativeValue::Undefined => AnalysisValue::Undefined,
        NativeValue::Null => AnalysisValue::Null,
        NativeValue::Boolean(v) => AnalysisValue::Boolean(*v),
        NativeValue::Integer(v) => AnalysisValue::Number(*v as f64),
        NativeValue::Number(v) => AnalysisValue::Number(*v),
        NativeValue::String(v) => AnalysisValue::String(v.clone()),
        NativeValue::Rope(pieces) => AnalysisValue::String(pieces.concat()),
        NativeValue::Symbol(r) => handle(ValueKind::Symbol, r.id, r.label.as_ref()),
        NativeValue::Object(r) => handle(ValueKind::Object, r.id, r.label.as_ref()),
        NativeValue::Function(r) => handle(ValueKind::Function, r.id, r.label.as_ref()),
        NativeValue::Array(r) => handle(ValueKind::Array, r.id, r.label.as_ref()),
        NativeValue::Handle(h) => AnalysisValue::Handle(h.clone()),
    }
}

fn handle(kind: ValueKind, id: u64, label: Option<&String>) -> AnalysisValue {
    AnalysisValue::Handle(ValueHandle {
        kind,
        id,
        label: label.cloned(),
    })
}

/// Convert the `index`-th operation input, `undefined` when the host supplied fewer
pub fn convert_input(inputs: &[NativeValue], index: usize) -> AnalysisValue {
    inputs
        .get(index)
        .map(convert_result)
        .unwrap_or(AnalysisValue::Undefined)
}

/// Convert a run of inputs into a one-level argument list
pub fn convert_list(values: &[NativeValue]) -> AnalysisValue {
    AnalysisValue::List(values.iter().map(convert_result).collect())
}

/// Invoke a pre-event callback with `(location, args...)`
pub fn pre_call<I>(
    owner: EventCategory,
    analysis: &dyn AnalysisModule,
    callback: &Callback,
    location: SourceId,
    args: I,
) -> Result<()>
where
    I: IntoIterator<Item = AnalysisValue>,
{
    let argv: Vec<AnalysisValue> = iter::once(AnalysisValue::from(location))
        .chain(args)
        .collect();
    invoke(owner, analysis, callback, location, &argv)
}

/// Invoke a post-event callback with `(location, args..., convert_result(result))`
pub fn post_call<I>(
    owner: EventCategory,
    analysis: &dyn AnalysisModule,
    callback: &Callback,
    location: SourceId,
    args: I,
    result: &NativeValue,
) -> Result<()>
where
    I: IntoIterator<Item = AnalysisValue>,
{
    let argv: Vec<AnalysisValue> = iter::once(AnalysisValue::from(location))
        .chain(args)
        .chain(iter::once(convert_result(result)))
        .collect();
    invoke(owner, analysis, callback, location, &argv)
}

fn invoke(
    owner: EventCategory,
    analysis: &dyn AnalysisModule,
    callback: &Callback,
    location: SourceId,
    argv: &[AnalysisValue],
) -> Result<()> {
    log::trace!(
        "{}.{} <- {} ({} args)",
        analysis.name(),
        callback.name(),
        owner,
        argv.len()
    );
    callback
        .call(analysis, argv)
        .map_err(|source| DispatchError::Callback {
            category: owner,
            callback: callback.name().to_string(),
            source_id: location,
            source,
        })
}
