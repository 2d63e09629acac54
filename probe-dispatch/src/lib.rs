//! Instrumentation Event Dispatch Library
//!
//! Routes execution events detected by a host instrumentation runtime to the
//! callbacks of an analysis module, converting host values into a neutral form on
//! the way.
//!
//! # Architecture
//!
//! - [`marshal`] converts host values and performs the actual callback invocation
//! - [`handlers`] holds one handler kind per [`EventCategory`], bound to one call site
//! - [`factory`] holds one factory kind per category, producing handlers on demand
//!
//! The library does NOT:
//! - Decide when or where events fire (the host does)
//! - Map configuration to factories (the registering application does)
//! - Catch, retry or log callback failures; they propagate to the host
//!
//! # Example Usage
//!
//! ```
//! use probe_dispatch::{
//!     AnalysisModule, CallSite, Callback, ExpressionFactory, Factory, FrameId,
//!     NativeValue, SiteDetail, SourceId,
//! };
//! use std::any::Any;
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl AnalysisModule for Printer {
//!     fn name(&self) -> &str {
//!         "printer"
//!     }
//!
//!     fn as_any(&self) -> &dyn Any {
//!         self
//!     }
//! }
//!
//! let end = Callback::new("endExpression", |_, args| {
//!     println!("endExpression{:?}", args);
//!     Ok(())
//! });
//! let factory: Factory = ExpressionFactory::new(Arc::new(Printer), None, Some(end)).into();
//!
//! let site = CallSite::new(SourceId(42)).with_detail(SiteDetail::Node {
//!     node_type: "BinaryExpression".to_string(),
//! });
//! let handler = factory.create(&site).unwrap();
//!
//! handler.before(&FrameId(1), &[]).unwrap();
//! handler.after(&FrameId(1), &NativeValue::Integer(3), &[]).unwrap();
//! ```

// Public modules
pub mod callback;
pub mod category;
pub mod factory;
pub mod handlers;
pub mod marshal;
pub mod site;
pub mod types;

// Re-export main types for convenience
pub use callback::{AnalysisModule, Callback, CallbackPair, Invocable};
pub use category::{CallbackShape, EventCategory, UnknownCategory};
pub use factory::{
    AwaitFactory, BinaryFactory, ConditionalFactory, ControlFlowRootFactory, DeclareFactory,
    EvalFactory, ExpressionFactory, Factory, ForObjectFactory, FunctionFactory, GetFieldFactory,
    InvokeFactory, LiteralFactory, PutFieldFactory, ReadFactory, StatementFactory, UnaryFactory,
    WriteFactory,
};
pub use handlers::EventHandler;
pub use marshal::convert_result;
pub use site::{
    CallSite, DeclarationType, ExecutionFrame, FrameId, LiteralType, LoopKind, SiteDetail,
    SourceSection,
};
pub use types::{
    AnalysisValue, CallbackError, DispatchError, NativeValue, ObjectRef, Result, SourceId,
    ValueHandle, ValueKind,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
