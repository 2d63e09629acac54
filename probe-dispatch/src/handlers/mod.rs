//! Event handlers, one kind per event category
//!
//! Every handler is bound to exactly one [`CallSite`] and shares its callbacks with
//! the factory that produced it. The host calls [`EventHandler::before`] and
//! [`EventHandler::after`] around each dynamic execution of the occurrence.

use crate::callback::Binding;
use crate::category::EventCategory;
use crate::marshal;
use crate::site::{CallSite, ExecutionFrame};
use crate::types::{AnalysisValue, NativeValue, Result, SourceId};
use std::sync::Arc;

mod access;
mod call;
mod loops;
mod operation;
mod syntax;

pub use access::{DeclareHandler, GetFieldHandler, PutFieldHandler, ReadHandler, WriteHandler};
pub use call::{AwaitHandler, EvalHandler, FunctionHandler, InvokeHandler};
pub use loops::{ControlFlowRootHandler, ForObjectHandler};
pub use operation::{BinaryHandler, ConditionalHandler, UnaryHandler};
pub use syntax::{ExpressionHandler, LiteralHandler, StatementHandler};

/// State shared by every handler kind
#[derive(Debug)]
pub struct HandlerBase<'s> {
    category: EventCategory,
    site: &'s CallSite,
    binding: Arc<Binding>,
}

impl<'s> HandlerBase<'s> {
    pub(crate) fn new(category: EventCategory, site: &'s CallSite, binding: Arc<Binding>) -> Self {
        Self {
            category,
            site,
            binding,
        }
    }

    pub fn category(&self) -> EventCategory {
        self.category
    }

    pub fn site(&self) -> &'s CallSite {
        self.site
    }

    pub fn source_id(&self) -> SourceId {
        self.site.source_id()
    }

    pub(crate) fn has_pre(&self) -> bool {
        self.binding.callbacks.pre().is_some()
    }

    pub(crate) fn has_post(&self) -> bool {
        self.binding.callbacks.post().is_some()
    }

    /// Call the pre callback if present; `args` is only evaluated after the check
    pub(crate) fn fire_pre<F, I>(&self, frame: &dyn ExecutionFrame, args: F) -> Result<()>
    where
        F: FnOnce() -> I,
        I: IntoIterator<Item = AnalysisValue>,
    {
        let Some(callback) = self.binding.callbacks.pre() else {
            return Ok(());
        };
        log::trace!(
            "pre {} at {} (execution {})",
            self.category,
            self.source_id(),
            frame.execution_id()
        );
        marshal::pre_call(
            self.category,
            self.binding.analysis.as_ref(),
            callback,
            self.source_id(),
            args(),
        )
    }

    /// Call the post callback if present; `args` is only evaluated after the check
    pub(crate) fn fire_post<F, I>(
        &self,
        frame: &dyn ExecutionFrame,
        result: &NativeValue,
        args: F,
    ) -> Result<()>
    where
        F: FnOnce() -> I,
        I: IntoIterator<Item = AnalysisValue>,
    {
        let Some(callback) = self.binding.callbacks.post() else {
            return Ok(());
        };
        log::trace!(
            "post {} at {} (execution {})",
            self.category,
            self.source_id(),
            frame.execution_id()
        );
        marshal::post_call(
            self.category,
            self.binding.analysis.as_ref(),
            callback,
            self.source_id(),
            args(),
            result,
        )
    }
}

/// A handler of any category
#[derive(Debug)]
pub enum EventHandler<'s> {
    Expression(ExpressionHandler<'s>),
    Statement(StatementHandler<'s>),
    ForObject(ForObjectHandler<'s>),
    Literal(LiteralHandler<'s>),
    Unary(UnaryHandler<'s>),
    Binary(BinaryHandler<'s>),
    Conditional(ConditionalHandler<'s>),
    Read(ReadHandler<'s>),
    Write(WriteHandler<'s>),
    GetField(GetFieldHandler<'s>),
    PutField(PutFieldHandler<'s>),
    Invoke(InvokeHandler<'s>),
    Eval(EvalHandler<'s>),
    Await(AwaitHandler<'s>),
    ControlFlowRoot(ControlFlowRootHandler<'s>),
    Function(FunctionHandler<'s>),
    Declare(DeclareHandler<'s>),
}

impl<'s> EventHandler<'s> {
    fn base(&self) -> &HandlerBase<'s> {
        match self {
            EventHandler::Expression(h) => &h.base,
            EventHandler::Statement(h) => &h.base,
            EventHandler::ForObject(h) => &h.base,
            EventHandler::Literal(h) => &h.base,
            EventHandler::Unary(h) => &h.base,
            EventHandler::Binary(h) => &h.base,
            EventHandler::Conditional(h) => &h.base,
            EventHandler::Read(h) => &h.base,
            EventHandler::Write(h) => &h.base,
            EventHandler::GetField(h) => &h.base,
            EventHandler::PutField(h) => &h.base,
            EventHandler::Invoke(h) => &h.base,
            EventHandler::Eval(h) => &h.base,
            EventHandler::Await(h) => &h.base,
            EventHandler::ControlFlowRoot(h) => &h.base,
            EventHandler::Function(h) => &h.base,
            EventHandler::Declare(h) => &h.base,
        }
    }

    pub fn category(&self) -> EventCategory {
        self.base().category()
    }

    pub fn source_id(&self) -> SourceId {
        self.base().source_id()
    }

    pub fn site(&self) -> &'s CallSite {
        self.base().site()
    }

    /// Entry point invoked by the host immediately before the operation executes
    pub fn before(&self, frame: &dyn ExecutionFrame, inputs: &[NativeValue]) -> Result<()> {
        match self {
            EventHandler::Expression(h) => h.before(frame, inputs),
            EventHandler::Statement(h) => h.before(frame, inputs),
            EventHandler::ForObject(h) => h.before(frame, inputs),
            EventHandler::Literal(_) => Ok(()),
            EventHandler::Unary(h) => h.before(frame, inputs),
            EventHandler::Binary(h) => h.before(frame, inputs),
            EventHandler::Conditional(_) => Ok(()),
            EventHandler::Read(_) => Ok(()),
            EventHandler::Write(_) => Ok(()),
            EventHandler::GetField(h) => h.before(frame, inputs),
            EventHandler::PutField(h) => h.before(frame, inputs),
            EventHandler::Invoke(h) => h.before(frame, inputs),
            EventHandler::Eval(h) => h.before(frame, inputs),
            EventHandler::Await(h) => h.before(frame, inputs),
            EventHandler::ControlFlowRoot(h) => h.before(frame, inputs),
            EventHandler::Function(h) => h.before(frame, inputs),
            EventHandler::Declare(h) => h.before(frame, inputs),
        }
    }

    /// Entry point invoked by the host immediately after the operation completes
    pub fn after(
        &self,
        frame: &dyn ExecutionFrame,
        result: &NativeValue,
        inputs: &[NativeValue],
    ) -> Result<()> {
        match self {
            EventHandler::Expression(h) => h.after(frame, result, inputs),
            EventHandler::Statement(h) => h.after(frame, result, inputs),
            EventHandler::ForObject(_) => Ok(()),
            EventHandler::Literal(h) => h.after(frame, result, inputs),
            EventHandler::Unary(h) => h.after(frame, result, inputs),
            EventHandler::Binary(h) => h.after(frame, result, inputs),
            EventHandler::Conditional(h) => h.after(frame, result, inputs),
            EventHandler::Read(h) => h.after(frame, result, inputs),
            EventHandler::Write(h) => h.after(frame, result, inputs),
            EventHandler::GetField(h) => h.after(frame, result, inputs),
            EventHandler::PutField(h) => h.after(frame, result, inputs),
            EventHandler::Invoke(h) => h.after(frame, result, inputs),
            EventHandler::Eval(h) => h.after(frame, result, inputs),
            EventHandler::Await(h) => h.after(frame, result, inputs),
            EventHandler::ControlFlowRoot(h) => h.after(frame, result, inputs),
            EventHandler::Function(h) => h.after(frame, result, inputs),
            EventHandler::Declare(h) => h.after(frame, result, inputs),
        }
    }

    /// True if neither entry point can ever reach the analysis
    pub fn is_inert(&self) -> bool {
        match self {
            EventHandler::ForObject(h) => !h.fires(),
            EventHandler::Literal(h) => !h.fires(),
            other => !other.base().has_pre() && !other.base().has_post(),
        }
    }
}
