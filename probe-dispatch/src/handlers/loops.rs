//! Loop and control-flow root handlers

use super::HandlerBase;
use crate::site::{ExecutionFrame, LoopKind};
use crate::marshal::convert_input;
use crate::types::{AnalysisValue, NativeValue, Result};

/// `forObject(iid, isForIn)`; pre only, fires for `for-in` and `for-of` loops
///
/// There is no post entry point: the category never carries a post callback.
#[derive(Debug)]
pub struct ForObjectHandler<'s> {
    pub(super) base: HandlerBase<'s>,
    loop_kind: LoopKind,
}

impl<'s> ForObjectHandler<'s> {
    pub(crate) fn bind(base: HandlerBase<'s>) -> Result<Self> {
        let loop_kind = base.site().loop_kind(base.category())?;
        Ok(Self { base, loop_kind })
    }

    pub fn loop_kind(&self) -> LoopKind {
        self.loop_kind
    }

    pub fn is_for_in(&self) -> bool {
        self.loop_kind == LoopKind::ForIn
    }

    pub fn is_for_of(&self) -> bool {
        self.loop_kind == LoopKind::ForOf
    }

    pub(super) fn fires(&self) -> bool {
        self.loop_kind.iterates_object() && self.base.has_pre()
    }

    pub fn before(&self, frame: &dyn ExecutionFrame, _inputs: &[NativeValue]) -> Result<()> {
        if !self.loop_kind.iterates_object() {
            return Ok(());
        }
        self.base
            .fire_pre(frame, || [AnalysisValue::Boolean(self.is_for_in())])
    }
}

/// `controlFlowRootEnter(iid, blockType, condition)` / `controlFlowRootExit(iid, blockType, result)`
///
/// Inputs: `[condition]` on entry; roots without a condition omit it.
#[derive(Debug)]
pub struct ControlFlowRootHandler<'s> {
    pub(super) base: HandlerBase<'s>,
    block_type: &'s str,
}

impl<'s> ControlFlowRootHandler<'s> {
    pub(crate) fn bind(base: HandlerBase<'s>) -> Result<Self> {
        let block_type = base.site().block_type(base.category())?;
        Ok(Self { base, block_type })
    }

    pub fn block_type(&self) -> &'s str {
        self.block_type
    }

    pub fn before(&self, frame: &dyn ExecutionFrame, inputs: &[NativeValue]) -> Result<()> {
        self.base.fire_pre(frame, || {
            [AnalysisValue::from(self.block_type), convert_input(inputs, 0)]
        })
    }

    pub fn after(
        &self,
        frame: &dyn ExecutionFrame,
        result: &NativeValue,
        _inputs: &[NativeValue],
    ) -> Result<()> {
        self.base
            .fire_post(frame, result, || [AnalysisValue::from(self.block_type)])
    }
}
