//! Invoke, function, eval and await handlers

use super::HandlerBase;
use crate::marshal::{convert_input, convert_list};
use crate::site::ExecutionFrame;
use crate::types::{AnalysisValue, NativeValue, Result};

/// `invokeFunPre(iid, f, base, args, isConstructor)` / `invokeFun(iid, f, base, args, isConstructor, result)`
///
/// Inputs: `[receiver, function, args...]`.
#[derive(Debug)]
pub struct InvokeHandler<'s> {
    pub(super) base: HandlerBase<'s>,
    is_constructor: bool,
}

impl<'s> InvokeHandler<'s> {
    pub(crate) fn bind(base: HandlerBase<'s>) -> Result<Self> {
        let is_constructor = base.site().is_constructor(base.category())?;
        Ok(Self {
            base,
            is_constructor,
        })
    }

    pub fn is_constructor(&self) -> bool {
        self.is_constructor
    }

    fn args(&self, inputs: &[NativeValue]) -> [AnalysisValue; 4] {
        let arguments = inputs.get(2..).unwrap_or_default();
        [
            convert_input(inputs, 1),
            convert_input(inputs, 0),
            convert_list(arguments),
            AnalysisValue::Boolean(self.is_constructor),
        ]
    }

    pub fn before(&self, frame: &dyn ExecutionFrame, inputs: &[NativeValue]) -> Result<()> {
        self.base.fire_pre(frame, || self.args(inputs))
    }

    pub fn after(
        &self,
        frame: &dyn ExecutionFrame,
        result: &NativeValue,
        inputs: &[NativeValue],
    ) -> Result<()> {
        self.base.fire_post(frame, result, || self.args(inputs))
    }
}

/// `functionEnter(iid, f, this, args)` / `functionExit(iid, exception, returnValue)`
///
/// Inputs: `[function, receiver, args...]` on entry, `[exception]` on exit. A
/// normal return omits the exception, which reaches the analysis as `undefined`.
#[derive(Debug)]
pub struct FunctionHandler<'s> {
    pub(super) base: HandlerBase<'s>,
}

impl<'s> FunctionHandler<'s> {
    pub(crate) fn bind(base: HandlerBase<'s>) -> Result<Self> {
        Ok(Self { base })
    }

    pub fn before(&self, frame: &dyn ExecutionFrame, inputs: &[NativeValue]) -> Result<()> {
        self.base.fire_pre(frame, || {
            let arguments = inputs.get(2..).unwrap_or_default();
            [
                convert_input(inputs, 0),
                convert_input(inputs, 1),
                convert_list(arguments),
            ]
        })
    }

    pub fn after(
        &self,
        frame: &dyn ExecutionFrame,
        result: &NativeValue,
        inputs: &[NativeValue],
    ) -> Result<()> {
        self.base.fire_post(frame, result, || [convert_input(inputs, 0)])
    }
}

/// `evalPre(iid, code)` / `evalPost(iid, code, result)`
///
/// Inputs: `[code]`.
#[derive(Debug)]
pub struct EvalHandler<'s> {
    pub(super) base: HandlerBase<'s>,
}

impl<'s> EvalHandler<'s> {
    pub(crate) fn bind(base: HandlerBase<'s>) -> Result<Self> {
        Ok(Self { base })
    }

    pub fn before(&self, frame: &dyn ExecutionFrame, inputs: &[NativeValue]) -> Result<()> {
        self.base.fire_pre(frame, || [convert_input(inputs, 0)])
    }

    pub fn after(
        &self,
        frame: &dyn ExecutionFrame,
        result: &NativeValue,
        inputs: &[NativeValue],
    ) -> Result<()> {
        self.base.fire_post(frame, result, || [convert_input(inputs, 0)])
    }
}

/// `awaitPre(iid, awaited)` / `awaitPost(iid, awaited, result)`
///
/// Inputs: `[awaited]`.
#[derive(Debug)]
pub struct AwaitHandler<'s> {
    pub(super) base: HandlerBase<'s>,
}

impl<'s> AwaitHandler<'s> {
    pub(crate) fn bind(base: HandlerBase<'s>) -> Result<Self> {
        Ok(Self { base })
    }

    pub fn before(&self, frame: &dyn ExecutionFrame, inputs: &[NativeValue]) -> Result<()> {
        self.base.fire_pre(frame, || [convert_input(inputs, 0)])
    }

    pub fn after(
        &self,
        frame: &dyn ExecutionFrame,
        result: &NativeValue,
        inputs: &[NativeValue],
    ) -> Result<()> {
        self.base.fire_post(frame, result, || [convert_input(inputs, 0)])
    }
}
