//! Unary, binary and conditional handlers

use super::HandlerBase;
use crate::marshal::convert_input;
use crate::site::ExecutionFrame;
use crate::types::{AnalysisValue, NativeValue, Result};

/// `unaryPre(iid, op, operand)` / `unary(iid, op, operand, result)`
///
/// Inputs: `[operand]`.
#[derive(Debug)]
pub struct UnaryHandler<'s> {
    pub(super) base: HandlerBase<'s>,
    operator: &'s str,
}

impl<'s> UnaryHandler<'s> {
    pub(crate) fn bind(base: HandlerBase<'s>) -> Result<Self> {
        let operator = base.site().operator(base.category())?;
        Ok(Self { base, operator })
    }

    pub fn operator(&self) -> &'s str {
        self.operator
    }

    fn args(&self, inputs: &[NativeValue]) -> [AnalysisValue; 2] {
        [AnalysisValue::from(self.operator), convert_input(inputs, 0)]
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

/// `binaryPre(iid, op, left, right)` / `binary(iid, op, left, right, result)`
///
/// Inputs: `[left, right]`.
#[derive(Debug)]
pub struct BinaryHandler<'s> {
    pub(super) base: HandlerBase<'s>,
    operator: &'s str,
}

impl<'s> BinaryHandler<'s> {
    pub(crate) fn bind(base: HandlerBase<'s>) -> Result<Self> {
        let operator = base.site().operator(base.category())?;
        Ok(Self { base, operator })
    }

    pub fn operator(&self) -> &'s str {
        self.operator
    }

    fn args(&self, inputs: &[NativeValue]) -> [AnalysisValue; 3] {
        [
            AnalysisValue::from(self.operator),
            convert_input(inputs, 0),
            convert_input(inputs, 1),
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

/// `conditional(iid, result)`; post only
#[derive(Debug)]
pub struct ConditionalHandler<'s> {
    pub(super) base: HandlerBase<'s>,
}

impl<'s> ConditionalHandler<'s> {
    pub(crate) fn bind(base: HandlerBase<'s>) -> Result<Self> {
        Ok(Self { base })
    }

    pub fn after(
        &self,
        frame: &dyn ExecutionFrame,
        result: &NativeValue,
        _inputs: &[NativeValue],
    ) -> Result<()> {
        self.base.fire_post(frame, result, || [])
    }
}
