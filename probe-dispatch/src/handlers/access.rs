//! Declaration, variable and property access handlers

use super::HandlerBase;
use crate::marshal::convert_input;
use crate::site::{DeclarationType, ExecutionFrame};
use crate::types::{AnalysisValue, NativeValue, Result};

/// `declarePre(iid, name, type, kind)` / `declare(iid, name, type, kind, result)`
///
/// `kind` is `undefined` unless the host recorded one (e.g. `FunctionDeclaration`).
#[derive(Debug)]
pub struct DeclareHandler<'s> {
    pub(super) base: HandlerBase<'s>,
    name: &'s str,
    declaration_type: DeclarationType,
    kind: Option<&'s str>,
}

impl<'s> DeclareHandler<'s> {
    pub(crate) fn bind(base: HandlerBase<'s>) -> Result<Self> {
        let (name, declaration_type, kind) = base.site().declaration(base.category())?;
        Ok(Self {
            base,
            name,
            declaration_type,
            kind,
        })
    }

    pub fn name(&self) -> &'s str {
        self.name
    }

    pub fn declaration_type(&self) -> DeclarationType {
        self.declaration_type
    }

    fn args(&self) -> [AnalysisValue; 3] {
        [
            AnalysisValue::from(self.name),
            AnalysisValue::from(self.declaration_type.name()),
            self.kind
                .map(AnalysisValue::from)
                .unwrap_or(AnalysisValue::Undefined),
        ]
    }

    pub fn before(&self, frame: &dyn ExecutionFrame, _inputs: &[NativeValue]) -> Result<()> {
        self.base.fire_pre(frame, || self.args())
    }

    pub fn after(
        &self,
        frame: &dyn ExecutionFrame,
        result: &NativeValue,
        _inputs: &[NativeValue],
    ) -> Result<()> {
        self.base.fire_post(frame, result, || self.args())
    }
}

/// `read(iid, name, isGlobal, val)`; post only
#[derive(Debug)]
pub struct ReadHandler<'s> {
    pub(super) base: HandlerBase<'s>,
    name: &'s str,
    is_global: bool,
}

impl<'s> ReadHandler<'s> {
    pub(crate) fn bind(base: HandlerBase<'s>) -> Result<Self> {
        let (name, is_global) = base.site().variable(base.category())?;
        Ok(Self {
            base,
            name,
            is_global,
        })
    }

    pub fn name(&self) -> &'s str {
        self.name
    }

    pub fn after(
        &self,
        frame: &dyn ExecutionFrame,
        result: &NativeValue,
        _inputs: &[NativeValue],
    ) -> Result<()> {
        self.base.fire_post(frame, result, || {
            [AnalysisValue::from(self.name), AnalysisValue::Boolean(self.is_global)]
        })
    }
}

/// `write(iid, name, isGlobal, val)`; post only, `result` is the written value
#[derive(Debug)]
pub struct WriteHandler<'s> {
    pub(super) base: HandlerBase<'s>,
    name: &'s str,
    is_global: bool,
}

impl<'s> WriteHandler<'s> {
    pub(crate) fn bind(base: HandlerBase<'s>) -> Result<Self> {
        let (name, is_global) = base.site().variable(base.category())?;
        Ok(Self {
            base,
            name,
            is_global,
        })
    }

    pub fn name(&self) -> &'s str {
        self.name
    }

    pub fn after(
        &self,
        frame: &dyn ExecutionFrame,
        result: &NativeValue,
        _inputs: &[NativeValue],
    ) -> Result<()> {
        self.base.fire_post(frame, result, || {
            [AnalysisValue::from(self.name), AnalysisValue::Boolean(self.is_global)]
        })
    }
}

/// Resolve the property offset: the static key, or the computed key input
fn offset(key: Option<&str>, inputs: &[NativeValue]) -> AnalysisValue {
    match key {
        Some(key) => AnalysisValue::from(key),
        None => convert_input(inputs, 1),
    }
}

/// `getFieldPre(iid, base, offset, isComputed)` / `getField(iid, base, offset, isComputed, val)`
///
/// Inputs: `[base]` for named accesses, `[base, key]` for computed ones.
#[derive(Debug)]
pub struct GetFieldHandler<'s> {
    pub(super) base: HandlerBase<'s>,
    key: Option<&'s str>,
}

impl<'s> GetFieldHandler<'s> {
    pub(crate) fn bind(base: HandlerBase<'s>) -> Result<Self> {
        let key = base.site().property_key(base.category())?;
        Ok(Self { base, key })
    }

    pub fn is_computed(&self) -> bool {
        self.key.is_none()
    }

    fn args(&self, inputs: &[NativeValue]) -> [AnalysisValue; 3] {
        [
            convert_input(inputs, 0),
            offset(self.key, inputs),
            AnalysisValue::Boolean(self.is_computed()),
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

/// `putFieldPre(iid, base, offset, val, isComputed)` / `putField(iid, base, offset, val, isComputed, result)`
///
/// Inputs: `[base, value]` for named writes, `[base, key, value]` for computed ones.
#[derive(Debug)]
pub struct PutFieldHandler<'s> {
    pub(super) base: HandlerBase<'s>,
    key: Option<&'s str>,
}

impl<'s> PutFieldHandler<'s> {
    pub(crate) fn bind(base: HandlerBase<'s>) -> Result<Self> {
        let key = base.site().property_key(base.category())?;
        Ok(Self { base, key })
    }

    pub fn is_computed(&self) -> bool {
        self.key.is_none()
    }

    fn args(&self, inputs: &[NativeValue]) -> [AnalysisValue; 4] {
        let value_index = if self.is_computed() { 2 } else { 1 };
        [
            convert_input(inputs, 0),
            offset(self.key, inputs),
            convert_input(inputs, value_index),
            AnalysisValue::Boolean(self.is_computed()),
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
