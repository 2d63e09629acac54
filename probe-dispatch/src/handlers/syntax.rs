//! Expression, statement and literal handlers

use super::HandlerBase;
use crate::site::{ExecutionFrame, LiteralType};
use crate::types::{AnalysisValue, NativeValue, Result};

/// Handler for node-typed categories: `(iid, type)` before, `(iid, type, result)` after
macro_rules! node_handler {
    ($(#[$doc:meta])* $handler:ident, $accessor:ident) => {
        $(#[$doc])*
        #[derive(Debug)]
        pub struct $handler<'s> {
            pub(super) base: HandlerBase<'s>,
            node_type: &'s str,
        }

        impl<'s> $handler<'s> {
            pub(crate) fn bind(base: HandlerBase<'s>) -> Result<Self> {
                let node_type = base.site().node_type(base.category())?;
                Ok(Self { base, node_type })
            }

            pub fn $accessor(&self) -> &'s str {
                self.node_type
            }

            pub fn before(&self, frame: &dyn ExecutionFrame, _inputs: &[NativeValue]) -> Result<()> {
                self.base
                    .fire_pre(frame, || [AnalysisValue::from(self.node_type)])
            }

            pub fn after(
                &self,
                frame: &dyn ExecutionFrame,
                result: &NativeValue,
                _inputs: &[NativeValue],
            ) -> Result<()> {
                self.base
                    .fire_post(frame, result, || [AnalysisValue::from(self.node_type)])
            }
        }
    };
}

node_handler!(
    /// `startExpression(iid, type)` / `endExpression(iid, type, result)`
    ExpressionHandler,
    expression_type
);
node_handler!(
    /// `startStatement(iid, type)` / `endStatement(iid, type, result)`
    StatementHandler,
    statement_type
);

/// `literal(iid, literalType, val)`; post only
#[derive(Debug)]
pub struct LiteralHandler<'s> {
    pub(super) base: HandlerBase<'s>,
    literal_type: LiteralType,
    admitted: bool,
}

impl<'s> LiteralHandler<'s> {
    /// `filter` of `None` admits every literal type
    pub(crate) fn bind(base: HandlerBase<'s>, filter: Option<&[LiteralType]>) -> Result<Self> {
        let literal_type = base.site().literal_type(base.category())?;
        let admitted = filter.map_or(true, |types| types.contains(&literal_type));
        Ok(Self {
            base,
            literal_type,
            admitted,
        })
    }

    pub fn literal_type(&self) -> LiteralType {
        self.literal_type
    }

    pub(super) fn fires(&self) -> bool {
        self.admitted && self.base.has_post()
    }

    pub fn after(
        &self,
        frame: &dyn ExecutionFrame,
        result: &NativeValue,
        _inputs: &[NativeValue],
    ) -> Result<()> {
        if !self.admitted {
            return Ok(());
        }
        self.base.fire_post(frame, result, || {
            [AnalysisValue::from(self.literal_type.name())]
        })
    }
}
