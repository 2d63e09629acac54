//! Host-supplied call-site context and execution frames
//!
//! A [`CallSite`] is created by the host runtime once per static occurrence and
//! outlives every handler bound to it. Handlers only borrow it.

use crate::category::EventCategory;
use crate::types::{DispatchError, Result, SourceId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Source range of an occurrence
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSection {
    pub file: String,
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl fmt::Display for SourceSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}:{}:{}:{}:{})",
            self.file, self.start_line, self.start_column, self.end_line, self.end_column
        )
    }
}

/// Concrete kind of a loop occurrence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopKind {
    For,
    While,
    DoWhile,
    ForIn,
    ForOf,
}

impl LoopKind {
    /// True for loops that enumerate object properties or iterable values
    pub fn iterates_object(self) -> bool {
        matches!(self, LoopKind::ForIn | LoopKind::ForOf)
    }
}

/// Syntactic kind of a literal occurrence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LiteralType {
    ObjectLiteral,
    ArrayLiteral,
    FunctionLiteral,
    NumericLiteral,
    BooleanLiteral,
    StringLiteral,
    NullLiteral,
    UndefinedLiteral,
    RegExpLiteral,
}

impl LiteralType {
    pub fn name(self) -> &'static str {
        match self {
            LiteralType::ObjectLiteral => "ObjectLiteral",
            LiteralType::ArrayLiteral => "ArrayLiteral",
            LiteralType::FunctionLiteral => "FunctionLiteral",
            LiteralType::NumericLiteral => "NumericLiteral",
            LiteralType::BooleanLiteral => "BooleanLiteral",
            LiteralType::StringLiteral => "StringLiteral",
            LiteralType::NullLiteral => "NullLiteral",
            LiteralType::UndefinedLiteral => "UndefinedLiteral",
            LiteralType::RegExpLiteral => "RegExpLiteral",
        }
    }
}

/// Binding form of a declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationType {
    Var,
    Let,
    Const,
}

impl DeclarationType {
    pub fn name(self) -> &'static str {
        match self {
            DeclarationType::Var => "var",
            DeclarationType::Let => "let",
            DeclarationType::Const => "const",
        }
    }
}

/// Category-specific metadata the host records for an occurrence
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SiteDetail {
    #[default]
    None,
    /// Host AST node type of an expression or statement
    Node { node_type: String },
    Loop { loop_kind: LoopKind },
    Literal { literal_type: LiteralType },
    Operator { operator: String },
    Variable {
        name: String,
        #[serde(default)]
        is_global: bool,
    },
    /// `key` is `None` for computed (element) accesses
    Property {
        #[serde(default)]
        key: Option<String>,
    },
    Invoke {
        #[serde(default)]
        is_constructor: bool,
    },
    /// Host name of a control-flow root, e.g. `ForInIteration` or `Conditional`
    ControlFlow { block_type: String },
    Declaration {
        name: String,
        declaration_type: DeclarationType,
        /// `FunctionDeclaration` for hoisted functions
        #[serde(default)]
        declaration_kind: Option<String>,
    },
}

/// Per-occurrence context supplied by the host runtime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallSite {
    source_id: SourceId,
    #[serde(default)]
    section: Option<SourceSection>,
    #[serde(default)]
    detail: SiteDetail,
}

impl CallSite {
    /// Create a context for an occurrence with no extra metadata
    pub fn new(source_id: SourceId) -> Self {
        Self {
            source_id,
            section: None,
            detail: SiteDetail::None,
        }
    }

    /// Builder method: attach the source range
    pub fn with_section(mut self, section: SourceSection) -> Self {
        self.section = Some(section);
        self
    }

    /// Builder method: attach category-specific metadata
    pub fn with_detail(mut self, detail: SiteDetail) -> Self {
        self.detail = detail;
        self
    }

    pub fn source_id(&self) -> SourceId {
        self.source_id
    }

    pub fn section(&self) -> Option<&SourceSection> {
        self.section.as_ref()
    }

    pub fn detail(&self) -> &SiteDetail {
        &self.detail
    }

    fn malformed(&self, category: EventCategory, expected: &'static str) -> DispatchError {
        DispatchError::MalformedSite {
            category,
            source_id: self.source_id,
            expected,
        }
    }

    pub(crate) fn node_type(&self, category: EventCategory) -> Result<&str> {
        match &self.detail {
            SiteDetail::Node { node_type } => Ok(node_type),
            _ => Err(self.malformed(category, "node type")),
        }
    }

    pub(crate) fn loop_kind(&self, category: EventCategory) -> Result<LoopKind> {
        match &self.detail {
            SiteDetail::Loop { loop_kind } => Ok(*loop_kind),
            _ => Err(self.malformed(category, "loop kind")),
        }
    }

    pub(crate) fn literal_type(&self, category: EventCategory) -> Result<LiteralType> {
        match &self.detail {
            SiteDetail::Literal { literal_type } => Ok(*literal_type),
            _ => Err(self.malformed(category, "literal type")),
        }
    }

    pub(crate) fn operator(&self, category: EventCategory) -> Result<&str> {
        match &self.detail {
            SiteDetail::Operator { operator } => Ok(operator),
            _ => Err(self.malformed(category, "operator")),
        }
    }

    pub(crate) fn variable(&self, category: EventCategory) -> Result<(&str, bool)> {
        match &self.detail {
            SiteDetail::Variable { name, is_global } => Ok((name, *is_global)),
            _ => Err(self.malformed(category, "variable")),
        }
    }

    pub(crate) fn property_key(&self, category: EventCategory) -> Result<Option<&str>> {
        match &self.detail {
            SiteDetail::Property { key } => Ok(key.as_deref()),
            _ => Err(self.malformed(category, "property")),
        }
    }

    pub(crate) fn is_constructor(&self, category: EventCategory) -> Result<bool> {
        match &self.detail {
            SiteDetail::Invoke { is_constructor } => Ok(*is_constructor),
            _ => Err(self.malformed(category, "invoke")),
        }
    }

    pub(crate) fn block_type(&self, category: EventCategory) -> Result<&str> {
        match &self.detail {
            SiteDetail::ControlFlow { block_type } => Ok(block_type),
            _ => Err(self.malformed(category, "block type")),
        }
    }

    pub(crate) fn declaration(
        &self,
        category: EventCategory,
    ) -> Result<(&str, DeclarationType, Option<&str>)> {
        match &self.detail {
            SiteDetail::Declaration {
                name,
                declaration_type,
                declaration_kind,
            } => Ok((name, *declaration_type, declaration_kind.as_deref())),
            _ => Err(self.malformed(category, "declaration")),
        }
    }
}

/// Opaque host handle on the execution state of one dynamic execution
///
/// Handlers only read it for the duration of a single entry-point call.
pub trait ExecutionFrame {
    /// Identifier distinguishing concurrent dynamic executions of the same occurrence
    fn execution_id(&self) -> u64;
}

/// Minimal frame carrying only an execution id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameId(pub u64);

impl ExecutionFrame for FrameId {
    fn execution_id(&self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_site_builder() {
        let site = CallSite::new(SourceId(9))
            .with_section(SourceSection {
                file: "index.js".to_string(),
                start_line: 3,
                start_column: 1,
                end_line: 3,
                end_column: 12,
            })
            .with_detail(SiteDetail::Loop {
                loop_kind: LoopKind::ForOf,
            });

        assert_eq!(site.source_id(), SourceId(9));
        assert_eq!(site.section().map(|s| s.to_string()).as_deref(), Some("(index.js:3:1:3:12)"));
        assert_eq!(site.loop_kind(EventCategory::ForObject).unwrap(), LoopKind::ForOf);
    }

    #[test]
    fn test_missing_metadata_is_reported() {
        let site = CallSite::new(SourceId(5));
        let err = site.node_type(EventCategory::Expression).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::MalformedSite { source_id: SourceId(5), expected: "node type", .. }
        ));
    }

    #[test]
    fn test_loop_kinds() {
        assert!(LoopKind::ForIn.iterates_object());
        assert!(LoopKind::ForOf.iterates_object());
        assert!(!LoopKind::For.iterates_object());
        assert!(!LoopKind::While.iterates_object());
        assert!(!LoopKind::DoWhile.iterates_object());
    }

    #[test]
    fn test_site_detail_json_shape() {
        let detail: SiteDetail =
            serde_json::from_str(r#"{"kind":"variable","name":"x"}"#).unwrap();
        assert_eq!(
            detail,
            SiteDetail::Variable {
                name: "x".to_string(),
                is_global: false
            }
        );

        let detail: SiteDetail = serde_json::from_str(
            r#"{"kind":"declaration","name":"f","declaration_type":"var","declaration_kind":"FunctionDeclaration"}"#,
        )
        .unwrap();
        let site = CallSite::new(SourceId(3)).with_detail(detail);
        assert_eq!(
            site.declaration(EventCategory::Declare).unwrap(),
            ("f", DeclarationType::Var, Some("FunctionDeclaration"))
        );
    }
}
