//! Closed taxonomy of instrumentation event categories
//!
//! Each category fixes which callbacks it can carry and what its default
//! analysis hook names are.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which of the pre/post callbacks a category defines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallbackShape {
    PreOnly,
    PostOnly,
    PrePost,
}

impl CallbackShape {
    pub fn has_pre(self) -> bool {
        matches!(self, CallbackShape::PreOnly | CallbackShape::PrePost)
    }

    pub fn has_post(self) -> bool {
        matches!(self, CallbackShape::PostOnly | CallbackShape::PrePost)
    }
}

/// Syntactic event category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Expression,
    Statement,
    /// `for-in` / `for-of` loops
    ForObject,
    Literal,
    Unary,
    Binary,
    Conditional,
    Read,
    Write,
    GetField,
    PutField,
    Invoke,
    Eval,
    Await,
    /// Entry and exit of a branch or loop body (`if`, loops, `switch`, async bodies)
    ControlFlowRoot,
    /// Entry and exit of a function body
    Function,
    /// Variable, constant and function declarations
    Declare,
}

impl EventCategory {
    /// All categories, in declaration order
    pub const ALL: [EventCategory; 17] = [
        EventCategory::Expression,
        EventCategory::Statement,
        EventCategory::ForObject,
        EventCategory::Literal,
        EventCategory::Unary,
        EventCategory::Binary,
        EventCategory::Conditional,
        EventCategory::Read,
        EventCategory::Write,
        EventCategory::GetField,
        EventCategory::PutField,
        EventCategory::Invoke,
        EventCategory::Eval,
        EventCategory::Await,
        EventCategory::ControlFlowRoot,
        EventCategory::Function,
        EventCategory::Declare,
    ];

    /// Configuration name of the category
    pub fn name(self) -> &'static str {
        match self {
            EventCategory::Expression => "expression",
            EventCategory::Statement => "statement",
            EventCategory::ForObject => "for_object",
            EventCategory::Literal => "literal",
            EventCategory::Unary => "unary",
            EventCategory::Binary => "binary",
            EventCategory::Conditional => "conditional",
            EventCategory::Read => "read",
            EventCategory::Write => "write",
            EventCategory::GetField => "get_field",
            EventCategory::PutField => "put_field",
            EventCategory::Invoke => "invoke",
            EventCategory::Eval => "eval",
            EventCategory::Await => "await",
            EventCategory::ControlFlowRoot => "control_flow_root",
            EventCategory::Function => "function",
            EventCategory::Declare => "declare",
        }
    }

    pub fn shape(self) -> CallbackShape {
        match self {
            EventCategory::ForObject => CallbackShape::PreOnly,
            EventCategory::Literal
            | EventCategory::Conditional
            | EventCategory::Read
            | EventCategory::Write => CallbackShape::PostOnly,
            EventCategory::Expression
            | EventCategory::Statement
            | EventCategory::Unary
            | EventCategory::Binary
            | EventCategory::GetField
            | EventCategory::PutField
            | EventCategory::Invoke
            | EventCategory::Eval
            | EventCategory::Await
            | EventCategory::ControlFlowRoot
            | EventCategory::Function
            | EventCategory::Declare => CallbackShape::PrePost,
        }
    }

    /// Conventional analysis hook invoked before the event (if the shape has one)
    pub fn default_pre_hook(self) -> Option<&'static str> {
        match self {
            EventCategory::Expression => Some("startExpression"),
            EventCategory::Statement => Some("startStatement"),
            EventCategory::ForObject => Some("forObject"),
            EventCategory::Unary => Some("unaryPre"),
            EventCategory::Binary => Some("binaryPre"),
            EventCategory::GetField => Some("getFieldPre"),
            EventCategory::PutField => Some("putFieldPre"),
            EventCategory::Invoke => Some("invokeFunPre"),
            EventCategory::Eval => Some("evalPre"),
            EventCategory::Await => Some("awaitPre"),
            EventCategory::ControlFlowRoot => Some("controlFlowRootEnter"),
            EventCategory::Function => Some("functionEnter"),
            EventCategory::Declare => Some("declarePre"),
            EventCategory::Literal
            | EventCategory::Conditional
            | EventCategory::Read
            | EventCategory::Write => None,
        }
    }

    /// Conventional analysis hook invoked after the event (if the shape has one)
    pub fn default_post_hook(self) -> Option<&'static str> {
        match self {
            EventCategory::Expression => Some("endExpression"),
            EventCategory::Statement => Some("endStatement"),
            EventCategory::Literal => Some("literal"),
            EventCategory::Unary => Some("unary"),
            EventCategory::Binary => Some("binary"),
            EventCategory::Conditional => Some("conditional"),
            EventCategory::Read => Some("read"),
            EventCategory::Write => Some("write"),
            EventCategory::GetField => Some("getField"),
            EventCategory::PutField => Some("putField"),
            EventCategory::Invoke => Some("invokeFun"),
            EventCategory::Eval => Some("evalPost"),
            EventCategory::Await => Some("awaitPost"),
            EventCategory::ControlFlowRoot => Some("controlFlowRootExit"),
            EventCategory::Function => Some("functionExit"),
            EventCategory::Declare => Some("declare"),
            EventCategory::ForObject => None,
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown category name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown event category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for EventCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        EventCategory::ALL
            .into_iter()
            .find(|category| category.name() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_hooks_follow_shape() {
        for category in EventCategory::ALL {
            let shape = category.shape();
            assert_eq!(shape.has_pre(), category.default_pre_hook().is_some(), "{}", category);
            assert_eq!(shape.has_post(), category.default_post_hook().is_some(), "{}", category);
        }
    }

    #[test]
    fn test_category_names_round_trip() {
        for category in EventCategory::ALL {
            assert_eq!(category.name().parse::<EventCategory>(), Ok(category));
        }
        assert!("forObject".parse::<EventCategory>().is_err());
        assert_eq!(
            "control_flow_root".parse::<EventCategory>(),
            Ok(EventCategory::ControlFlowRoot)
        );
    }

    #[test]
    fn test_loop_category_is_pre_only() {
        assert_eq!(EventCategory::ForObject.shape(), CallbackShape::PreOnly);
        assert_eq!(EventCategory::ForObject.default_post_hook(), None);
    }
}
