//! Registration: turns configured hook names into factories

use crate::config::{AppConfig, ConfigError};
use probe_dispatch::{
    AnalysisModule, AwaitFactory, BinaryFactory, Callback, ConditionalFactory,
    ControlFlowRootFactory, DeclareFactory, EvalFactory, EventCategory, ExpressionFactory,
    Factory, ForObjectFactory, FunctionFactory, GetFieldFactory, InvokeFactory, LiteralFactory,
    LiteralType, PutFieldFactory, ReadFactory, StatementFactory, UnaryFactory, WriteFactory,
};
use std::sync::Arc;

/// Build one factory per category that ends up with at least one callback
///
/// Explicitly named hooks must resolve; conventional hooks picked up through
/// `bind_defaults` are simply absent when the library does not export them.
pub fn build_factories<R>(
    config: &AppConfig,
    analysis: Arc<dyn AnalysisModule>,
    resolve: R,
) -> Result<Vec<Factory>, ConfigError>
where
    R: Fn(&str) -> Option<Callback>,
{
    let explicit = |category: EventCategory, hook: Option<&String>| {
        hook.map(|name| {
            resolve(name.as_str()).ok_or_else(|| ConfigError::MissingHook {
                category,
                hook: name.clone(),
            })
        })
        .transpose()
    };

    let mut factories = Vec::new();
    for category in EventCategory::ALL {
        let (pre, post, literal_types) = match config.binding(category) {
            Some(binding) => (
                explicit(category, binding.pre.as_ref())?,
                explicit(category, binding.post.as_ref())?,
                binding.literal_types.as_deref(),
            ),
            None if config.analysis.bind_defaults => (
                category.default_pre_hook().and_then(&resolve),
                category.default_post_hook().and_then(&resolve),
                None,
            ),
            None => continue,
        };

        if pre.is_none() && post.is_none() {
            log::debug!("No callbacks for {}, skipping registration", category);
            continue;
        }
        factories.push(make_factory(category, Arc::clone(&analysis), pre, post, literal_types));
    }

    log::info!(
        "Registered {} factories for analysis {}",
        factories.len(),
        analysis.name()
    );
    Ok(factories)
}

/// Callbacks outside the category's shape have already been rejected by validation
fn make_factory(
    category: EventCategory,
    analysis: Arc<dyn AnalysisModule>,
    pre: Option<Callback>,
    post: Option<Callback>,
    literal_types: Option<&[LiteralType]>,
) -> Factory {
    match category {
        EventCategory::Expression => ExpressionFactory::new(analysis, pre, post).into(),
        EventCategory::Statement => StatementFactory::new(analysis, pre, post).into(),
        EventCategory::ForObject => ForObjectFactory::new(analysis, pre).into(),
        EventCategory::Literal => {
            let factory = LiteralFactory::new(analysis, post);
            match literal_types {
                Some(types) => factory.with_type_filter(types.iter().copied()).into(),
                None => factory.into(),
            }
        }
        EventCategory::Unary => UnaryFactory::new(analysis, pre, post).into(),
        EventCategory::Binary => BinaryFactory::new(analysis, pre, post).into(),
        EventCategory::Conditional => ConditionalFactory::new(analysis, post).into(),
        EventCategory::Read => ReadFactory::new(analysis, post).into(),
        EventCategory::Write => WriteFactory::new(analysis, post).into(),
        EventCategory::GetField => GetFieldFactory::new(analysis, pre, post).into(),
        EventCategory::PutField => PutFieldFactory::new(analysis, pre, post).into(),
        EventCategory::Invoke => InvokeFactory::new(analysis, pre, post).into(),
        EventCategory::Eval => EvalFactory::new(analysis, pre, post).into(),
        EventCategory::Await => AwaitFactory::new(analysis, pre, post).into(),
        EventCategory::ControlFlowRoot => {
            ControlFlowRootFactory::new(analysis, pre, post).into()
        }
        EventCategory::Function => FunctionFactory::new(analysis, pre, post).into(),
        EventCategory::Declare => DeclareFactory::new(analysis, pre, post).into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AnalysisConfig, BindingConfig};
    use std::any::Any;
    use std::path::PathBuf;

    struct Stub;

    impl AnalysisModule for Stub {
        fn name(&self) -> &str {
            "stub"
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn config(bind_defaults: bool, bindings: Vec<BindingConfig>) -> AppConfig {
        AppConfig {
            analysis: AnalysisConfig {
                library: PathBuf::from("libstub.so"),
                name: None,
                bind_defaults,
            },
            bindings,
        }
    }

    /// Resolver exporting only the given hook names
    fn exports(names: &'static [&'static str]) -> impl Fn(&str) -> Option<Callback> {
        move |name: &str| {
            names
                .contains(&name)
                .then(|| Callback::new(name.to_string(), |_, _| Ok(())))
        }
    }

    #[test]
    fn test_defaults_bind_only_exported_hooks() {
        let factories = build_factories(
            &config(true, Vec::new()),
            Arc::new(Stub),
            exports(&["startExpression", "forObject", "literal", "controlFlowRootExit"]),
        )
        .unwrap();

        let categories: Vec<EventCategory> = factories.iter().map(Factory::category).collect();
        assert_eq!(
            categories,
            vec![
                EventCategory::Expression,
                EventCategory::ForObject,
                EventCategory::Literal,
                EventCategory::ControlFlowRoot
            ]
        );
    }

    #[test]
    fn test_explicit_binding_overrides_defaults() {
        let bindings = vec![BindingConfig {
            category: EventCategory::Binary,
            pre: Some("onBinary".to_string()),
            post: None,
            literal_types: None,
        }];
        let factories = build_factories(
            &config(true, bindings),
            Arc::new(Stub),
            exports(&["onBinary", "binaryPre", "binary", "startExpression"]),
        )
        .unwrap();

        assert_eq!(factories.len(), 2);
        assert_eq!(factories[0].category(), EventCategory::Expression);
        assert_eq!(factories[1].category(), EventCategory::Binary);
        let binary = format!("{:?}", factories[1]);
        assert!(binary.contains("onBinary"));
        assert!(!binary.contains("binaryPre"));
    }

    #[test]
    fn test_nothing_bound_without_defaults() {
        let factories = build_factories(
            &config(false, Vec::new()),
            Arc::new(Stub),
            exports(&["startExpression"]),
        )
        .unwrap();
        assert!(factories.is_empty());
    }

    #[test]
    fn test_missing_explicit_hook_is_an_error() {
        let bindings = vec![BindingConfig {
            category: EventCategory::Read,
            pre: None,
            post: Some("onRead".to_string()),
            literal_types: None,
        }];
        let err = build_factories(&config(false, bindings), Arc::new(Stub), exports(&[]))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::MissingHook {
                category: EventCategory::Read,
                hook: "onRead".to_string()
            }
        );
    }
}
