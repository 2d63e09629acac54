//! Handler factories, one kind per event category
//!
//! A factory is built once when an analysis session registers a category and
//! produces one handler per occurrence the host discovers. Constructors only accept
//! the callbacks the category's shape defines: a loop factory has no post callback
//! parameter, a literal factory no pre callback parameter.

use crate::callback::{AnalysisModule, Binding, Callback, CallbackPair};
use crate::category::EventCategory;
use crate::handlers::{
    AwaitHandler, BinaryHandler, ConditionalHandler, ControlFlowRootHandler, DeclareHandler,
    EvalHandler, EventHandler, ExpressionHandler, ForObjectHandler, FunctionHandler,
    GetFieldHandler, HandlerBase, InvokeHandler, LiteralHandler, PutFieldHandler, ReadHandler,
    StatementHandler, UnaryHandler, WriteHandler,
};
use crate::site::{CallSite, LiteralType};
use crate::types::Result;
use std::sync::Arc;

fn bind(
    category: EventCategory,
    analysis: Arc<dyn AnalysisModule>,
    callbacks: CallbackPair,
) -> Arc<Binding> {
    log::debug!(
        "Registering {} factory for analysis {} (pre: {:?}, post: {:?})",
        category,
        analysis.name(),
        callbacks.pre().map(Callback::name),
        callbacks.post().map(Callback::name),
    );
    Binding::new(analysis, callbacks)
}

fn base<'s>(category: EventCategory, site: &'s CallSite, binding: &Arc<Binding>) -> HandlerBase<'s> {
    log::trace!("Creating {} handler for source {}", category, site.source_id());
    HandlerBase::new(category, site, Arc::clone(binding))
}

/// Factory for categories with both a pre and a post callback
macro_rules! pre_post_factory {
    ($(#[$doc:meta])* $factory:ident, $handler:ident, $category:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone)]
        pub struct $factory {
            binding: Arc<Binding>,
        }

        impl $factory {
            pub fn new(
                analysis: Arc<dyn AnalysisModule>,
                pre: Option<Callback>,
                post: Option<Callback>,
            ) -> Self {
                Self {
                    binding: bind($category, analysis, CallbackPair::new(pre, post)),
                }
            }

            pub fn create<'s>(&self, site: &'s CallSite) -> Result<$handler<'s>> {
                $handler::bind(base($category, site, &self.binding))
            }
        }
    };
}

/// Factory for categories with only a post callback
macro_rules! post_only_factory {
    ($(#[$doc:meta])* $factory:ident, $handler:ident, $category:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone)]
        pub struct $factory {
            binding: Arc<Binding>,
        }

        impl $factory {
            pub fn new(analysis: Arc<dyn AnalysisModule>, post: Option<Callback>) -> Self {
                Self {
                    binding: bind($category, analysis, CallbackPair::post_only(post)),
                }
            }

            pub fn create<'s>(&self, site: &'s CallSite) -> Result<$handler<'s>> {
                $handler::bind(base($category, site, &self.binding))
            }
        }
    };
}

pre_post_factory!(ExpressionFactory, ExpressionHandler, EventCategory::Expression);
pre_post_factory!(StatementFactory, StatementHandler, EventCategory::Statement);
pre_post_factory!(UnaryFactory, UnaryHandler, EventCategory::Unary);
pre_post_factory!(BinaryFactory, BinaryHandler, EventCategory::Binary);
pre_post_factory!(GetFieldFactory, GetFieldHandler, EventCategory::GetField);
pre_post_factory!(PutFieldFactory, PutFieldHandler, EventCategory::PutField);
pre_post_factory!(InvokeFactory, InvokeHandler, EventCategory::Invoke);
pre_post_factory!(EvalFactory, EvalHandler, EventCategory::Eval);
pre_post_factory!(AwaitFactory, AwaitHandler, EventCategory::Await);
pre_post_factory!(
    ControlFlowRootFactory,
    ControlFlowRootHandler,
    EventCategory::ControlFlowRoot
);
pre_post_factory!(FunctionFactory, FunctionHandler, EventCategory::Function);
pre_post_factory!(DeclareFactory, DeclareHandler, EventCategory::Declare);

post_only_factory!(ConditionalFactory, ConditionalHandler, EventCategory::Conditional);
post_only_factory!(ReadFactory, ReadHandler, EventCategory::Read);
post_only_factory!(WriteFactory, WriteHandler, EventCategory::Write);

/// Factory for `for-in` / `for-of` loops; pre callback only
#[derive(Debug, Clone)]
pub struct ForObjectFactory {
    binding: Arc<Binding>,
}

impl ForObjectFactory {
    pub fn new(analysis: Arc<dyn AnalysisModule>, pre: Option<Callback>) -> Self {
        Self {
            binding: bind(EventCategory::ForObject, analysis, CallbackPair::pre_only(pre)),
        }
    }

    pub fn create<'s>(&self, site: &'s CallSite) -> Result<ForObjectHandler<'s>> {
        ForObjectHandler::bind(base(EventCategory::ForObject, site, &self.binding))
    }
}

/// Factory for literals; post callback only, with an optional literal type filter
#[derive(Debug, Clone)]
pub struct LiteralFactory {
    binding: Arc<Binding>,
    type_filter: Option<Arc<[LiteralType]>>,
}

impl LiteralFactory {
    pub fn new(analysis: Arc<dyn AnalysisModule>, post: Option<Callback>) -> Self {
        Self {
            binding: bind(EventCategory::Literal, analysis, CallbackPair::post_only(post)),
            type_filter: None,
        }
    }

    /// Builder method: only literals of these types fire
    pub fn with_type_filter(mut self, types: impl IntoIterator<Item = LiteralType>) -> Self {
        self.type_filter = Some(types.into_iter().collect());
        self
    }

    pub fn create<'s>(&self, site: &'s CallSite) -> Result<LiteralHandler<'s>> {
        LiteralHandler::bind(
            base(EventCategory::Literal, site, &self.binding),
            self.type_filter.as_deref(),
        )
    }
}

/// A factory of any category
#[derive(Debug, Clone)]
pub enum Factory {
    Expression(ExpressionFactory),
    Statement(StatementFactory),
    ForObject(ForObjectFactory),
    Literal(LiteralFactory),
    Unary(UnaryFactory),
    Binary(BinaryFactory),
    Conditional(ConditionalFactory),
    Read(ReadFactory),
    Write(WriteFactory),
    GetField(GetFieldFactory),
    PutField(PutFieldFactory),
    Invoke(InvokeFactory),
    Eval(EvalFactory),
    Await(AwaitFactory),
    ControlFlowRoot(ControlFlowRootFactory),
    Function(FunctionFactory),
    Declare(DeclareFactory),
}

impl Factory {
    pub fn category(&self) -> EventCategory {
        match self {
            Factory::Expression(_) => EventCategory::Expression,
            Factory::Statement(_) => EventCategory::Statement,
            Factory::ForObject(_) => EventCategory::ForObject,
            Factory::Literal(_) => EventCategory::Literal,
            Factory::Unary(_) => EventCategory::Unary,
            Factory::Binary(_) => EventCategory::Binary,
            Factory::Conditional(_) => EventCategory::Conditional,
            Factory::Read(_) => EventCategory::Read,
            Factory::Write(_) => EventCategory::Write,
            Factory::GetField(_) => EventCategory::GetField,
            Factory::PutField(_) => EventCategory::PutField,
            Factory::Invoke(_) => EventCategory::Invoke,
            Factory::Eval(_) => EventCategory::Eval,
            Factory::Await(_) => EventCategory::Await,
            Factory::ControlFlowRoot(_) => EventCategory::ControlFlowRoot,
            Factory::Function(_) => EventCategory::Function,
            Factory::Declare(_) => EventCategory::Declare,
        }
    }

    /// Produce the handler for one occurrence
    pub fn create<'s>(&self, site: &'s CallSite) -> Result<EventHandler<'s>> {
        Ok(match self {
            Factory::Expression(f) => EventHandler::Expression(f.create(site)?),
            Factory::Statement(f) => EventHandler::Statement(f.create(site)?),
            Factory::ForObject(f) => EventHandler::ForObject(f.create(site)?),
            Factory::Literal(f) => EventHandler::Literal(f.create(site)?),
            Factory::Unary(f) => EventHandler::Unary(f.create(site)?),
            Factory::Binary(f) => EventHandler::Binary(f.create(site)?),
            Factory::Conditional(f) => EventHandler::Conditional(f.create(site)?),
            Factory::Read(f) => EventHandler::Read(f.create(site)?),
            Factory::Write(f) => EventHandler::Write(f.create(site)?),
            Factory::GetField(f) => EventHandler::GetField(f.create(site)?),
            Factory::PutField(f) => EventHandler::PutField(f.create(site)?),
            Factory::Invoke(f) => EventHandler::Invoke(f.create(site)?),
            Factory::Eval(f) => EventHandler::Eval(f.create(site)?),
            Factory::Await(f) => EventHandler::Await(f.create(site)?),
            Factory::ControlFlowRoot(f) => EventHandler::ControlFlowRoot(f.create(site)?),
            Factory::Function(f) => EventHandler::Function(f.create(site)?),
            Factory::Declare(f) => EventHandler::Declare(f.create(site)?),
        })
    }
}

macro_rules! impl_from_factory {
    ($($variant:ident($factory:ident)),* $(,)?) => {
        $(
            impl From<$factory> for Factory {
                fn from(factory: $factory) -> Self {
                    Factory::$variant(factory)
                }
            }
        )*
    };
}

impl_from_factory!(
    Expression(ExpressionFactory),
    Statement(StatementFactory),
    ForObject(ForObjectFactory),
    Literal(LiteralFactory),
    Unary(UnaryFactory),
    Binary(BinaryFactory),
    Conditional(ConditionalFactory),
    Read(ReadFactory),
    Write(WriteFactory),
    GetField(GetFieldFactory),
    PutField(PutFieldFactory),
    Invoke(InvokeFactory),
    Eval(EvalFactory),
    Await(AwaitFactory),
    ControlFlowRoot(ControlFlowRootFactory),
    Function(FunctionFactory),
    Declare(DeclareFactory),
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::{FrameId, LoopKind, SiteDetail};
    use crate::types::{AnalysisValue, DispatchError, NativeValue, SourceId};
    use std::any::Any;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(String, Vec<AnalysisValue>)>>,
    }

    impl AnalysisModule for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn hook(name: &'static str) -> Option<Callback> {
        Some(Callback::new(name, move |receiver, args| {
            let recorder = receiver
                .as_any()
                .downcast_ref::<Recorder>()
                .expect("recorder receiver");
            recorder
                .calls
                .lock()
                .unwrap()
                .push((name.to_string(), args.to_vec()));
            Ok(())
        }))
    }

    #[test]
    fn test_factory_category() {
        let analysis: Arc<dyn AnalysisModule> = Arc::new(Recorder::default());
        let factory: Factory = ForObjectFactory::new(analysis, hook("forObject")).into();
        assert_eq!(factory.category(), EventCategory::ForObject);
    }

    #[test]
    fn test_create_rejects_malformed_site() {
        let analysis: Arc<dyn AnalysisModule> = Arc::new(Recorder::default());
        let factory = Factory::from(BinaryFactory::new(analysis, hook("binaryPre"), None));
        let site = CallSite::new(SourceId(4)).with_detail(SiteDetail::Loop {
            loop_kind: LoopKind::For,
        });
        assert!(matches!(
            factory.create(&site),
            Err(DispatchError::MalformedSite { expected: "operator", .. })
        ));
    }

    #[test]
    fn test_one_factory_many_handlers() {
        let recorder = Arc::new(Recorder::default());
        let analysis: Arc<dyn AnalysisModule> = recorder.clone();
        let factory = ReadFactory::new(analysis, hook("read"));
        let sites: Vec<CallSite> = ["a", "b"]
            .iter()
            .enumerate()
            .map(|(i, name)| {
                CallSite::new(SourceId(i as u32)).with_detail(SiteDetail::Variable {
                    name: name.to_string(),
                    is_global: false,
                })
            })
            .collect();

        for site in &sites {
            let handler = factory.create(site).unwrap();
            handler
                .after(&FrameId(1), &NativeValue::Null, &[])
                .unwrap();
        }

        let calls = recorder.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].1[1], AnalysisValue::from("a"));
        assert_eq!(calls[1].1[1], AnalysisValue::from("b"));
    }

    #[test]
    fn test_literal_filter_resolved_at_creation() {
        let recorder = Arc::new(Recorder::default());
        let analysis: Arc<dyn AnalysisModule> = recorder.clone();
        let factory = LiteralFactory::new(analysis, hook("literal"))
            .with_type_filter([LiteralType::ObjectLiteral]);

        let object = CallSite::new(SourceId(1)).with_detail(SiteDetail::Literal {
            literal_type: LiteralType::ObjectLiteral,
        });
        let number = CallSite::new(SourceId(2)).with_detail(SiteDetail::Literal {
            literal_type: LiteralType::NumericLiteral,
        });

        let object_handler = EventHandler::Literal(factory.create(&object).unwrap());
        let number_handler = EventHandler::Literal(factory.create(&number).unwrap());
        assert!(!object_handler.is_inert());
        assert!(number_handler.is_inert());

        number_handler
            .after(&FrameId(0), &NativeValue::Integer(1), &[])
            .unwrap();
        object_handler
            .after(&FrameId(0), &NativeValue::Null, &[])
            .unwrap();

        let calls = recorder.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].1,
            vec![
                AnalysisValue::Number(1.0),
                AnalysisValue::from("ObjectLiteral"),
                AnalysisValue::Null
            ]
        );
    }
}
