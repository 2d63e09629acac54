//! Analysis modules and the callbacks bound to them

use crate::types::{AnalysisValue, CallbackError};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// The analysis-side receiver every callback is invoked against
pub trait AnalysisModule: Send + Sync + 'static {
    /// Human-readable module name (used in diagnostics only)
    fn name(&self) -> &str;

    /// Access to the concrete module, for callbacks that need their receiver's state
    fn as_any(&self) -> &dyn Any;
}

/// Something that can be called across the analysis boundary
pub trait Invocable: Send + Sync {
    fn invoke(
        &self,
        receiver: &dyn AnalysisModule,
        args: &[AnalysisValue],
    ) -> std::result::Result<(), CallbackError>;
}

impl<F> Invocable for F
where
    F: Fn(&dyn AnalysisModule, &[AnalysisValue]) -> std::result::Result<(), CallbackError>
        + Send
        + Sync,
{
    fn invoke(
        &self,
        receiver: &dyn AnalysisModule,
        args: &[AnalysisValue],
    ) -> std::result::Result<(), CallbackError> {
        self(receiver, args)
    }
}

/// An opaque, present analysis callback
#[derive(Clone)]
pub struct Callback {
    name: Arc<str>,
    target: Arc<dyn Invocable>,
}

impl Callback {
    /// Wrap a closure under the hook name it was resolved from
    pub fn new<F>(name: impl Into<Arc<str>>, f: F) -> Self
    where
        F: Fn(&dyn AnalysisModule, &[AnalysisValue]) -> std::result::Result<(), CallbackError>
            + Send
            + Sync
            + 'static,
    {
        Self::from_invocable(name, f)
    }

    pub fn from_invocable(name: impl Into<Arc<str>>, target: impl Invocable + 'static) -> Self {
        Self {
            name: name.into(),
            target: Arc::new(target),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn call(
        &self,
        receiver: &dyn AnalysisModule,
        args: &[AnalysisValue],
    ) -> std::result::Result<(), CallbackError> {
        self.target.invoke(receiver, args)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Callback").field(&self.name).finish()
    }
}

/// The optional (pre, post) callbacks of one registration
///
/// Fixed once built; absence is permanent.
#[derive(Debug, Clone, Default)]
pub struct CallbackPair {
    pre: Option<Callback>,
    post: Option<Callback>,
}

impl CallbackPair {
    pub fn new(pre: Option<Callback>, post: Option<Callback>) -> Self {
        Self { pre, post }
    }

    pub fn pre_only(pre: Option<Callback>) -> Self {
        Self { pre, post: None }
    }

    pub fn post_only(post: Option<Callback>) -> Self {
        Self { pre: None, post }
    }

    pub fn pre(&self) -> Option<&Callback> {
        self.pre.as_ref()
    }

    pub fn post(&self) -> Option<&Callback> {
        self.post.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.pre.is_none() && self.post.is_none()
    }
}

/// Everything a factory shares with the handlers it produces
pub(crate) struct Binding {
    pub(crate) analysis: Arc<dyn AnalysisModule>,
    pub(crate) callbacks: CallbackPair,
}

impl Binding {
    pub(crate) fn new(analysis: Arc<dyn AnalysisModule>, callbacks: CallbackPair) -> Arc<Self> {
        Arc::new(Self {
            analysis,
            callbacks,
        })
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("analysis", &self.analysis.name())
            .field("callbacks", &self.callbacks)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Named(&'static str);

    impl AnalysisModule for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_closure_callbacks_see_their_receiver() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let callback = Callback::new("startExpression", move |receiver, args| {
            assert_eq!(receiver.name(), "unit");
            counter.fetch_add(args.len(), Ordering::SeqCst);
            Ok(())
        });

        callback
            .call(&Named("unit"), &[AnalysisValue::Null, AnalysisValue::Undefined])
            .unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 2);
        assert_eq!(callback.name(), "startExpression");
    }

    #[test]
    fn test_callback_pair_shapes() {
        let cb = Callback::new("forObject", |_, _| Ok(()));
        let pair = CallbackPair::pre_only(Some(cb));
        assert!(pair.pre().is_some());
        assert!(pair.post().is_none());
        assert!(CallbackPair::default().is_empty());
    }
}
