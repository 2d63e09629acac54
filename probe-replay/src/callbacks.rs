//! Native analysis modules loaded from C dynamic libraries

use crate::ffi::{self, CallbackFn, CreateFn, DestroyFn, LastErrorFn};
use anyhow::{Context, Result};
use libloading::Library;
use probe_dispatch::{AnalysisModule, AnalysisValue, Callback, CallbackError, Invocable};
use std::any::Any;
use std::os::raw::c_void;
use std::path::Path;
use std::sync::Arc;

/// Receiver state returned by `probe_analysis_create`
struct StatePtr(*mut c_void);

// SAFETY: the pointer is only handed back to the library that produced it. The
// analysis ABI requires libraries to accept concurrent calls on it when replaying
// with more than one job.
unsafe impl Send for StatePtr {}
unsafe impl Sync for StatePtr {}

/// An analysis module backed by a dynamic library
pub struct NativeAnalysis {
    name: String,
    state: StatePtr,
    destroy: Option<DestroyFn>,
    last_error: Option<LastErrorFn>,
    // Declared last: dropped after `Drop::drop` has released the state
    library: Arc<Library>,
}

impl NativeAnalysis {
    /// Load the library and create its receiver state
    pub fn load(path: &Path, name: Option<&str>) -> Result<Self> {
        log::info!("Loading analysis library: {:?}", path);

        // SAFETY: loading runs the library's initialisers; the library is trusted analysis code.
        let library = unsafe { Library::new(path) }
            .with_context(|| format!("Failed to load analysis library: {:?}", path))?;

        let create = optional_symbol::<CreateFn>(&library, ffi::CREATE_SYMBOL);
        let destroy = optional_symbol::<DestroyFn>(&library, ffi::DESTROY_SYMBOL);
        let last_error = optional_symbol::<LastErrorFn>(&library, ffi::LAST_ERROR_SYMBOL);

        let state = match create {
            // SAFETY: signature fixed by the analysis ABI.
            Some(create) => unsafe { create() },
            None => std::ptr::null_mut(),
        };

        let name = name.map(str::to_string).unwrap_or_else(|| {
            path.file_stem()
                .and_then(|s| s.to_str())
                .map(|s| s.trim_start_matches("lib").to_string())
                .unwrap_or_else(|| "analysis".to_string())
        });

        log::info!("Analysis library loaded: {}", name);
        Ok(Self {
            name,
            state: StatePtr(state),
            destroy,
            last_error,
            library: Arc::new(library),
        })
    }

    /// Look up an analysis hook; `None` if the library does not export it
    pub fn resolve(&self, hook: &str) -> Option<Callback> {
        let function = optional_symbol::<CallbackFn>(&self.library, hook)?;
        log::debug!("Resolved hook {} in {}", hook, self.name);
        Some(Callback::from_invocable(
            hook,
            NativeCallback {
                function,
                _library: Arc::clone(&self.library),
            },
        ))
    }
}

impl Drop for NativeAnalysis {
    fn drop(&mut self) {
        if let Some(destroy) = self.destroy {
            // SAFETY: state came from this library's create function and is released once.
            unsafe { destroy(self.state.0) };
        }
    }
}

impl AnalysisModule for NativeAnalysis {
    fn name(&self) -> &str {
        &self.name
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn optional_symbol<T: Copy>(library: &Library, name: &str) -> Option<T> {
    // SAFETY: symbol types are fixed by the analysis ABI; the copied function pointer
    // is only used while an `Arc<Library>` keeps the library mapped.
    unsafe { library.get::<T>(name.as_bytes()).ok().map(|symbol| *symbol) }
}

/// A hook exported by a native library
struct NativeCallback {
    function: CallbackFn,
    _library: Arc<Library>,
}

impl Invocable for NativeCallback {
    fn invoke(
        &self,
        receiver: &dyn AnalysisModule,
        args: &[AnalysisValue],
    ) -> std::result::Result<(), CallbackError> {
        let analysis = receiver
            .as_any()
            .downcast_ref::<NativeAnalysis>()
            .ok_or(CallbackError::ReceiverMismatch { expected: "native" })?;
        // SAFETY: hook resolved from the receiver's library with the CallbackFn signature.
        unsafe { ffi::call_hook(self.function, analysis.state.0, args, analysis.last_error) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_analysis_is_shared_across_workers() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NativeAnalysis>();
        assert_send_sync::<Arc<dyn AnalysisModule>>();
    }

    #[test]
    fn test_missing_library_is_an_error() {
        let result = NativeAnalysis::load(Path::new("/nonexistent/libnothing.so"), None);
        assert!(result.is_err());
    }

    #[test]
    fn test_native_callback_rejects_foreign_receiver() {
        struct Other;

        impl AnalysisModule for Other {
            fn name(&self) -> &str {
                "other"
            }

            fn as_any(&self) -> &dyn Any {
                self
            }
        }

        unsafe extern "C" fn never(
            _: *mut c_void,
            _: *const ffi::ProbeValue,
            _: usize,
        ) -> std::os::raw::c_int {
            panic!("must not be called");
        }

        // Any loadable library works as the keep-alive handle; use the process itself.
        #[cfg(unix)]
        {
            let library: Library = libloading::os::unix::Library::this().into();
            let callback = NativeCallback {
                function: never,
                _library: Arc::new(library),
            };
            let err = callback.invoke(&Other, &[]).unwrap_err();
            assert_eq!(err, CallbackError::ReceiverMismatch { expected: "native" });
        }
    }
}
