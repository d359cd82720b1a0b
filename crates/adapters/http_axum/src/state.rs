//! Shared application state for axum handlers.

use std::sync::Arc;

use hearth_app::control_loop::ControlHandle;
use hearth_app::ports::SampleQuery;

/// Application state shared across all axum handlers.
///
/// Generic over the sample query type to avoid dynamic dispatch. `Clone` is
/// implemented manually so the query type itself does not need to be
/// `Clone` — only the `Arc` wrapper is cloned.
pub struct AppState<Q> {
    /// Command/status handle into the control loop.
    pub handle: ControlHandle,
    /// Read side of the sample store.
    pub samples: Arc<Q>,
}

impl<Q> Clone for AppState<Q> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
            samples: Arc::clone(&self.samples),
        }
    }
}

impl<Q> AppState<Q>
where
    Q: SampleQuery + 'static,
{
    /// Create a new application state.
    pub fn new(handle: ControlHandle, samples: Q) -> Self {
        Self {
            handle,
            samples: Arc::new(samples),
        }
    }
}
