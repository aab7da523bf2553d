//! Per-call context for methods that declare a `ctx` parameter

use std::sync::Arc;

/// The application a server exposes to its methods.
///
/// Handed to `RpcServer::bind` explicitly; methods reach it only through their
/// `Context`, which makes it easy to substitute in tests.
pub trait Application: Send + Sync + 'static {
    /// Snapshot of a window, as seen by a method
    type Window: Clone + Send + Sync + 'static;

    /// Look up a live window by the token the frontend sent.
    fn window(&self, token: &str) -> Option<Self::Window>;
}

/// Read-only handle built fresh for each invocation and never stored.
pub struct Context<A: Application> {
    application: Arc<A>,
    window: Option<A::Window>,
}

impl<A: Application> Context<A> {
    pub fn new(application: Arc<A>, window: Option<A::Window>) -> Self {
        Self {
            application,
            window,
        }
    }

    pub fn application(&self) -> &Arc<A> {
        &self.application
    }

    /// The window the call came from, if the frontend identified one that is still open.
    pub fn window(&self) -> Option<&A::Window> {
        self.window.as_ref()
    }
}

impl<A: Application> Clone for Context<A> {
    fn clone(&self) -> Self {
        Self {
            application: Arc::clone(&self.application),
            window: self.window.clone(),
        }
    }
}
