//! State

use std::sync::Arc;

use attempts_app::context::AppContext;

#[derive(Clone)]
pub(crate) struct State {
    pub(crate) app: AppContext,

    /// Whether the poll endpoint is served.
    pub(crate) attempts_enabled: bool,
}

impl State {
    #[must_use]
    pub(crate) fn new(app: AppContext, attempts_enabled: bool) -> Self {
        Self {
            app,
            attempts_enabled,
        }
    }

    #[must_use]
    pub(crate) fn from_app_context(app: AppContext, attempts_enabled: bool) -> Arc<Self> {
        Arc::new(Self::new(app, attempts_enabled))
    }
}
