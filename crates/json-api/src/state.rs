//! State

use std::sync::Arc;

use storefront_app::context::AppContext;

#[derive(Clone)]
pub(crate) struct State {
    pub(crate) app: AppContext,

    /// Bearer token for operator routes. `None` locks those routes.
    pub(crate) operator_token: Option<String>,
}

impl State {
    #[must_use]
    pub(crate) fn new(app: AppContext, operator_token: Option<String>) -> Self {
        Self {
            app,
            operator_token,
        }
    }

    #[must_use]
    pub(crate) fn shared(app: AppContext, operator_token: Option<String>) -> Arc<Self> {
        Arc::new(Self::new(app, operator_token))
    }
}
