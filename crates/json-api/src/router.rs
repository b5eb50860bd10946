//! App Router

use salvo::Router;

use crate::{attempts, auth, healthcheck, observability};

/// Attempts API routes.
pub(crate) fn attempts_router() -> Router {
    Router::with_path("api/attempts")
        .push(
            Router::with_path("poll")
                .hoop(attempts::gate::handler)
                .hoop(auth::middleware::handler)
                .post(attempts::poll::handler),
        )
        .push(Router::with_path("status").get(attempts::status::handler))
}

/// Every route served, before the OpenAPI document is attached.
pub(crate) fn app_router() -> Router {
    Router::new()
        .push(Router::with_path("healthcheck").get(healthcheck::handler))
        .push(Router::with_path("metrics").get(observability::metrics_handler))
        .push(attempts_router())
}
