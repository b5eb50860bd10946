//! Route labels for spans and metrics.

/// Paths served by this process; anything else is labelled `unmatched`.
const KNOWN_ROUTES: &[&str] = &[
    "/api/attempts/poll",
    "/api/attempts/status",
    "/healthcheck",
    "/metrics",
    "/api-doc/openapi.json",
];

/// Bounded-cardinality label for a request path.
pub(super) fn route_label(path: &str) -> &'static str {
    let trimmed = match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    };

    if let Some(route) = KNOWN_ROUTES.iter().copied().find(|route| *route == trimmed) {
        return route;
    }

    if trimmed == "/docs" || trimmed.starts_with("/docs/") {
        return "/docs";
    }

    "unmatched"
}
