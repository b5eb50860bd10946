//! Poll Security Events Handler

use std::sync::Arc;

use attempts_app::domain::{
    events::records::EventBatch,
    poll::data::{MaxEvents, PollRequest},
};
use salvo::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    attempts::errors::{INTERNAL_SERVER_ERROR, into_error_response},
    auth::middleware::UNAUTHORIZED,
    extensions::*,
    observability::observe_poll,
    state::State,
};

/// Poll request body; each field may also arrive as a query parameter.
#[derive(Debug, Default, Deserialize)]
struct PollBody {
    #[serde(default)]
    ack: Option<Vec<String>>,

    #[serde(default, rename = "maxEvents")]
    max_events: Option<MaxEvents>,
}

/// Poll Response
#[derive(Debug, Serialize)]
pub(crate) struct PollResponse {
    /// Event key to serialized security event token.
    pub sets: EventBatch,
}

async fn poll_request(req: &mut Request) -> Option<PollRequest> {
    let payload = req.payload().await.ok()?;

    let body = if payload.iter().all(u8::is_ascii_whitespace) {
        PollBody::default()
    } else {
        serde_json::from_slice::<PollBody>(payload)
            .map_err(|source| debug!("malformed poll body: {source}"))
            .ok()?
    };

    let ack = body.ack.or_else(|| {
        let queries = req.queries();

        queries
            .get_vec("ack")
            .or_else(|| queries.get_vec("ack[]"))
            .cloned()
    });

    let max_events = body
        .max_events
        .or_else(|| req.query::<String>("maxEvents").map(MaxEvents::Text));

    Some(PollRequest { ack, max_events })
}

/// Poll Security Events Handler
///
/// Deletes acknowledged events, then returns up to `maxEvents` pending
/// events for the authenticated issuer.
#[endpoint(
    tags("attempts"),
    summary = "Poll security events",
    security(("issuer_bearer" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Pending security events"),
        (status_code = StatusCode::BAD_REQUEST, description = "Invalid maxEvents or body"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Unknown issuer or token"),
        (status_code = StatusCode::NOT_FOUND, description = "Attempts API disabled"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let Ok(state) = depot.obtain::<Arc<State>>() else {
        res.render_error(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_SERVER_ERROR);

        return;
    };

    let Some(issuer) = depot.issuer() else {
        res.render_error(StatusCode::UNAUTHORIZED, UNAUTHORIZED);

        return;
    };

    let Some(request) = poll_request(req).await else {
        res.render_error(StatusCode::BAD_REQUEST, "Invalid request body");

        return;
    };

    match state.app.poll.poll(issuer, request).await {
        Ok(outcome) => {
            observe_poll(issuer.as_str(), outcome.sets.len(), outcome.acknowledged);

            res.render(Json(PollResponse { sets: outcome.sets }));
        }
        Err(error) => {
            let (status, message) = into_error_response(&error);

            res.render_error(status, &message);
        }
    }
}
