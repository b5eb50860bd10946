//! Issuer auth middleware.

use std::sync::Arc;

use attempts_app::domain::issuers::{IssuerAuthError, parse_authorization};
use salvo::{http::header::AUTHORIZATION, prelude::*};
use tracing::{error, warn};

use crate::{extensions::*, state::State};

pub(crate) const UNAUTHORIZED: &str = "Unauthorized";

/// Resolve `Authorization: Bearer <issuer> <token>` into an issuer.
#[salvo::handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    let Some((issuer, token)) = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_authorization)
    else {
        res.render_error(StatusCode::UNAUTHORIZED, UNAUTHORIZED);
        ctrl.skip_rest();

        return;
    };

    let Ok(state) = depot.obtain::<Arc<State>>() else {
        res.render_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
        ctrl.skip_rest();

        return;
    };

    let authenticated = state.app.issuers.authenticate(issuer, token).await;

    match authenticated {
        Ok(issuer) => {
            depot.insert_issuer(issuer);

            ctrl.call_next(req, depot, res).await;
        }
        Err(IssuerAuthError::NotFound) => {
            warn!(issuer, "rejected poll credentials");

            res.render_error(StatusCode::UNAUTHORIZED, UNAUTHORIZED);
            ctrl.skip_rest();
        }
        Err(error) => {
            error!(%error, "failed to verify request token");

            res.render_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
            ctrl.skip_rest();
        }
    }
}
