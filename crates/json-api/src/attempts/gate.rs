//! Feature gate for the poll endpoint.

use std::sync::Arc;

use salvo::prelude::*;

use crate::{attempts::errors::INTERNAL_SERVER_ERROR, extensions::*, state::State};

/// Answer 404 while the attempts API is switched off.
#[salvo::handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    let enabled = match depot.obtain::<Arc<State>>() {
        Ok(state) => state.attempts_enabled,
        Err(_missing) => {
            res.render_error(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_SERVER_ERROR);
            ctrl.skip_rest();

            return;
        }
    };

    if !enabled {
        res.render_error(StatusCode::NOT_FOUND, "Not Found");
        ctrl.skip_rest();

        return;
    }

    ctrl.call_next(req, depot, res).await;
}
