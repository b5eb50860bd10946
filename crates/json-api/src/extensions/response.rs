//! JSON error bodies.

use salvo::{
    http::StatusCode,
    oapi::ToSchema,
    prelude::{Json, Response},
};
use serde::{Deserialize, Serialize};

/// Error Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ErrorResponse {
    /// Human readable error
    pub error: String,
}

pub(crate) trait ErrorResponseExt {
    /// Render `{"error": message}` with `status`.
    fn render_error(&mut self, status: StatusCode, message: &str);
}

impl ErrorResponseExt for Response {
    fn render_error(&mut self, status: StatusCode, message: &str) {
        self.status_code(status);
        self.render(Json(ErrorResponse {
            error: message.to_owned(),
        }));
    }
}
