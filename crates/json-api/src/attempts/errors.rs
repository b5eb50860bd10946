//! Attempts Errors

use attempts_app::domain::poll::PollServiceError;
use salvo::http::StatusCode;
use tracing::error;

pub(crate) const INTERNAL_SERVER_ERROR: &str = "Internal Server Error";

pub(crate) fn into_error_response(error: &PollServiceError) -> (StatusCode, String) {
    match error {
        PollServiceError::InvalidMaxEvents => (StatusCode::BAD_REQUEST, error.to_string()),
        PollServiceError::Queue(source) => {
            error!("failed to poll events: {source}");

            (
                StatusCode::INTERNAL_SERVER_ERROR,
                INTERNAL_SERVER_ERROR.to_string(),
            )
        }
    }
}
