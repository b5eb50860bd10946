//! Attempts Status Handler

use std::sync::Arc;

use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{extensions::*, state::State};

/// Attempts API status response
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub(crate) struct StatusResponse {
    /// `enabled` or `disabled`
    pub status: String,

    /// Why the API is disabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl StatusResponse {
    fn for_flag(enabled: bool) -> Self {
        if enabled {
            Self {
                status: "enabled".to_string(),
                reason: None,
            }
        } else {
            Self {
                status: "disabled".to_string(),
                reason: Some("not_yet_implemented".to_string()),
            }
        }
    }
}

/// Attempts Status Handler
///
/// Reports whether the poll endpoint is being served.
#[endpoint(tags("attempts"), summary = "Attempts API status")]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<StatusResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    Ok(Json(StatusResponse::for_flag(state.attempts_enabled)))
}

#[cfg(test)]
mod tests {
    use salvo::{
        affix_state::inject,
        test::{ResponseExt, TestClient},
    };
    use testresult::TestResult;

    use crate::test_helpers::strict_state;

    use super::*;

    async fn status(enabled: bool) -> TestResult<StatusResponse> {
        let router = Router::new()
            .hoop(inject(strict_state(enabled)))
            .push(Router::with_path("api/attempts/status").get(handler));

        Ok(TestClient::get("http://example.com/api/attempts/status")
            .send(&Service::new(router))
            .await
            .take_json()
            .await?)
    }

    #[tokio::test]
    async fn test_disabled_status() -> TestResult {
        assert_eq!(
            status(false).await?,
            StatusResponse {
                status: "disabled".to_string(),
                reason: Some("not_yet_implemented".to_string()),
            }
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_enabled_status_has_no_reason() -> TestResult {
        let response = status(true).await?;

        assert_eq!(response.status, "enabled");
        assert_eq!(response.reason, None);

        Ok(())
    }
}
