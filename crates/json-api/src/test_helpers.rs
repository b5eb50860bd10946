//! Test helpers.

use std::sync::Arc;

use attempts_app::{
    context::{AppConfig, AppContext, Stores},
    domain::{
        events::records::IssuerId,
        issuers::{
            ConfiguredIssuersService, IssuersService, MockIssuersService,
            digest::DEFAULT_SCRYPT_COST, issue_request_token, records::ProvidersConfig,
        },
        poll::{MockPollService, PollService},
    },
    storage::MemoryStore,
};
use testresult::TestResult;

use crate::state::State;

pub(crate) fn strict_poll_mock() -> MockPollService {
    let mut poll = MockPollService::new();

    poll.expect_poll().never();

    poll
}

pub(crate) fn strict_issuers_mock() -> MockIssuersService {
    let mut issuers = MockIssuersService::new();

    issuers.expect_authenticate().never();

    issuers
}

/// In-memory context with the given poll and issuer services swapped in.
pub(crate) fn app_context(
    poll: Arc<dyn PollService>,
    issuers: Arc<dyn IssuersService>,
) -> AppContext {
    let base = AppContext::from_stores(Stores::memory(MemoryStore::new()), &AppConfig::default());

    AppContext {
        poll,
        issuers,
        ..base
    }
}

pub(crate) fn strict_state(attempts_enabled: bool) -> Arc<State> {
    State::from_app_context(
        app_context(
            Arc::new(strict_poll_mock()),
            Arc::new(strict_issuers_mock()),
        ),
        attempts_enabled,
    )
}

/// Real issuer service accepting one freshly issued token for `issuer`.
pub(crate) fn issuer_with_token(issuer: &str) -> TestResult<(Arc<dyn IssuersService>, String)> {
    let issued = issue_request_token(IssuerId::from(issuer), None, DEFAULT_SCRYPT_COST)?;
    let providers = ProvidersConfig::try_from(vec![issued.provider().clone()])?;

    Ok((
        Arc::new(ConfiguredIssuersService::new(providers)),
        issued.token().to_string(),
    ))
}

/// Enabled state over a fresh memory store, plus its context for seeding.
pub(crate) fn memory_state(issuers: Arc<dyn IssuersService>) -> (Arc<State>, AppContext) {
    let base = AppContext::from_stores(Stores::memory(MemoryStore::new()), &AppConfig::default());
    let ctx = AppContext { issuers, ..base };

    (State::from_app_context(ctx.clone(), true), ctx)
}
