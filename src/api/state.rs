//! Shared application state
//!
//! Built once at startup around the process-wide pool and cloned into every
//! handler. Each service holds a pool handle and checks out connections per
//! call.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::history::HistoryService;
use crate::identity::IdentityStore;
use crate::ledger::LedgerEngine;

use super::rate_limit::RateLimiter;
use super::token::TokenService;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub identity: IdentityStore,
    pub ledger: LedgerEngine,
    pub history: HistoryService,
    pub tokens: Arc<TokenService>,
    pub limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(pool: PgPool, config: &Config) -> Self {
        Self {
            identity: IdentityStore::new(pool.clone()),
            ledger: LedgerEngine::new(pool.clone()).with_deadline(config.ledger_deadline()),
            history: HistoryService::new(pool.clone()),
            tokens: Arc::new(TokenService::new(
                &config.token_secret,
                config.token_ttl_hours,
            )),
            limiter: Arc::new(RateLimiter::new(
                config.rate_limit_per_second,
                config.rate_limit_burst,
            )),
            pool,
        }
    }
}
