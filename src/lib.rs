use crate::services::attempt::AttemptService;
use crate::services::grading::GradingService;
use crate::services::timer::TimerService;
use crate::storage::QuizStore;
use crate::utils::lock::AttemptLocks;
use crate::utils::time::Clock;
use chrono::FixedOffset;
use std::sync::Arc;

pub mod config;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod storage;
pub mod utils;

/// Shared application state handed to every handler. The clock is
/// injected so tests can pin and advance time deterministically.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn QuizStore>,
    pub clock: Arc<dyn Clock>,
    pub attempts: AttemptService,
    pub grading: GradingService,
    pub display_offset: FixedOffset,
}

impl AppState {
    pub fn new(
        store: Arc<dyn QuizStore>,
        clock: Arc<dyn Clock>,
        display_offset: FixedOffset,
    ) -> Self {
        let locks = AttemptLocks::new();
        let timer = TimerService::new(store.clone(), clock.clone());
        let attempts =
            AttemptService::new(store.clone(), clock.clone(), timer, locks.clone());
        let grading = GradingService::new(store.clone(), clock.clone(), locks);

        Self {
            store,
            clock,
            attempts,
            grading,
            display_offset,
        }
    }
}
