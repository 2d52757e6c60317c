//! Per-model consumption budgets.
//!
//! A single [`RateLimiter`] is meant to be shared (`Arc<RateLimiter>`) by every session in
//! the process. Each model has its own [`ModelBudget`]; all reads and writes go through one
//! async mutex, so concurrent sessions never race on a counter.
//!
//! A budget is refilled either when its window elapses or explicitly after the runner has
//! slept through a cool-down ([`RateLimiter::reset`]).

use crate::clients::groq::Model;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Default refill window, matching the per-minute limits hosted providers publish.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Snapshot of one model's budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelBudget {
    /// Tokens (or requests, when the client reports no usage) spent in the current window.
    pub consumed: u64,
    /// Spend at which further calls must wait for a refill.
    pub ceiling: u64,
}

impl ModelBudget {
    pub fn is_exhausted(&self) -> bool {
        self.consumed >= self.ceiling
    }
}

struct BudgetState {
    budget: ModelBudget,
    window_started: Instant,
}

/// Lock-protected per-model counters.
pub struct RateLimiter {
    window: Duration,
    budgets: Mutex<HashMap<String, BudgetState>>,
}

impl RateLimiter {
    /// A limiter with no ceilings: every model is unmetered until [`with_ceiling`] is used.
    ///
    /// [`with_ceiling`]: RateLimiter::with_ceiling
    pub fn new() -> Self {
        Self::with_window(DEFAULT_WINDOW)
    }

    pub fn with_window(window: Duration) -> Self {
        Self {
            window,
            budgets: Mutex::new(HashMap::new()),
        }
    }

    /// A limiter seeded with the published ceilings of every [`Model`].
    pub fn with_default_ceilings() -> Self {
        let mut budgets = HashMap::new();
        let now = Instant::now();
        for model in Model::ALL {
            budgets.insert(
                model.as_str().to_string(),
                BudgetState {
                    budget: ModelBudget {
                        consumed: 0,
                        ceiling: model.default_ceiling(),
                    },
                    window_started: now,
                },
            );
        }
        Self {
            window: DEFAULT_WINDOW,
            budgets: Mutex::new(budgets),
        }
    }

    /// Set (or replace) the ceiling for `model` (builder pattern).
    pub fn with_ceiling(mut self, model: impl Into<String>, ceiling: u64) -> Self {
        self.budgets.get_mut().insert(
            model.into(),
            BudgetState {
                budget: ModelBudget {
                    consumed: 0,
                    ceiling,
                },
                window_started: Instant::now(),
            },
        );
        self
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Current budget for `model`, refilled first if its window has elapsed.
    /// `None` means the model is unmetered.
    pub async fn budget(&self, model: &str) -> Option<ModelBudget> {
        let mut budgets = self.budgets.lock().await;
        let state = budgets.get_mut(model)?;
        self.refill_if_elapsed(model, state);
        Some(state.budget.clone())
    }

    /// Whether the next call to `model` must wait for a refill.
    pub async fn is_exhausted(&self, model: &str) -> bool {
        self.budget(model)
            .await
            .map(|b| b.is_exhausted())
            .unwrap_or(false)
    }

    /// Charge `amount` against `model`'s budget. Unmetered models are ignored.
    pub async fn record(&self, model: &str, amount: u64) {
        let mut budgets = self.budgets.lock().await;
        if let Some(state) = budgets.get_mut(model) {
            self.refill_if_elapsed(model, state);
            state.budget.consumed = state.budget.consumed.saturating_add(amount);
            log::debug!(
                "RateLimiter: {} consumed {}/{}",
                model,
                state.budget.consumed,
                state.budget.ceiling
            );
        }
    }

    /// Zero `model`'s counter and restart its window.
    pub async fn reset(&self, model: &str) {
        let mut budgets = self.budgets.lock().await;
        if let Some(state) = budgets.get_mut(model) {
            state.budget.consumed = 0;
            state.window_started = Instant::now();
        }
    }

    fn refill_if_elapsed(&self, model: &str, state: &mut BudgetState) {
        if state.window_started.elapsed() >= self.window {
            if state.budget.consumed > 0 {
                log::debug!("RateLimiter: window elapsed for {}, refilling", model);
            }
            state.budget.consumed = 0;
            state.window_started = Instant::now();
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
