use crate::db::{FeedbackStore, GoalLog, PlanStore, UserStore};
use crate::middleware::RateLimiter;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub goals: Arc<dyn GoalLog>,
    pub plans: Arc<dyn PlanStore>,
    pub feedback: Arc<dyn FeedbackStore>,
    pub login_limiter: RateLimiter,
}

impl AppState {
    /// Wires one store that implements every collaborator into each slot.
    pub fn with_store<S>(store: Arc<S>, login_limiter: RateLimiter) -> Self
    where
        S: UserStore + GoalLog + PlanStore + FeedbackStore + 'static,
    {
        Self {
            users: store.clone(),
            goals: store.clone(),
            plans: store.clone(),
            feedback: store,
            login_limiter,
        }
    }
}

pub type SharedState = Arc<AppState>;
