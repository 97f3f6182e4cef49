use crate::explore::service::DecisionService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub explore: DecisionService,
}
