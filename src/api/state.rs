use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::adapters::ObjectStore;
use crate::agents::Governor;
use crate::api::auth::AdminAuth;
use crate::services::{CooldownLimiter, ReportCycle};

/// Shared application state for API handlers
#[derive(Clone)]
pub struct AppState {
    pub cycle: Arc<ReportCycle>,
    pub store: Arc<dyn ObjectStore>,
    /// Cooldown for on-demand report generation
    pub generate_limiter: Arc<CooldownLimiter>,
    pub auth: AdminAuth,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        cycle: Arc<ReportCycle>,
        store: Arc<dyn ObjectStore>,
        generate_cooldown: chrono::Duration,
        auth: AdminAuth,
    ) -> Self {
        Self {
            cycle,
            store,
            generate_limiter: Arc::new(CooldownLimiter::new(generate_cooldown)),
            auth,
            started_at: Utc::now(),
        }
    }

    pub fn governor(&self) -> &Governor {
        self.cycle.governor()
    }
}
