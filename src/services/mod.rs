//! Long-running services
//!
//! - Report cycle: one scheduled monitoring pass
//! - Scheduler: interval loop with graceful shutdown
//! - Health: component status for `/health`
//! - Rate limit: cooldowns for on-demand operations

pub mod health;
pub mod rate_limit;
pub mod report_cycle;
pub mod scheduler;

pub use health::{check_health, ComponentHealth, HealthResponse, HealthStatus};
pub use rate_limit::CooldownLimiter;
pub use report_cycle::{CycleOutcome, CycleStatus, PreparedPause, ReportCycle};
pub use scheduler::Scheduler;
