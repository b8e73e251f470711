pub mod adapters;
pub mod agents;
pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod serde_utils;
pub mod services;
pub mod supervisor;

pub use adapters::{ChatTransport, IntelligenceFeed, MetricSource, ObjectStore};
pub use agents::{Governor, ObserverAgent, TokenRiskAgent};
pub use app::{App, Integrations};
pub use config::AppConfig;
pub use domain::{Alert, AlertSeverity, EmergencyStatus, OperationalReport, RiskLevel, RiskStatus};
pub use error::{NotifyError, Result, SentryError};
pub use services::{CycleOutcome, CycleStatus, ReportCycle, Scheduler};
pub use supervisor::{ChannelId, NotificationDispatcher};
