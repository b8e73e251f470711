//! Risk agents
//!
//! Token agents implement `TokenRiskAgent` and each watch one instrument.
//! The governor aggregates them; the observer collects intelligence and
//! owns no risk category.

pub mod core;
pub mod gold;
pub mod governor;
pub mod launchpad;
pub mod observer;
pub mod synthetic;
pub mod thresholds;
pub mod traits;
pub mod verification;

pub use self::core::{AgentCore, Assessment, MetricReading, SnapshotRefresh};
pub use gold::{GoldReserveAgent, GOLD_AGENT_ID};
pub use governor::{Governor, PendingPause, GOVERNOR_AGENT_ID, UNMONITORED_CATEGORY};
pub use launchpad::{LaunchpadAgent, LAUNCHPAD_AGENT_ID};
pub use observer::{ObserverAgent, OBSERVER_AGENT_ID};
pub use synthetic::{SyntheticDollarAgent, SYNTHETIC_AGENT_ID};
pub use thresholds::ThresholdTable;
pub use traits::TokenRiskAgent;
pub use verification::{StructuralVerifier, VerificationStrategy, Verdict};
