//! Alert routing and notification delivery
//!
//! - Alert router: static risk level to channel policy table
//! - Dispatcher: per-channel fan-out over the chat transports

pub mod alert_router;
pub mod dispatcher;

pub use alert_router::{
    escalated, escalation_policy, policy_for, policy_for_severity, route_severity, AlertPolicy,
    ChannelId, ROUTING_TABLE,
};
pub use dispatcher::{ChannelBinding, DispatchResult, NotificationDispatcher};
