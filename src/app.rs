//! Component assembly from configuration

use chrono::Duration;
use std::sync::Arc;
use tracing::{info, warn};

use crate::adapters::{
    ChatTransport, DiscordNotifier, FileObjectStore, FixedMetricSource, InMemoryObjectStore,
    IntelligenceFeed, MetricSource, ObjectStore, PlaceholderFeed, TelegramNotifier,
};
use crate::agents::{
    AgentCore, GoldReserveAgent, Governor, LaunchpadAgent, ObserverAgent, StructuralVerifier,
    SyntheticDollarAgent, ThresholdTable, TokenRiskAgent, GOLD_AGENT_ID, LAUNCHPAD_AGENT_ID,
    SYNTHETIC_AGENT_ID,
};
use crate::api::{AdminAuth, AppState};
use crate::config::{AppConfig, ChannelDestinations, StorageBackend};
use crate::error::{Result, SentryError};
use crate::persistence::{ReportStore, SnapshotStore};
use crate::services::{ReportCycle, Scheduler};
use crate::supervisor::{ChannelId, NotificationDispatcher};

/// Upstream integrations the application is assembled around.
pub struct Integrations {
    pub store: Arc<dyn ObjectStore>,
    pub source: Arc<dyn MetricSource>,
    pub feed: Arc<dyn IntelligenceFeed>,
    pub telegram: Arc<dyn ChatTransport>,
    pub discord: Arc<dyn ChatTransport>,
}

impl Integrations {
    /// Integrations named by the configuration. Metric and intelligence
    /// sources are placeholders until RPC-backed ones exist.
    pub fn from_config(config: &AppConfig) -> Self {
        let store: Arc<dyn ObjectStore> = match config.storage.backend {
            StorageBackend::Memory => {
                warn!("Using in-memory storage; reports and snapshots are lost on exit");
                Arc::new(InMemoryObjectStore::new())
            }
            StorageBackend::Filesystem => {
                info!("Using filesystem storage at {}", config.storage.root);
                Arc::new(FileObjectStore::new(&config.storage.root))
            }
        };

        let notifications = &config.notifications;
        let mut telegram = TelegramNotifier::new(notifications.telegram_bot_token.clone());
        if let Some(base) = notifications.telegram_api_base.as_deref() {
            telegram = telegram.with_api_base(base);
        }
        let mut discord = DiscordNotifier::new(notifications.discord_bot_token.clone());
        if let Some(base) = notifications.discord_api_base.as_deref() {
            discord = discord.with_api_base(base);
        }

        let tokens = &config.tokens;
        Self {
            store,
            source: Arc::new(FixedMetricSource::placeholder(
                &tokens.gold.symbol,
                &tokens.synthetic.symbol,
                &tokens.launchpad.symbol,
            )),
            feed: Arc::new(PlaceholderFeed),
            telegram: Arc::new(telegram),
            discord: Arc::new(discord),
        }
    }
}

pub struct App {
    pub config: AppConfig,
    pub store: Arc<dyn ObjectStore>,
    pub cycle: Arc<ReportCycle>,
}

impl App {
    /// Validate the configuration and assemble every component.
    pub fn build(config: AppConfig) -> Result<Self> {
        if let Err(errors) = config.validate() {
            return Err(SentryError::Validation(errors.join("; ")));
        }
        let integrations = Integrations::from_config(&config);
        Ok(Self::assemble(config, integrations))
    }

    pub fn assemble(config: AppConfig, integrations: Integrations) -> Self {
        let monitoring = &config.monitoring;
        let source_timeout = std::time::Duration::from_millis(monitoring.source_timeout_ms);
        let tolerance = Duration::seconds(monitoring.snapshot_tolerance_secs as i64);
        let store = integrations.store;

        let core = |id: &str, token: &str, thresholds: ThresholdTable| {
            AgentCore::new(
                id,
                token,
                thresholds,
                integrations.source.clone(),
                SnapshotStore::new(store.clone(), tolerance),
                source_timeout,
            )
        };
        let tokens = &config.tokens;
        let agents: Vec<Arc<dyn TokenRiskAgent>> = vec![
            Arc::new(GoldReserveAgent::new(core(
                GOLD_AGENT_ID,
                &tokens.gold.symbol,
                ThresholdTable::STANDARD,
            ))),
            Arc::new(SyntheticDollarAgent::new(core(
                SYNTHETIC_AGENT_ID,
                &tokens.synthetic.symbol,
                ThresholdTable::DELTA_NEUTRAL,
            ))),
            Arc::new(LaunchpadAgent::new(core(
                LAUNCHPAD_AGENT_ID,
                &tokens.launchpad.symbol,
                ThresholdTable::STANDARD,
            ))),
        ];

        let verifier = StructuralVerifier::new(config.crosschain.known_endpoints.iter().copied());
        let governor = Arc::new(Governor::new(agents, store.clone(), Arc::new(verifier)));
        let observer = Arc::new(ObserverAgent::new(
            integrations.feed,
            Duration::seconds(monitoring.interval_secs as i64),
            source_timeout,
        ));

        let dispatcher = build_dispatcher(
            &config,
            integrations.telegram,
            integrations.discord,
        );

        let cycle = Arc::new(ReportCycle::new(
            monitoring.enabled,
            &monitoring.period,
            governor,
            observer,
            ReportStore::new(store.clone()),
            Arc::new(dispatcher),
        ));

        Self {
            config,
            store,
            cycle,
        }
    }

    pub fn api_state(&self) -> AppState {
        let api = &self.config.api;
        AppState::new(
            self.cycle.clone(),
            self.store.clone(),
            Duration::seconds(api.generate_cooldown_secs as i64),
            AdminAuth::new(api.admin_token.clone(), api.admin_auth_required),
        )
    }

    pub fn scheduler(&self) -> Scheduler {
        Scheduler::new(
            self.cycle.clone(),
            std::time::Duration::from_secs(self.config.monitoring.interval_secs),
        )
    }
}

/// One binding per transport per channel; unset ids are kept so the
/// dispatcher reports them as skipped.
fn build_dispatcher(
    config: &AppConfig,
    telegram: Arc<dyn ChatTransport>,
    discord: Arc<dyn ChatTransport>,
) -> NotificationDispatcher {
    let channels = &config.notifications.channels;
    let routes: [(ChannelId, &ChannelDestinations); 3] = [
        (ChannelId::Operations, &channels.operations),
        (ChannelId::Alerts, &channels.alerts),
        (ChannelId::Escalation, &channels.escalation),
    ];

    let mut dispatcher = NotificationDispatcher::new(std::time::Duration::from_millis(
        config.monitoring.notify_timeout_ms,
    ));
    for (channel, destinations) in routes {
        dispatcher = dispatcher
            .with_binding(
                channel,
                telegram.clone(),
                destinations.telegram_chat_id.clone(),
            )
            .with_binding(
                channel,
                discord.clone(),
                destinations.discord_channel_id.clone(),
            );
    }
    dispatcher
}
