pub mod api_server;
pub mod chat;
pub mod discord;
pub mod intelligence;
pub mod metric_source;
pub mod object_store;
pub mod telegram;

pub use api_server::start_api_server;
pub use chat::ChatTransport;
pub use discord::DiscordNotifier;
pub use intelligence::{IntelligenceFeed, PlaceholderFeed};
pub use metric_source::{
    CurveState, FixedMetricSource, HedgePosition, MetricSource, ReserveAttestation,
};
pub use object_store::{FileObjectStore, InMemoryObjectStore, ObjectStore};
pub use telegram::TelegramNotifier;
