use std::sync::Arc;

use lunasentri_core_identity::SessionSigner;
use lunasentri_domain_alerts::AlertEngine;
use lunasentri_infra_notifier::{DeliveryClient, Notifier};
use lunasentri_infra_store::{
    AlertEventRepository, AlertRuleRepository, ChannelRepository, MachineRepository,
    OperatorRepository, SampleRepository, StoreClient,
};

use crate::config::Config;

/// Shared application state. Repositories wrap the same underlying
/// `StoreClient` connection pool, so cloning this struct is cheap and
/// every handler sees the same store.
#[derive(Clone)]
pub struct AppState {
    pub operators: Arc<OperatorRepository>,
    pub machines: Arc<MachineRepository>,
    pub samples: Arc<SampleRepository>,
    pub alert_rules: Arc<AlertRuleRepository>,
    pub alert_events: Arc<AlertEventRepository>,
    pub channels: Arc<ChannelRepository>,
    pub sessions: Arc<SessionSigner>,
    pub alert_engine: Arc<AlertEngine>,
    pub notifier: Arc<Notifier>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: StoreClient, config: Config) -> Self {
        let delivery = DeliveryClient::new(config.telegram_bot_token.clone());
        let notifier = Notifier::new(ChannelRepository::new(store.clone()), delivery);
        let sessions = SessionSigner::new(config.session_secret.clone().into_bytes());

        Self {
            operators: Arc::new(OperatorRepository::new(store.clone())),
            machines: Arc::new(MachineRepository::new(store.clone())),
            samples: Arc::new(SampleRepository::new(store.clone())),
            alert_rules: Arc::new(AlertRuleRepository::new(store.clone())),
            alert_events: Arc::new(AlertEventRepository::new(store.clone())),
            channels: Arc::new(ChannelRepository::new(store)),
            sessions: Arc::new(sessions),
            alert_engine: Arc::new(AlertEngine::new()),
            notifier: Arc::new(notifier),
            config: Arc::new(config),
        }
    }
}
