use crate::config::GatewayConfig;
use crate::policy::UpstreamCallPolicy;
use crate::provider::Provider;
use std::sync::Arc;

/// Shared, read-only state handed to every route.
#[derive(Clone)]
pub struct AppState {
    config: Arc<GatewayConfig>,
    provider: Arc<dyn Provider>,
    policy: UpstreamCallPolicy,
}

impl AppState {
    pub fn new(config: Arc<GatewayConfig>, provider: Arc<dyn Provider>) -> Self {
        let policy = UpstreamCallPolicy::new(config.retry.clone());
        Self {
            config,
            provider,
            policy,
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn provider(&self) -> &dyn Provider {
        self.provider.as_ref()
    }

    pub fn policy(&self) -> &UpstreamCallPolicy {
        &self.policy
    }
}
