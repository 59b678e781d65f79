//! Application configuration options

use std::time::Duration;

use crate::storage::layout::StorageLayout;
use crate::storage::settings::{GatewaySettings, MqttBrokerSettings};
use crate::workers::poller;

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Lifecycle configuration
    pub lifecycle: LifecycleOptions,

    /// Gateway configuration
    pub gateway: GatewaySettings,

    /// MQTT broker configuration
    pub mqtt_broker: MqttBrokerSettings,

    /// Storage layout paths
    pub storage: StorageLayout,

    /// Poller worker options
    pub poller: poller::Options,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            lifecycle: LifecycleOptions::default(),
            gateway: GatewaySettings::default(),
            mqtt_broker: MqttBrokerSettings::default(),
            storage: StorageLayout::default(),
            poller: poller::Options::default(),
        }
    }
}

/// Lifecycle options for the bridge
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    /// Maximum delay for graceful shutdown
    pub max_shutdown_delay: Duration,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            max_shutdown_delay: Duration::from_secs(30),
        }
    }
}
